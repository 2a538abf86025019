//! AI assistant endpoints: free text to quote draft, and copy improvement.
//! Both calls are stateless — nothing is persisted until the user accepts
//! the result in the composer — so a timeout or cancellation leaves no
//! trace.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use cotiza_agent::{QuoteDraft, QuoteMapper, TextImprover};

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DraftPayload {
    pub mensaje: String,
}

/// POST /api/ai/quote-draft
pub async fn quote_draft(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<DraftPayload>,
) -> Result<Json<QuoteDraft>, ApiError> {
    if payload.mensaje.trim().is_empty() {
        return Err(ApiError::Validation("mensaje requerido".to_string()));
    }

    let catalog = state.items.list_for_owner(&caller.0).await?;
    let mapper = QuoteMapper::new(state.llm.clone());
    let draft = mapper.draft(&payload.mensaje, &catalog).await?;

    info!(
        proposed = draft.items.len(),
        unmatched = draft.no_encontrados.len(),
        "quote draft produced"
    );
    Ok(Json(draft))
}

#[derive(Debug, Deserialize)]
pub struct ImprovePayload {
    pub texto: String,
    #[serde(default)]
    pub contexto: String,
}

/// POST /api/ai/improve-text
pub async fn improve_text(
    State(state): State<AppState>,
    _caller: Caller,
    Json(payload): Json<ImprovePayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if payload.texto.trim().is_empty() {
        return Err(ApiError::Validation("falta texto original".to_string()));
    }

    let improver = TextImprover::new(state.llm.clone());
    let improved = improver.improve(&payload.texto, &payload.contexto).await?;

    Ok(Json(json!({ "resultado": improved })))
}
