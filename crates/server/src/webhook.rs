//! Inbound delivery-provider events. Only `email.opened` matters: it
//! carries the correlation tag pointing back at a quote and triggers the
//! monotonic move to "Leído". Every other event type is acknowledged and
//! dropped; the provider retries on non-2xx, so unknown shapes must not
//! turn into errors.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use cotiza_core::domain::quote::QuoteId;

use crate::error::ApiError;
use crate::mail::CORRELATION_TAG;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub tags: Vec<WebhookTag>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookTag {
    pub name: String,
    pub value: String,
}

/// POST /api/webhooks/email
pub async fn receive(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if payload.event_type == "email.opened" {
        let quote_id = payload
            .data
            .tags
            .iter()
            .find(|tag| tag.name == CORRELATION_TAG)
            .map(|tag| tag.value.clone());

        match quote_id {
            Some(quote_id) => {
                let changed = state.quotes.apply_opened_signal(&QuoteId(quote_id.clone())).await?;
                info!(quote_id = %quote_id, changed, "opened signal processed");
            }
            None => warn!("email.opened event without a correlation tag"),
        }
    }

    Ok(Json(json!({ "received": true })))
}
