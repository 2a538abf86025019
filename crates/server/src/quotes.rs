use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use cotiza_core::chrono::Utc;
use cotiza_core::domain::item::{ItemId, PricingCategory, RecurrenceUnit};
use cotiza_core::domain::quote::{
    clamp_quantity, DocumentKind, LineItem, PipelineStatus, Quote, QuoteDraftInput, QuoteId,
};

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LinePayload {
    pub item_id: String,
    pub nombre: String,
    pub codigo_sku: Option<String>,
    #[serde(default = "default_cantidad")]
    pub cantidad: i64,
    pub precio_unitario: Decimal,
    pub categoria: Option<String>,
    pub recurrencia: Option<String>,
}

fn default_cantidad() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct QuotePayload {
    pub cliente_nombre: String,
    pub cliente_email: Option<String>,
    #[serde(default)]
    pub tasa_impuesto: Decimal,
    pub items: Vec<LinePayload>,
    pub notas_visibles: Option<String>,
    pub temas_legales_visibles: Option<String>,
    pub exclusiones_visibles: Option<String>,
    pub firma_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LineResponse {
    pub item_id: String,
    pub nombre: String,
    pub codigo_sku: Option<String>,
    pub cantidad: u32,
    pub precio_unitario: Decimal,
    pub precio_total: Decimal,
    pub categoria: &'static str,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub id: String,
    pub referencia: String,
    pub cliente_nombre: String,
    pub cliente_email: Option<String>,
    pub tasa_impuesto: Decimal,
    pub subtotal: Decimal,
    pub impuestos: Decimal,
    pub total: Decimal,
    pub notas_visibles: Option<String>,
    pub temas_legales_visibles: Option<String>,
    pub exclusiones_visibles: Option<String>,
    pub firma_url: Option<String>,
    pub tipo_documento: &'static str,
    pub estado: &'static str,
    pub creado_en: String,
    pub items: Vec<LineResponse>,
}

impl From<Quote> for QuoteResponse {
    fn from(quote: Quote) -> Self {
        Self {
            referencia: quote.short_reference(),
            id: quote.id.0,
            cliente_nombre: quote.client_name,
            cliente_email: quote.client_email,
            tasa_impuesto: quote.tax_rate_percent,
            subtotal: quote.totals.subtotal,
            impuestos: quote.totals.tax_amount,
            total: quote.totals.total,
            notas_visibles: quote.notes,
            temas_legales_visibles: quote.legal_terms,
            exclusiones_visibles: quote.exclusions,
            firma_url: quote.signature_url,
            tipo_documento: quote.document_kind.as_str(),
            estado: quote.status.as_str(),
            creado_en: quote.created_at.to_rfc3339(),
            items: quote
                .lines
                .into_iter()
                .map(|line| LineResponse {
                    item_id: line.item_id.0,
                    nombre: line.name,
                    codigo_sku: line.sku,
                    cantidad: line.quantity,
                    precio_unitario: line.unit_price,
                    precio_total: line.extended_price,
                    categoria: line.category.as_str(),
                })
                .collect(),
        }
    }
}

fn line_from_payload(payload: LinePayload) -> Result<LineItem, ApiError> {
    // Category is copied from the catalog at add time; a line that arrives
    // without one falls back to one-time, as the composer has always done.
    let category = match payload.categoria.as_deref() {
        None => PricingCategory::OneTime,
        Some(raw) => PricingCategory::parse(raw)
            .ok_or_else(|| ApiError::Validation(format!("categoría desconocida: `{raw}`")))?,
    };
    let recurrence = payload
        .recurrencia
        .as_deref()
        .map(|raw| {
            RecurrenceUnit::parse(raw)
                .ok_or_else(|| ApiError::Validation(format!("recurrencia desconocida: `{raw}`")))
        })
        .transpose()?;

    if payload.precio_unitario.is_sign_negative() {
        return Err(ApiError::Validation("precio_unitario no puede ser negativo".to_string()));
    }

    Ok(LineItem::new(
        ItemId(payload.item_id),
        payload.nombre,
        payload.codigo_sku.filter(|sku| !sku.trim().is_empty()),
        clamp_quantity(payload.cantidad),
        payload.precio_unitario,
        category,
        recurrence,
    ))
}

pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<QuotePayload>,
) -> Result<(StatusCode, Json<QuoteResponse>), ApiError> {
    let lines =
        payload.items.into_iter().map(line_from_payload).collect::<Result<Vec<_>, _>>()?;

    let quote = Quote::create(
        QuoteDraftInput {
            owner_id: caller.0,
            client_name: payload.cliente_nombre,
            client_email: payload.cliente_email,
            lines,
            tax_rate_percent: payload.tasa_impuesto,
            notes: payload.notas_visibles,
            legal_terms: payload.temas_legales_visibles,
            exclusions: payload.exclusiones_visibles,
            signature_url: payload.firma_url,
        },
        Utc::now(),
    )?;

    state.quotes.create(&quote).await?;

    info!(
        quote_id = %quote.id.0,
        reference = %quote.short_reference(),
        total = %quote.totals.total,
        "quote created"
    );
    Ok((StatusCode::CREATED, Json(quote.into())))
}

pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<QuoteResponse>>, ApiError> {
    let quotes = state.quotes.list_for_owner(&caller.0).await?;
    Ok(Json(quotes.into_iter().map(QuoteResponse::from).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let quote = fetch_owned(&state, &caller, &id).await?;
    Ok(Json(quote.into()))
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub estado: String,
}

pub async fn set_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let status = PipelineStatus::parse(&payload.estado)
        .ok_or_else(|| ApiError::Validation(format!("estado desconocido: `{}`", payload.estado)))?;

    let outcome = state.quotes.update_status(&QuoteId(id.clone()), &caller.0, status).await?;
    if let Some(error) = ApiError::from_outcome(outcome, "quote", &id) {
        return Err(error);
    }

    info!(quote_id = %id, estado = status.as_str(), "quote status updated");
    Ok(Json(serde_json::json!({ "estado": status.as_str() })))
}

#[derive(Debug, Deserialize)]
pub struct ConvertPayload {
    pub tipo_documento: String,
}

pub async fn convert(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(payload): Json<ConvertPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let kind = DocumentKind::parse(&payload.tipo_documento).ok_or_else(|| {
        ApiError::Validation(format!("tipo_documento desconocido: `{}`", payload.tipo_documento))
    })?;
    if kind == DocumentKind::Quote {
        return Err(ApiError::Validation(
            "una cotización solo puede convertirse a cuenta_cobro o factura_proforma".to_string(),
        ));
    }

    let outcome = state.quotes.convert_document_kind(&QuoteId(id.clone()), &caller.0, kind).await?;
    if let Some(error) = ApiError::from_outcome(outcome, "quote", &id) {
        return Err(error);
    }

    info!(quote_id = %id, tipo = kind.as_str(), "document converted");
    Ok(Json(serde_json::json!({
        "tipo_documento": kind.as_str(),
        "estado": PipelineStatus::Approved.as_str(),
    })))
}

pub(crate) async fn fetch_owned(
    state: &AppState,
    caller: &Caller,
    id: &str,
) -> Result<Quote, ApiError> {
    let quote = state
        .quotes
        .find_by_id(&QuoteId(id.to_string()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("quote `{id}` not found")))?;

    if quote.owner_id != caller.0 {
        return Err(ApiError::Forbidden(format!("caller does not own quote `{id}`")));
    }
    Ok(quote)
}
