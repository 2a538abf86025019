use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use cotiza_core::chrono::Utc;
use cotiza_core::domain::item::{CatalogItem, ItemId, PricingCategory, RecurrenceUnit};

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ItemPayload {
    pub nombre: String,
    pub codigo_sku: Option<String>,
    #[serde(default)]
    pub descripcion: String,
    pub precio_base: Decimal,
    pub categoria: String,
    pub recurrencia: Option<String>,
    pub notas_internas: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub nombre: String,
    pub codigo_sku: Option<String>,
    pub descripcion: String,
    pub precio_base: Decimal,
    pub categoria: &'static str,
    pub recurrencia: Option<&'static str>,
    pub creado_en: String,
}

impl From<CatalogItem> for ItemResponse {
    fn from(item: CatalogItem) -> Self {
        Self {
            id: item.id.0,
            nombre: item.name,
            codigo_sku: item.sku,
            descripcion: item.description,
            precio_base: item.base_price,
            categoria: item.category.as_str(),
            recurrencia: item.recurrence.map(|unit| unit.as_str()),
            creado_en: item.created_at.to_rfc3339(),
        }
    }
}

fn parse_category(raw: &str) -> Result<PricingCategory, ApiError> {
    PricingCategory::parse(raw)
        .ok_or_else(|| ApiError::Validation(format!("categoría desconocida: `{raw}`")))
}

fn parse_recurrence(raw: Option<&str>) -> Result<Option<RecurrenceUnit>, ApiError> {
    raw.map(|value| {
        RecurrenceUnit::parse(value)
            .ok_or_else(|| ApiError::Validation(format!("recurrencia desconocida: `{value}`")))
    })
    .transpose()
}

fn item_from_payload(
    id: ItemId,
    caller: &Caller,
    payload: ItemPayload,
) -> Result<CatalogItem, ApiError> {
    let item = CatalogItem {
        id,
        owner_id: caller.0.clone(),
        name: payload.nombre,
        sku: payload.codigo_sku.filter(|sku| !sku.trim().is_empty()),
        description: payload.descripcion,
        base_price: payload.precio_base,
        category: parse_category(&payload.categoria)?,
        recurrence: parse_recurrence(payload.recurrencia.as_deref())?,
        internal_notes: payload.notas_internas,
        created_at: Utc::now(),
    };
    item.validate()?;
    Ok(item)
}

pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<ItemPayload>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let item = item_from_payload(ItemId::new(), &caller, payload)?;
    state.items.create(&item).await?;

    info!(item_id = %item.id.0, "catalog item created");
    Ok((StatusCode::CREATED, Json(item.into())))
}

pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(payload): Json<ItemPayload>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = item_from_payload(ItemId(id.clone()), &caller, payload)?;

    let outcome = state.items.update(&item).await?;
    if let Some(error) = ApiError::from_outcome(outcome, "item", &id) {
        return Err(error);
    }
    Ok(Json(item.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let outcome = state.items.delete(&ItemId(id.clone()), &caller.0).await?;
    if let Some(error) = ApiError::from_outcome(outcome, "item", &id) {
        return Err(error);
    }

    info!(item_id = %id, "catalog item deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = state.items.list_for_owner(&caller.0).await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}
