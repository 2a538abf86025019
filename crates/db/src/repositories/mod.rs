use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use cotiza_core::chrono::{DateTime, Utc};
use cotiza_core::domain::item::{CatalogItem, ItemId, PricingCategory, RecurrenceUnit};
use cotiza_core::domain::quote::{DocumentKind, PipelineStatus, Quote, QuoteId};
use cotiza_core::domain::user::{IssuerProfile, UserId};

pub mod item;
pub mod memory;
pub mod quote;
pub mod user;

pub use item::SqlItemRepository;
pub use memory::{InMemoryItemRepository, InMemoryQuoteRepository, InMemoryUserRepository};
pub use quote::SqlQuoteRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Result of a guarded write. `NotFound` and `Forbidden` are reported
/// separately so callers can answer with the right error; `Conflict` means
/// the row exists and is owned but its current state forbids the write
/// (e.g. converting an already-converted document).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Updated,
    NotFound,
    Forbidden,
    Conflict,
}

#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn create(&self, item: &CatalogItem) -> Result<(), RepositoryError>;
    async fn update(&self, item: &CatalogItem) -> Result<WriteOutcome, RepositoryError>;
    async fn delete(&self, id: &ItemId, owner: &UserId) -> Result<WriteOutcome, RepositoryError>;
    async fn find_by_id(&self, id: &ItemId) -> Result<Option<CatalogItem>, RepositoryError>;
    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<CatalogItem>, RepositoryError>;
}

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    /// Persist a quote and its lines in one transaction.
    async fn create(&self, quote: &Quote) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError>;
    /// Quotes for the board, newest first.
    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<Quote>, RepositoryError>;
    /// Manual board move: one atomic UPDATE guarded by ownership.
    /// Last-write-wins across sessions; there is no conflict token.
    async fn update_status(
        &self,
        id: &QuoteId,
        owner: &UserId,
        status: PipelineStatus,
    ) -> Result<WriteOutcome, RepositoryError>;
    /// One-way document conversion; also forces estado to Aprobado.
    async fn convert_document_kind(
        &self,
        id: &QuoteId,
        owner: &UserId,
        kind: DocumentKind,
    ) -> Result<WriteOutcome, RepositoryError>;
    /// Webhook path: upgrade Enviado/Leído to Leído in a single statement.
    /// Returns whether a row actually changed. No ownership guard — the
    /// delivery provider is correlated by quote id alone.
    async fn apply_opened_signal(&self, id: &QuoteId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<IssuerProfile>, RepositoryError>;
    async fn upsert(&self, profile: &IssuerProfile) -> Result<(), RepositoryError>;
}

pub(crate) fn decode_decimal(column: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    raw.parse::<Decimal>()
        .map_err(|err| RepositoryError::Decode(format!("column `{column}`: {err}")))
}

pub(crate) fn decode_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| RepositoryError::Decode(format!("column `{column}`: {err}")))
}

pub(crate) fn decode_category(raw: &str) -> Result<PricingCategory, RepositoryError> {
    PricingCategory::parse(raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown categoria `{raw}`")))
}

pub(crate) fn decode_recurrence(
    raw: Option<&str>,
) -> Result<Option<RecurrenceUnit>, RepositoryError> {
    raw.map(|value| {
        RecurrenceUnit::parse(value)
            .ok_or_else(|| RepositoryError::Decode(format!("unknown recurrencia `{value}`")))
    })
    .transpose()
}

pub(crate) fn decode_status(raw: &str) -> Result<PipelineStatus, RepositoryError> {
    PipelineStatus::parse(raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown estado `{raw}`")))
}

pub(crate) fn decode_document_kind(raw: &str) -> Result<DocumentKind, RepositoryError> {
    DocumentKind::parse(raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown tipo_documento `{raw}`")))
}
