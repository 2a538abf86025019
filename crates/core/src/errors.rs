use thiserror::Error;

use crate::domain::quote::{DocumentKind, PipelineStatus};

/// Violations of quote/catalog invariants. Raised before any persistence
/// attempt; a failed validation is never partially applied.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("client name is required")]
    MissingClientName,
    #[error("a quote needs at least one line item")]
    EmptyLineItems,
    #[error("item name is required")]
    MissingItemName,
    #[error("base price cannot be negative")]
    NegativeBasePrice,
    #[error("recurring items need a recurrence unit")]
    MissingRecurrence,
    #[error("recurrence only applies to recurring items")]
    UnexpectedRecurrence,
    #[error("cannot move a quote out of terminal stage {from:?} (to {to:?})")]
    TerminalStatus { from: PipelineStatus, to: PipelineStatus },
    #[error("document was already converted to {kind:?}")]
    AlreadyConverted { kind: DocumentKind },
    #[error("a document can only be converted to an invoice kind")]
    InvalidConversion,
}

/// Operation-level failures, separated so callers can tell "try again"
/// (persistence/transport) from "this input is not actionable"
/// (domain/upstream content). The core never retries on its own.
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },
    #[error("caller does not own {entity} `{id}`")]
    Forbidden { entity: &'static str, id: String },
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("upstream transport failure: {0}")]
    Transport(String),
    #[error("upstream returned unusable content: {0}")]
    UpstreamContent(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }

    pub fn forbidden(entity: &'static str, id: impl Into<String>) -> Self {
        Self::Forbidden { entity, id: id.into() }
    }

    /// Whether retrying the same call unchanged could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{ApplicationError, DomainError};

    #[test]
    fn domain_errors_convert_into_application_errors() {
        let error: ApplicationError = DomainError::MissingClientName.into();
        assert!(matches!(error, ApplicationError::Domain(DomainError::MissingClientName)));
        assert!(!error.is_retryable());
    }

    #[test]
    fn transport_failures_are_retryable_content_failures_are_not() {
        assert!(ApplicationError::Transport("connection reset".to_string()).is_retryable());
        assert!(!ApplicationError::UpstreamContent("not json".to_string()).is_retryable());
    }

    #[test]
    fn not_found_names_entity_and_id() {
        let error = ApplicationError::not_found("quote", "q-123");
        assert_eq!(error.to_string(), "quote `q-123` not found");
    }
}
