use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use cotiza_agent::AdapterError;
use cotiza_core::errors::DomainError;
use cotiza_db::{RepositoryError, WriteOutcome};

use crate::mail::MailError;
use crate::uploads::BlobError;

/// HTTP-facing error taxonomy. Validation and upstream-content failures are
/// the caller's problem (4xx, fix the input); transport failures are
/// retryable (502); everything unexpected is a 500 with the detail kept in
/// the logs rather than the response body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("missing or empty x-user-id header")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    UpstreamContent(String),
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UpstreamContent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a guarded-write outcome for the given entity.
    pub fn from_outcome(outcome: WriteOutcome, entity: &str, id: &str) -> Option<Self> {
        match outcome {
            WriteOutcome::Updated => None,
            WriteOutcome::NotFound => Some(Self::NotFound(format!("{entity} `{id}` not found"))),
            WriteOutcome::Forbidden => {
                Some(Self::Forbidden(format!("caller does not own {entity} `{id}`")))
            }
            WriteOutcome::Conflict => {
                Some(Self::Conflict(format!("{entity} `{id}` does not allow this change")))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(detail) => {
                error!(detail = %detail, "internal error");
                "unexpected internal error".to_string()
            }
            other => {
                warn!(status = %status, error = %other, "request failed");
                other.to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::TerminalStatus { .. } | DomainError::AlreadyConverted { .. } => {
                Self::Conflict(error.to_string())
            }
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(err) => Self::Internal(format!("database error: {err}")),
            RepositoryError::Decode(detail) => Self::Internal(format!("decode error: {detail}")),
        }
    }
}

impl From<AdapterError> for ApiError {
    fn from(error: AdapterError) -> Self {
        match error {
            AdapterError::Transport(detail) => Self::Transport(detail),
            AdapterError::StructuredOutput(detail) => Self::UpstreamContent(detail),
        }
    }
}

impl From<MailError> for ApiError {
    fn from(error: MailError) -> Self {
        match error {
            MailError::Transport(detail) => Self::Transport(detail),
            MailError::Rejected(detail) => Self::UpstreamContent(detail),
        }
    }
}

impl From<BlobError> for ApiError {
    fn from(error: BlobError) -> Self {
        match error {
            BlobError::Rejected(detail) => Self::Validation(detail),
            BlobError::Transport(detail) => Self::Transport(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use cotiza_agent::AdapterError;
    use cotiza_core::errors::DomainError;
    use cotiza_db::WriteOutcome;

    use super::ApiError;

    #[test]
    fn validation_and_content_errors_are_unprocessable() {
        assert_eq!(
            ApiError::from(DomainError::MissingClientName).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(AdapterError::StructuredOutput("bad".to_string())).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn transport_errors_are_bad_gateway() {
        assert_eq!(
            ApiError::from(AdapterError::Transport("down".to_string())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn write_outcomes_map_to_the_expected_statuses() {
        assert!(ApiError::from_outcome(WriteOutcome::Updated, "quote", "q1").is_none());
        assert_eq!(
            ApiError::from_outcome(WriteOutcome::NotFound, "quote", "q1")
                .expect("error")
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from_outcome(WriteOutcome::Forbidden, "quote", "q1")
                .expect("error")
                .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from_outcome(WriteOutcome::Conflict, "quote", "q1")
                .expect("error")
                .status(),
            StatusCode::CONFLICT
        );
    }
}
