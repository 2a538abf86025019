//! Signature and logo uploads. Content type and size are checked before the
//! blob store is touched; a rejected upload is a validation error the
//! composer shows inline, and it never blocks saving the quote itself.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::info;

use cotiza_core::config::StorageConfig;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

const ALLOWED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/svg+xml"];

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BlobError {
    #[error("{0}")]
    Rejected(String),
    #[error("blob storage transport failure: {0}")]
    Transport(String),
}

/// Blob storage collaborator: stores bytes under a caller-scoped path and
/// hands back a publicly retrievable URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BlobError>;
}

/// Local store for development and tests.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<String, (String, Vec<u8>)>>,
}

impl InMemoryBlobStore {
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BlobError> {
        let mut blobs = self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        blobs.insert(path.to_string(), (content_type.to_string(), bytes));
        Ok(format!("memory://{path}"))
    }
}

/// Filesystem store used by the standalone server; the files land under a
/// root that is served back at `/uploads`.
pub struct FsBlobStore {
    root: std::path::PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(
        &self,
        path: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BlobError> {
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| BlobError::Transport(err.to_string()))?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|err| BlobError::Transport(err.to_string()))?;
        Ok(format!("/uploads/{path}"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadKind {
    Signature,
    Logo,
}

impl UploadKind {
    fn bucket(&self) -> &'static str {
        match self {
            Self::Signature => "firmas",
            Self::Logo => "logos",
        }
    }

    fn max_bytes(&self, limits: &StorageConfig) -> u64 {
        match self {
            Self::Signature => limits.signature_max_bytes,
            Self::Logo => limits.logo_max_bytes,
        }
    }
}

pub fn validate_upload(
    kind: UploadKind,
    content_type: &str,
    size_bytes: u64,
    limits: &StorageConfig,
) -> Result<(), BlobError> {
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Err(BlobError::Rejected(format!(
            "tipo de contenido no permitido: `{content_type}` (se esperaba una imagen)"
        )));
    }

    let max = kind.max_bytes(limits);
    if size_bytes > max {
        return Err(BlobError::Rejected(format!(
            "el archivo pesa {size_bytes} bytes y el máximo permitido es {max}"
        )));
    }

    Ok(())
}

async fn handle_upload(
    state: AppState,
    caller: Caller,
    kind: UploadKind,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    validate_upload(kind, &content_type, body.len() as u64, &state.upload_limits)?;

    let path = format!("{}/{}/{}", kind.bucket(), caller.0 .0, uuid::Uuid::new_v4());
    let url = state.blobs.put(&path, &content_type, body.to_vec()).await?;

    info!(path = %path, bytes = body.len(), "upload stored");
    Ok((StatusCode::CREATED, Json(json!({ "url": url }))))
}

/// POST /api/uploads/signature — raw image body, ≤ 2 MB by default.
pub async fn upload_signature(
    State(state): State<AppState>,
    caller: Caller,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    handle_upload(state, caller, UploadKind::Signature, headers, body).await
}

/// POST /api/uploads/logo — raw image body, ≤ 5 MB by default.
pub async fn upload_logo(
    State(state): State<AppState>,
    caller: Caller,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    handle_upload(state, caller, UploadKind::Logo, headers, body).await
}

#[cfg(test)]
mod tests {
    use cotiza_core::config::StorageConfig;

    use super::{validate_upload, BlobError, UploadKind};

    fn limits() -> StorageConfig {
        StorageConfig { signature_max_bytes: 2 * 1024 * 1024, logo_max_bytes: 5 * 1024 * 1024 }
    }

    #[test]
    fn images_within_the_cap_pass() {
        validate_upload(UploadKind::Signature, "image/png", 1024, &limits()).expect("valid");
        validate_upload(UploadKind::Logo, "image/webp", 4 * 1024 * 1024, &limits())
            .expect("valid");
    }

    #[test]
    fn non_image_content_is_rejected() {
        let error = validate_upload(UploadKind::Logo, "application/pdf", 10, &limits())
            .expect_err("must fail");
        assert!(matches!(error, BlobError::Rejected(_)));
    }

    #[test]
    fn oversized_files_are_rejected_per_kind() {
        let error =
            validate_upload(UploadKind::Signature, "image/png", 3 * 1024 * 1024, &limits())
                .expect_err("signature over 2MB");
        assert!(matches!(error, BlobError::Rejected(_)));

        // The same size is fine for a logo.
        validate_upload(UploadKind::Logo, "image/png", 3 * 1024 * 1024, &limits())
            .expect("logo under 5MB");
    }
}
