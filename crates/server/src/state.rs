use std::sync::Arc;

use cotiza_agent::LlmClient;
use cotiza_core::config::StorageConfig;
use cotiza_db::{ItemRepository, QuoteRepository, UserRepository};

use crate::mail::Mailer;
use crate::pdf::PdfGenerator;
use crate::uploads::BlobStore;

/// Shared handler state. Everything behind a trait object so tests can run
/// the full router against in-memory collaborators.
#[derive(Clone)]
pub struct AppState {
    pub items: Arc<dyn ItemRepository>,
    pub quotes: Arc<dyn QuoteRepository>,
    pub users: Arc<dyn UserRepository>,
    pub llm: Arc<dyn LlmClient>,
    pub mailer: Arc<dyn Mailer>,
    pub blobs: Arc<dyn BlobStore>,
    pub pdf: Arc<PdfGenerator>,
    pub upload_limits: StorageConfig,
}
