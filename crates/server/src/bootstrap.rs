use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use cotiza_agent::OpenAiChatClient;
use cotiza_core::config::{AppConfig, ConfigError, LoadOptions};
use cotiza_db::{
    connect_with_settings, migrations, DbPool, SqlItemRepository, SqlQuoteRepository,
    SqlUserRepository,
};

use crate::mail::ResendMailer;
use crate::pdf::{PdfError, PdfGenerator};
use crate::state::AppState;
use crate::uploads::FsBlobStore;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("pdf generator initialization failed: {0}")]
    Pdf(#[from] PdfError),
    #[error("collaborator initialization failed: {0}")]
    Integration(String),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let llm = OpenAiChatClient::new(
        config.llm.base_url.clone(),
        config.llm.api_key.clone(),
        config.llm.model.clone(),
        config.llm.timeout_secs,
    )
    .map_err(|err| BootstrapError::Integration(err.to_string()))?;

    let mailer = ResendMailer::new(
        config.email.base_url.clone(),
        config.email.api_key.clone(),
        config.email.sender.clone(),
    )
    .map_err(|err| BootstrapError::Integration(err.to_string()))?;

    let state = AppState {
        items: Arc::new(SqlItemRepository::new(db_pool.clone())),
        quotes: Arc::new(SqlQuoteRepository::new(db_pool.clone())),
        users: Arc::new(SqlUserRepository::new(db_pool.clone())),
        llm: Arc::new(llm),
        mailer: Arc::new(mailer),
        blobs: Arc::new(FsBlobStore::new("uploads")),
        pdf: Arc::new(PdfGenerator::new()?),
        upload_limits: config.storage.clone(),
    };

    Ok(Application { config, db_pool, state })
}

#[cfg(test)]
mod tests {
    use cotiza_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    #[tokio::test]
    async fn bootstrap_runs_migrations_against_a_fresh_database() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap should succeed with defaults plus an in-memory database");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
             AND name IN ('usuarios', 'items', 'cotizaciones', 'cotizacion_items')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("baseline tables should exist after bootstrap");
        assert_eq!(table_count, 4);
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_database_url() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("postgres://localhost/cotiza".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("must fail").to_string();
        assert!(message.contains("database.url"));
    }
}
