use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post, put};
use axum::Router;

use cotiza_db::DbPool;

use crate::health::{health, HealthState};
use crate::state::AppState;
use crate::{ai, items, mail, pdf, quotes, uploads, webhook};

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/items", post(items::create).get(items::list))
        .route("/api/items/{id}", put(items::update).delete(items::delete))
        .route("/api/quotes", post(quotes::create).get(quotes::list))
        .route("/api/quotes/{id}", get(quotes::get))
        .route("/api/quotes/{id}/status", patch(quotes::set_status))
        .route("/api/quotes/{id}/convert", post(quotes::convert))
        .route("/api/quotes/{id}/pdf", get(pdf::export))
        .route("/api/ai/quote-draft", post(ai::quote_draft))
        .route("/api/ai/improve-text", post(ai::improve_text))
        .route("/api/send-quote", post(mail::send_quote))
        .route("/api/webhooks/email", post(webhook::receive))
        .route(
            "/api/uploads/signature",
            post(uploads::upload_signature).layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/api/uploads/logo",
            post(uploads::upload_logo).layer(DefaultBodyLimit::disable()),
        )
        .with_state(state)
}

pub fn health_router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}
