use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use cotiza_db::DbPool;

#[derive(Clone)]
pub struct HealthState {
    pub db_pool: DbPool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub checked_at: String,
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let healthy = database.status == "ok";

    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        service: HealthCheck { status: "ok", detail: "accepting requests".to_string() },
        database,
        checked_at: Utc::now().to_rfc3339(),
    };

    let code = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(response))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => HealthCheck { status: "ok", detail: "connection pool responsive".to_string() },
        Err(error) => HealthCheck { status: "error", detail: error.to_string() },
    }
}
