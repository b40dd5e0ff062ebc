use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use backoffice_db::MigrationStatus;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub migrations: Option<MigrationStatus>,
}

/// Liveness plus a database ping; 503 when the database is unreachable.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let migrations = state.db.migration_status().await.ok();

    let (status, code) = match (database, &migrations) {
        (true, Some(m)) if m.is_current() => ("ok", StatusCode::OK),
        (true, _) => ("degraded", StatusCode::OK),
        (false, _) => ("unavailable", StatusCode::SERVICE_UNAVAILABLE),
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            migrations,
        }),
    )
}
