use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use backoffice_core::DashboardSummary;

use crate::error::ApiResult;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<DashboardSummary>> {
    Ok(Json(state.db.reports().dashboard().await?))
}
