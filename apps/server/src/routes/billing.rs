use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use backoffice_core::{NewPayment, Payment};

use crate::error::{ApiError, ApiResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/billing/payments", get(list).post(record))
        .route("/billing/payments/{id}", get(show))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    customer_id: Option<i64>,
}

async fn list(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<Vec<Payment>>> {
    Ok(Json(state.db.payments().list(query.customer_id).await?))
}

async fn record(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewPayment>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let payment = state.db.payments().record(&input).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<Payment>> {
    state
        .db
        .payments()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Payment", id))
}
