use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use backoffice_core::{Customer, CustomerStatement, NewCustomer};

use crate::error::{ApiError, ApiResult};
use crate::extract::{AppJson, AppPath};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list).post(create))
        .route("/customers/{id}", get(show).put(update).delete(remove))
        .route("/customers/{id}/statement", get(statement))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.db.customers().list().await?))
}

async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewCustomer>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.db.customers().create(&input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<Customer>> {
    state
        .db
        .customers()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Customer", id))
}

async fn update(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(input): AppJson<NewCustomer>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().update(id, &input).await?))
}

async fn remove(State(state): State<AppState>, AppPath(id): AppPath<i64>) -> ApiResult<StatusCode> {
    state.db.customers().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn statement(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<CustomerStatement>> {
    Ok(Json(state.db.customers().statement(id).await?))
}
