use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use backoffice_core::{
    GroupedStockOptions, NewProduct, NewStockItem, Product, StockHistory, StockItem, StockLine,
};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 100;
const MAX_HISTORY_LIMIT: i64 = 1000;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stock", get(list))
        .route("/stock/options", get(options))
        .route("/stock/products", get(list_products).post(create_product))
        .route("/stock/products/{id}", get(show_product))
        .route("/stock/items", post(create_item))
        .route("/stock/items/{id}", get(show_item))
        .route("/stock/items/{id}/add", post(add_quantity))
        .route("/stock/items/{id}/edit", post(edit))
        .route("/stock/items/{id}/price", post(update_price))
        .route("/stock/history", get(history))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<StockLine>>> {
    Ok(Json(state.db.stock().list().await?))
}

/// Selectable stock rows keyed by product name.
async fn options(State(state): State<AppState>) -> ApiResult<Json<GroupedStockOptions>> {
    Ok(Json(state.db.stock().grouped_options().await?))
}

async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().list().await?))
}

async fn create_product(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.db.products().create(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn show_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", id))
}

async fn create_item(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(input): AppJson<NewStockItem>,
) -> ApiResult<(StatusCode, Json<StockItem>)> {
    let item = state
        .db
        .stock()
        .create_stock_item(&input, Some(user.username.as_str()))
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn show_item(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<StockLine>> {
    state
        .db
        .stock()
        .get_line(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Stock item", id))
}

#[derive(Debug, Deserialize)]
struct AddQuantity {
    quantity: f64,
    remarks: Option<String>,
}

async fn add_quantity(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(body): AppJson<AddQuantity>,
) -> ApiResult<Json<StockItem>> {
    let item = state
        .db
        .stock()
        .add_quantity(id, body.quantity, Some(user.username.as_str()), body.remarks.as_deref())
        .await?;
    Ok(Json(item))
}

#[derive(Debug, Deserialize)]
struct EditStock {
    quantity: f64,
    unit: Option<String>,
    remarks: Option<String>,
}

async fn edit(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(body): AppJson<EditStock>,
) -> ApiResult<Json<StockItem>> {
    let item = state
        .db
        .stock()
        .edit(
            id,
            body.quantity,
            body.unit.as_deref(),
            Some(user.username.as_str()),
            body.remarks.as_deref(),
        )
        .await?;
    Ok(Json(item))
}

#[derive(Debug, Deserialize)]
struct UpdatePrice {
    unit_price: f64,
    remarks: Option<String>,
}

async fn update_price(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(body): AppJson<UpdatePrice>,
) -> ApiResult<Json<StockItem>> {
    let item = state
        .db
        .stock()
        .update_price(id, body.unit_price, Some(user.username.as_str()), body.remarks.as_deref())
        .await?;
    Ok(Json(item))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    product_id: Option<i64>,
    limit: Option<i64>,
}

async fn history(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<HistoryQuery>,
) -> ApiResult<Json<Vec<StockHistory>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    Ok(Json(state.db.stock().history(query.product_id, limit).await?))
}
