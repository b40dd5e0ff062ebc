use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use backoffice_core::{SalesSummary, StockValuation, TopProduct};

use crate::error::ApiResult;
use crate::extract::AppQuery;
use crate::AppState;

const DEFAULT_TOP_PRODUCTS: i64 = 10;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/sales", get(sales))
        .route("/reports/stock-valuation", get(stock_valuation))
        .route("/reports/top-products", get(top_products))
}

/// `[from, to)` window; either bound may be left open.
#[derive(Debug, Deserialize)]
struct Period {
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

async fn sales(
    State(state): State<AppState>,
    AppQuery(period): AppQuery<Period>,
) -> ApiResult<Json<SalesSummary>> {
    Ok(Json(
        state.db.reports().sales_summary(period.from, period.to).await?,
    ))
}

async fn stock_valuation(State(state): State<AppState>) -> ApiResult<Json<StockValuation>> {
    Ok(Json(state.db.reports().stock_valuation().await?))
}

#[derive(Debug, Deserialize)]
struct TopQuery {
    limit: Option<i64>,
}

async fn top_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TopQuery>,
) -> ApiResult<Json<Vec<TopProduct>>> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_PRODUCTS);
    Ok(Json(state.db.reports().top_products(limit).await?))
}
