use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use backoffice_core::{AccountBalance, FinanceEntry, NewFinanceEntry};
use backoffice_db::LedgerFilter;

use crate::error::ApiResult;
use crate::extract::{AppJson, AppQuery};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ledger/entries", get(list).post(create))
        .route("/ledger/balances", get(balances))
}

#[derive(Debug, Serialize)]
pub struct Balances {
    pub accounts: Vec<AccountBalance>,
    /// Total debits equal total credits
    pub balanced: bool,
}

async fn list(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<LedgerFilter>,
) -> ApiResult<Json<Vec<FinanceEntry>>> {
    Ok(Json(state.db.ledger().list(&filter).await?))
}

async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewFinanceEntry>,
) -> ApiResult<(StatusCode, Json<FinanceEntry>)> {
    let entry = state.db.ledger().manual_entry(&input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn balances(State(state): State<AppState>) -> ApiResult<Json<Balances>> {
    let ledger = state.db.ledger();
    Ok(Json(Balances {
        accounts: ledger.account_balances().await?,
        balanced: ledger.trial_balance_is_balanced().await?,
    }))
}
