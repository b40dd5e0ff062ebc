use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use backoffice_core::{Customer, GroupedStockOptions, Invoice, InvoiceDraft, InvoiceItem};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list).post(create))
        .route("/invoices/options", get(options))
        .route("/invoices/{id}", get(show).delete(remove))
}

/// An invoice with its lines and what is still owed on it.
#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
    pub balance_due: f64,
}

/// Everything the invoice form needs to populate its pickers.
#[derive(Debug, Serialize)]
pub struct InvoiceFormOptions {
    pub customers: Vec<Customer>,
    pub stock: GroupedStockOptions,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    customer_id: Option<i64>,
}

async fn list(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<Json<Vec<Invoice>>> {
    Ok(Json(state.db.invoices().list(query.customer_id).await?))
}

async fn options(State(state): State<AppState>) -> ApiResult<Json<InvoiceFormOptions>> {
    let customers = state.db.customers().list().await?;
    let stock = state.db.stock().grouped_options().await?;
    Ok(Json(InvoiceFormOptions { customers, stock }))
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(draft): AppJson<InvoiceDraft>,
) -> ApiResult<(StatusCode, Json<InvoiceDetail>)> {
    let invoice = state
        .db
        .invoices()
        .create(&draft, Some(user.username.as_str()), state.allow_negative_stock)
        .await?;

    info!(
        invoice_number = %invoice.invoice_number,
        performed_by = %user.username,
        "Invoice issued"
    );

    let detail = load_detail(&state, invoice).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<InvoiceDetail>> {
    let invoice = state
        .db
        .invoices()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice", id))?;
    Ok(Json(load_detail(&state, invoice).await?))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> ApiResult<StatusCode> {
    state.db.invoices().delete(id).await?;
    info!(id, performed_by = %user.username, "Invoice deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn load_detail(state: &AppState, invoice: Invoice) -> ApiResult<InvoiceDetail> {
    let repo = state.db.invoices();
    let items = repo.items(invoice.id).await?;
    let balance_due = repo.balance_due(invoice.id).await?;
    Ok(InvoiceDetail {
        invoice,
        items,
        balance_due,
    })
}
