//! HTTP routes, one module per area of the back office.

mod auth;
mod billing;
mod customers;
mod dashboard;
mod health;
mod invoices;
mod ledger;
mod reports;
mod stock;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::auth::require_session;
use crate::AppState;

/// Public routes plus the session-guarded API.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth::routes())
        .merge(dashboard::routes())
        .merge(customers::routes())
        .merge(stock::routes())
        .merge(invoices::routes())
        .merge(billing::routes())
        .merge(ledger::routes())
        .merge(reports::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(health::health))
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .with_state(state)
}
