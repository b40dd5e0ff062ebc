//! # Back Office Server
//!
//! JSON API for the back office: customers, stock, invoices, payments, the
//! finance ledger and reports.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Request Flow                                     │
//! │                                                                         │
//! │  HTTP ──► TraceLayer ──► /health, /auth/login          (public)         │
//! │                     └──► require_session ──► routes::* (everything else)│
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │                                   AppState.db ──► repositories ──► SQLite│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use axum::Router;
use tower_http::trace::TraceLayer;

use backoffice_db::Database;

use crate::auth::SessionKeys;
use crate::config::ServerConfig;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionKeys,
    /// Let invoices take stock below zero
    pub allow_negative_stock: bool,
}

impl AppState {
    pub fn new(db: Database, config: &ServerConfig) -> Self {
        AppState {
            db,
            sessions: SessionKeys::new(&config.session_secret, config.session_lifetime_secs),
            allow_negative_stock: config.allow_negative_stock,
        }
    }
}

/// Builds the full HTTP application.
pub fn build_router(state: AppState) -> Router {
    routes::router(state).layer(TraceLayer::new_for_http())
}
