//! # Back Office Server
//!
//! Binary entry point: configuration, database, catalog seed, admin
//! bootstrap, then the HTTP listener.

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use backoffice_db::{Database, DbConfig, SeedOutcome};
use backoffice_server::config::ServerConfig;
use backoffice_server::{auth, build_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,backoffice=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting back office server...");

    // Load configuration
    let config = ServerConfig::load()?;
    info!(
        bind_addr = %config.bind_addr,
        database = %config.database_path,
        allow_negative_stock = config.allow_negative_stock,
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("SESSION_SECRET is not set, using the development secret");
    }

    // Connect and migrate
    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
    )
    .await?;

    // A failed seed aborts startup
    match db.seed_catalog_if_empty().await? {
        SeedOutcome::Seeded {
            products,
            stock_items,
        } => info!(products, stock_items, "Default catalog seeded"),
        SeedOutcome::AlreadySeeded => info!("Catalog already present"),
    }

    if let Some(admin) = &config.bootstrap_admin {
        if let Some(user) = auth::bootstrap_admin(&db, admin).await? {
            info!(username = %user.username, "Bootstrapped admin user");
        }
    }

    let app = build_router(AppState::new(db.clone(), &config));

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
