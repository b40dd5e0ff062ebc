//! # SQLite Pool
//!
//! [`DbConfig`] describes where the database lives and how the pool behaves;
//! [`Database`] owns the resulting `SqlitePool` and hands out repositories.
//!
//! Every connection is opened with:
//! - `journal_mode = WAL`, so reports can read while an invoice is being written
//! - `synchronous = NORMAL`
//! - `foreign_keys = ON` (invoice items, payments and ledger links rely on it)
//! - a busy timeout, so a second writer queues on the lock instead of
//!   failing with `SQLITE_BUSY`
//!
//! ```text
//!   ServerConfig ──► DbConfig::new(path).max_connections(n)
//!                          │
//!                          ▼
//!                   Database::new ──► connect ──► MIGRATOR.run
//!                          │
//!                          ▼
//!        db.customers() / db.stock() / db.invoices() / ...
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations::{self, MigrationStatus};
use crate::repository::{
    AdminUserRepository, CustomerRepository, InvoiceRepository, LedgerRepository,
    PaymentRepository, ProductRepository, ReportRepository, StockRepository,
};
use crate::seed::{self, SeedOutcome};

const IN_MEMORY: &str = ":memory:";

/// Where the database lives and how the pool is sized.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./backoffice.db").max_connections(8)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long `acquire` waits for a free connection.
    pub acquire_timeout: Duration,
    /// How long a writer waits for SQLite's lock.
    pub busy_timeout: Duration,
}

impl DbConfig {
    /// File-backed database; the file is created on first connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// A private, throwaway database for tests.
    ///
    /// An in-memory SQLite database exists per connection, so the pool is
    /// pinned to exactly one connection that never idles out.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(1),
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let url = if self.is_in_memory() {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite://{}", self.database_path.display())
        };

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        Ok(options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }
}

/// Handle to the back-office database.
///
/// Cheap to clone; the server keeps one inside its `AppState` and every
/// handler reaches the repositories through it:
///
/// ```rust,ignore
/// async fn list_customers(State(state): State<AppState>) -> ApiResult<Json<Vec<Customer>>> {
///     Ok(Json(state.db.customers().list().await?))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        let options = config.connect_options()?;
        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout);
        if config.is_in_memory() {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections = config.max_connections, "Pool ready");

        migrations::run_migrations(&pool).await?;

        Ok(Database { pool })
    }

    /// Embedded vs applied migration counts.
    pub async fn migration_status(&self) -> DbResult<MigrationStatus> {
        migrations::migration_status(&self.pool).await
    }

    /// Inserts the default catalog if the products table is empty.
    ///
    /// See [`crate::seed`].
    pub async fn seed_catalog_if_empty(&self) -> DbResult<SeedOutcome> {
        seed::seed_catalog_if_empty(&self.pool).await
    }

    /// Raw pool access, for tests and one-off maintenance queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn admin_users(&self) -> AdminUserRepository {
        AdminUserRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    /// ```rust,ignore
    /// let butter = db.products().get_by_name("Butter").await?;
    /// ```
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Stock rows, adjustments and their history.
    pub fn stock(&self) -> StockRepository {
        StockRepository::new(self.pool.clone())
    }

    pub fn invoices(&self) -> InvoiceRepository {
        InvoiceRepository::new(self.pool.clone())
    }

    pub fn payments(&self) -> PaymentRepository {
        PaymentRepository::new(self.pool.clone())
    }

    pub fn ledger(&self) -> LedgerRepository {
        LedgerRepository::new(self.pool.clone())
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections to return, then closes the pool.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// `SELECT 1` round trip.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
