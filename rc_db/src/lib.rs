//! ABOUTME: Data-access layer for the activist roster on SQLite
//! ABOUTME: Store handle plus the activist repository and its read models

use rc_config::DatabaseConfig;
use rc_core::{Error, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use tracing::{debug, info, instrument};

/// Handle on an existing roster database
#[derive(Debug, Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open a pool against an existing database file
    ///
    /// The schema is owned elsewhere; a missing file is an error rather than a fresh database.
    #[instrument(skip(config), fields(path = %config.path))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("Opening roster database");

        let connect_options = SqliteConnectOptions::new()
            .filename(&config.path)
            .journal_mode(SqliteJournalMode::Wal)
            .create_if_missing(false)
            .pragma("foreign_keys", "ON")
            .pragma("busy_timeout", "30000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.pool_size)
            .connect_with(connect_options)
            .await
            .map_err(|e| Error::database("connect", &config.path, e))?;

        info!("Roster database opened");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a Db instance from an existing pool (for testing/reuse)
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Repository over this handle's pool
    pub fn activists(&self) -> ActivistRepository<'_> {
        ActivistRepository::new(&self.pool)
    }

    /// Check database health
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<()> {
        debug!("Performing database health check");

        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::database("health_check", "SELECT 1", e))?;

        debug!("Database health check passed");
        Ok(())
    }
}

pub mod models;
pub mod query;
pub mod repositories;
pub mod status;

pub use models::{Activist, ActivistExtra, ActivistJson, AttendanceSummary, Membership};
pub use query::{ActivistQuery, RangeOptions, SortOrder, ASC_ORDER, DESC_ORDER};
pub use repositories::activists::ActivistRepository;
pub use status::{ActivistStatus, DefaultStatusPolicy, StatusPolicy};
