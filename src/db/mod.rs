//! Database module providing connection management, migrations, and queries.

pub mod activity_log;
pub mod addons;
pub mod aggregates;
pub mod submit_steps;
pub mod uploads;
pub mod users;
pub mod validation_results;
pub mod versions;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

/// Database connection pool wrapper.
///
/// Reads go through [`DbPool::connection`]; anything that writes must obtain
/// its connection from [`DbPool::writer`] so maintenance mode can refuse it.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
    read_only: bool,
}

impl DbPool {
    /// Create a new database pool from configuration.
    pub async fn new(config: &Config) -> AppResult<Self> {
        Self::connect(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
            config.read_only,
        )
        .await
    }

    /// Connect to an explicit URL.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        min_connections: u32,
        read_only: bool,
    ) -> AppResult<Self> {
        let mut options = ConnectOptions::new(url.to_owned());
        options
            .max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        Ok(DbPool { conn, read_only })
    }

    /// Connection for queries that only read.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Connection for writes. Fails while the site is read-only.
    pub fn writer(&self) -> AppResult<&DatabaseConnection> {
        if self.read_only {
            return Err(AppError::ReadOnly);
        }
        Ok(&self.conn)
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Same pool with maintenance mode switched on or off.
    pub fn with_read_only(&self, read_only: bool) -> Self {
        DbPool {
            conn: self.conn.clone(),
            read_only,
        }
    }

    /// Apply all pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)))?;
        info!("Database migrations applied");
        Ok(())
    }
}
