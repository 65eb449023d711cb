// ABOUTME: Database connection management and embedded migrations
// ABOUTME: Thin persistence boundary over SQLite via sqlx; no credential policy lives here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck

use crate::errors::{AppError, AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::info;

/// Credential persistence operations
pub mod credentials;

/// Database handle shared by the credential manager
///
/// Cheap to clone; the underlying pool is reference-counted.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection (internal implementation)
    async fn new_impl(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::database(format!("Invalid database URL: {e}")))?
            .create_if_missing(true);

        // A pooled :memory: database exists per-connection; pin a single
        // long-lived connection so every query sees the migrated schema.
        let is_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let mut pool_options = SqlitePoolOptions::new();
        if is_memory {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };

        db.migrate_impl()
            .await
            .map_err(|e| AppError::database(format!("Database migration failed: {e}")))?;

        Ok(db)
    }

    /// Create a new database connection (public API)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Database URL is invalid or malformed
    /// - Database connection fails
    /// - `SQLite` file creation fails
    /// - Migration process fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        Self::new_impl(database_url).await
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run all database migrations (public API)
    ///
    /// # Errors
    ///
    /// Returns an error if any migration fails or the connection is lost
    /// during migration.
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_impl().await
    }

    /// Run all database migrations (internal implementation)
    async fn migrate_impl(&self) -> AppResult<()> {
        info!("Running database migrations...");

        // Migrations are embedded at compile time from ./migrations so they
        // are available regardless of working directory.
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}
