/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Database connection management for the SQLite notification store.
//!
//! This module provides an async connection pool built on `deadpool-diesel`.
//! Diesel connections are synchronous, so every query runs inside
//! `interact`, which moves it onto a blocking thread and keeps the scheduling
//! loop free.
//!
//! # Example
//!
//! ```rust,ignore
//! use notary_notify::database::Database;
//!
//! let db = Database::new("sqlite:///var/lib/notary/notary.db")?;
//! db.run_migrations().await?;
//! ```

use deadpool_diesel::sqlite::{Manager, Pool, Runtime};
use tracing::info;

use crate::error::StoreError;

/// Pooled SQLite connection handle.
pub type PooledConnection = deadpool::managed::Object<Manager>;

/// Represents a pool of database connections.
///
/// The `Database` struct is `Clone`; each clone references the same
/// underlying connection pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
    url: String,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Creates a new connection pool for the given SQLite location.
    ///
    /// Accepted forms:
    /// - `sqlite://` prefix followed by a path
    /// - `file:` URIs (e.g., `file:notary?mode=memory&cache=shared`)
    /// - absolute or relative file paths
    /// - `:memory:`
    pub fn new(connection_string: &str) -> Result<Self, StoreError> {
        if !is_sqlite_url(connection_string) {
            return Err(StoreError::InvalidUrl(connection_string.to_string()));
        }

        let url = Self::build_sqlite_url(connection_string);
        let manager = Manager::new(url.clone(), Runtime::Tokio1);
        // SQLite has limited concurrent write support even with WAL mode.
        // A single connection avoids "database is locked" errors.
        let sqlite_pool_size = 1;
        let pool = Pool::builder(manager)
            .max_size(sqlite_pool_size)
            .build()
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        info!(
            "SQLite connection pool initialized (size: {})",
            sqlite_pool_size
        );

        Ok(Self { pool, url })
    }

    /// Returns the resolved SQLite location.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Strips an optional `sqlite://` prefix.
    fn build_sqlite_url(connection_string: &str) -> String {
        if let Some(path) = connection_string.strip_prefix("sqlite://") {
            path.to_string()
        } else {
            connection_string.to_string()
        }
    }

    /// Runs pending embedded migrations.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        use diesel::prelude::*;
        use diesel_migrations::MigrationHarness;

        let conn = self.get_connection().await?;
        conn.interact(|conn| {
            // WAL mode allows concurrent reads during writes
            diesel::sql_query("PRAGMA journal_mode=WAL;")
                .execute(conn)
                .map_err(|e| e.to_string())?;
            // busy_timeout makes SQLite wait instead of failing immediately on locks
            diesel::sql_query("PRAGMA busy_timeout=30000;")
                .execute(conn)
                .map_err(|e| e.to_string())?;

            conn.run_pending_migrations(crate::database::SQLITE_MIGRATIONS)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| StoreError::Migration(e.to_string()))?
        .map_err(StoreError::Migration)?;

        info!("SQLite migrations applied");
        Ok(())
    }

    /// Gets a pooled SQLite connection.
    pub async fn get_connection(&self) -> Result<PooledConnection, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))
    }
}

fn is_sqlite_url(url: &str) -> bool {
    url.starts_with("sqlite://")
        || url.starts_with("file:")
        || url.starts_with('/')
        || url.starts_with("./")
        || url.starts_with("../")
        || url == ":memory:"
        || url.ends_with(".db")
        || url.ends_with(".sqlite")
        || url.ends_with(".sqlite3")
}
