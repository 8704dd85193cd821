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

//! Error types shared across the notification engine.
//!
//! Each concern owns its own error enum:
//! - [`StoreError`] for anything that touches persisted notifications or cases
//! - [`ConfigError`] for invalid engine configuration
//!
//! Signing, attestation and delivery errors live next to the code that raises
//! them (`crypto`, `attestation`, `delivery`) and are re-exported from the
//! crate root.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by notification store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not obtain or use a pooled connection.
    #[error("Connection pool error: {0}")]
    ConnectionPool(String),

    /// The underlying query failed.
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Running embedded migrations failed.
    #[error("Migration error: {0}")]
    Migration(String),

    /// The connection string could not be understood.
    #[error("Invalid database URL '{0}': expected sqlite://, file:, a file path, or :memory:")]
    InvalidUrl(String),

    /// A notification refers to a case that does not exist.
    #[error("Case {0} not found")]
    CaseNotFound(Uuid),

    /// The notification being updated no longer exists.
    #[error("Notification {0} not found")]
    NotificationNotFound(Uuid),

    /// A persisted row could not be mapped back into a domain type.
    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow {
        /// Table the row was read from
        table: &'static str,
        /// What was wrong with it
        reason: String,
    },
}

/// Errors raised while validating engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A duration setting must be non-zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// A count setting must be non-zero.
    #[error("{0} must be greater than zero")]
    ZeroCount(&'static str),

    /// The retry ceiling is lower than the first retry delay.
    #[error("retry ceiling ({ceiling_secs}s) is lower than the base delay ({base_secs}s)")]
    CeilingBelowBase {
        /// Configured ceiling in seconds
        ceiling_secs: u64,
        /// Configured base delay in seconds
        base_secs: u64,
    },
}
