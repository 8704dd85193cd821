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

//! Notification store abstraction.
//!
//! The processor talks to persisted notifications only through
//! [`NotificationStore`]. Two implementations ship with the crate:
//!
//! - [`crate::dal::DAL`]: SQLite via diesel
//! - [`MemoryStore`]: in-process, for embedding and tests
//!
//! Enqueueing is not part of the trait because it must join the transaction
//! of the write that produced the actions; see [`crate::queuer`] and
//! [`MemoryStore::enqueue`].

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{Case, Notification};

pub use memory::MemoryStore;

/// Processor-facing operations on persisted notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Notifications whose `retry_at` is unset or not after `now`.
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Notification>, StoreError>;

    /// Persists updated `retry_count` and `retry_at`.
    async fn save(&self, notification: &Notification) -> Result<(), StoreError>;

    /// Removes the notification permanently.
    async fn delete(&self, notification: &Notification) -> Result<(), StoreError>;

    /// Resolves the case the notification announces.
    async fn get_case(&self, notification: &Notification) -> Result<Case, StoreError>;
}
