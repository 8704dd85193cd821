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

//! Notification Model
//!
//! A notification is one pending obligation to tell one callback URL about one
//! case's final state. Rows are short-lived: they are created when a case's
//! actions are known and deleted once delivered or abandoned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a notification record (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier assigned at creation
    pub id: Uuid,
    /// The case whose outcome is announced
    pub case_id: Uuid,
    /// Callback URL receiving the announcement
    pub action: String,
    /// Number of failed delivery attempts so far
    pub retry_count: u32,
    /// Earliest time of the next attempt; `None` means due immediately
    pub retry_at: Option<DateTime<Utc>>,
    /// When the notification was enqueued
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates a fresh notification for one action, due immediately.
    pub fn new(case_id: Uuid, action: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            case_id,
            action: action.into(),
            retry_count: 0,
            retry_at: None,
            created_at: Utc::now(),
        }
    }

    /// Whether the notification is eligible for a pass running at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.retry_at.map_or(true, |retry_at| retry_at <= now)
    }
}
