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

//! Notification queuing.
//!
//! Notifications are created in the same transaction that persists a case's
//! action list, so the enqueue never partially succeeds relative to the
//! triggering write. The queuer therefore takes the caller's connection
//! instead of opening its own:
//!
//! ```rust,ignore
//! conn.transaction(|conn| {
//!     diesel::insert_into(cases::table).values(&case_row).execute(conn)?;
//!     NotificationQueuer::enqueue(conn, case_id, &actions)
//! })
//! ```
//!
//! The SQLite pool holds a single connection. Release the pooled connection
//! before calling any `DAL` method, otherwise the DAL waits on the pool
//! forever.
//!
//! After the transaction commits, callers should nudge a running scheduler
//! with `QueueScheduler::schedule_processing` so delivery starts promptly.

use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::dal::models::NotificationRow;
use crate::database::schema::notifications;
use crate::models::Notification;

/// Builds and persists one notification per callback action.
pub struct NotificationQueuer;

impl NotificationQueuer {
    /// Builds one fresh notification per action, with no retry bookkeeping.
    pub fn build<S: AsRef<str>>(case_id: Uuid, actions: &[S]) -> Vec<Notification> {
        actions
            .iter()
            .map(|action| Notification::new(case_id, action.as_ref()))
            .collect()
    }

    /// Inserts one notification per action as a single batch.
    ///
    /// Must be called inside the caller's transaction; if that transaction
    /// rolls back, none of the rows become visible.
    ///
    /// The connection belongs to a pool of size one; drop it before going
    /// back through the `DAL`.
    pub fn enqueue<S: AsRef<str>>(
        conn: &mut SqliteConnection,
        case_id: Uuid,
        actions: &[S],
    ) -> QueryResult<Vec<Notification>> {
        let queued = Self::build(case_id, actions);
        if queued.is_empty() {
            return Ok(queued);
        }

        let rows: Vec<NotificationRow> = queued.iter().map(NotificationRow::from).collect();
        diesel::insert_into(notifications::table)
            .values(&rows)
            .execute(conn)?;

        debug!(
            case_id = %case_id,
            count = queued.len(),
            "Queued notifications for case"
        );
        Ok(queued)
    }
}
