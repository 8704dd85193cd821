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

//! Notification DAL
//!
//! Due-selection, retry bookkeeping and removal of notification rows. Creation
//! goes through [`crate::queuer::NotificationQueuer`] so it can share the
//! transaction of the write that produced the case's actions.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::models::{retry_count_to_db, to_naive, NotificationRow};
use super::DAL;
use crate::database::schema::notifications;
use crate::error::StoreError;
use crate::models::Notification;

/// Data access layer for notification operations.
#[derive(Clone)]
pub struct NotificationDAL<'a> {
    dal: &'a DAL,
}

impl<'a> NotificationDAL<'a> {
    /// Creates a new NotificationDAL instance.
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Lists notifications whose `retry_at` is unset or not after `now`.
    ///
    /// Returns entries ordered by creation time (oldest first).
    pub async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Notification>, StoreError> {
        let conn = self.dal.database.get_connection().await?;
        let cutoff = to_naive(now);

        let rows: Vec<NotificationRow> = conn
            .interact(move |conn| {
                notifications::table
                    .filter(
                        notifications::retry_at
                            .is_null()
                            .or(notifications::retry_at.le(cutoff)),
                    )
                    .order(notifications::created_at.asc())
                    .select(NotificationRow::as_select())
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        rows.into_iter().map(Notification::try_from).collect()
    }

    /// Persists the retry bookkeeping (`retry_count`, `retry_at`).
    pub async fn save(&self, notification: &Notification) -> Result<(), StoreError> {
        let conn = self.dal.database.get_connection().await?;
        let id = notification.id;
        let retry_count = retry_count_to_db(notification.retry_count);
        let retry_at = notification.retry_at.map(to_naive);

        let updated: usize = conn
            .interact(move |conn| {
                diesel::update(notifications::table.find(id.to_string()))
                    .set((
                        notifications::retry_count.eq(retry_count),
                        notifications::retry_at.eq(retry_at),
                    ))
                    .execute(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        if updated == 0 {
            return Err(StoreError::NotificationNotFound(id));
        }
        Ok(())
    }

    /// Removes a notification permanently. Removing a missing row is a no-op.
    pub async fn delete(&self, notification: &Notification) -> Result<(), StoreError> {
        let conn = self.dal.database.get_connection().await?;
        let id = notification.id.to_string();

        conn.interact(move |conn| diesel::delete(notifications::table.find(id)).execute(conn))
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(())
    }

    /// Fetches a single notification by id.
    pub async fn get(&self, id: Uuid) -> Result<Option<Notification>, StoreError> {
        let conn = self.dal.database.get_connection().await?;
        let key = id.to_string();

        let row: Option<NotificationRow> = conn
            .interact(move |conn| {
                notifications::table
                    .find(key)
                    .select(NotificationRow::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        row.map(Notification::try_from).transpose()
    }

    /// Lists every notification still pending for a case.
    pub async fn list_for_case(&self, case_id: Uuid) -> Result<Vec<Notification>, StoreError> {
        let conn = self.dal.database.get_connection().await?;
        let key = case_id.to_string();

        let rows: Vec<NotificationRow> = conn
            .interact(move |conn| {
                notifications::table
                    .filter(notifications::case_id.eq(key))
                    .order(notifications::created_at.asc())
                    .select(NotificationRow::as_select())
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        rows.into_iter().map(Notification::try_from).collect()
    }

    /// Counts pending notifications (for monitoring).
    pub async fn count_pending(&self) -> Result<i64, StoreError> {
        let conn = self.dal.database.get_connection().await?;

        let count: i64 = conn
            .interact(move |conn| notifications::table.count().get_result(conn))
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(count)
    }
}
