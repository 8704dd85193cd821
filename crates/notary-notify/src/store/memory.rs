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

//! In-memory notification store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use super::NotificationStore;
use crate::error::StoreError;
use crate::models::{Case, Notification};
use crate::queuer::NotificationQueuer;

#[derive(Default)]
struct Tables {
    cases: HashMap<Uuid, Case>,
    notifications: HashMap<Uuid, Notification>,
}

/// A [`NotificationStore`] kept entirely in process memory.
///
/// Cloning shares the same tables. Every operation takes a single lock, so
/// batch enqueues are all-or-nothing.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a case.
    pub fn put_case(&self, case: Case) {
        self.tables.lock().cases.insert(case.id, case);
    }

    /// Enqueues one notification per action for an existing case.
    pub fn enqueue<S: AsRef<str>>(
        &self,
        case_id: Uuid,
        actions: &[S],
    ) -> Result<Vec<Notification>, StoreError> {
        let mut tables = self.tables.lock();
        if !tables.cases.contains_key(&case_id) {
            return Err(StoreError::CaseNotFound(case_id));
        }

        let queued = NotificationQueuer::build(case_id, actions);
        for notification in &queued {
            tables
                .notifications
                .insert(notification.id, notification.clone());
        }
        Ok(queued)
    }

    /// Fetches a single notification by id.
    pub fn get(&self, id: Uuid) -> Option<Notification> {
        self.tables.lock().notifications.get(&id).cloned()
    }

    /// Number of notifications still pending.
    pub fn len(&self) -> usize {
        self.tables.lock().notifications.len()
    }

    /// Whether no notifications are pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Notification>, StoreError> {
        let tables = self.tables.lock();
        let mut due: Vec<Notification> = tables
            .notifications
            .values()
            .filter(|n| n.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|n| n.created_at);
        Ok(due)
    }

    async fn save(&self, notification: &Notification) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        match tables.notifications.get_mut(&notification.id) {
            Some(stored) => {
                stored.retry_count = notification.retry_count;
                stored.retry_at = notification.retry_at;
                Ok(())
            }
            None => Err(StoreError::NotificationNotFound(notification.id)),
        }
    }

    async fn delete(&self, notification: &Notification) -> Result<(), StoreError> {
        self.tables.lock().notifications.remove(&notification.id);
        Ok(())
    }

    async fn get_case(&self, notification: &Notification) -> Result<Case, StoreError> {
        self.tables
            .lock()
            .cases
            .get(&notification.case_id)
            .cloned()
            .ok_or(StoreError::CaseNotFound(notification.case_id))
    }
}
