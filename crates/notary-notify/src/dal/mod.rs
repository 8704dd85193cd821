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

//! Data access layer over the SQLite database.
//!
//! `DAL` hands out short-lived per-table accessors (`notification()`,
//! `case()`) and implements [`NotificationStore`] so the processor can run
//! directly against SQLite.

pub mod case;
pub mod models;
pub mod notification;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::Database;
use crate::error::StoreError;
use crate::models::{Case, Notification};
use crate::store::NotificationStore;

pub use case::CaseDAL;
pub use notification::NotificationDAL;

/// Entry point for database operations.
#[derive(Clone, Debug)]
pub struct DAL {
    /// The pooled database the accessors run against
    pub database: Database,
}

impl DAL {
    /// Creates a DAL over an existing database pool.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Notification table operations.
    pub fn notification(&self) -> NotificationDAL<'_> {
        NotificationDAL::new(self)
    }

    /// Case table operations.
    pub fn case(&self) -> CaseDAL<'_> {
        CaseDAL::new(self)
    }
}

#[async_trait]
impl NotificationStore for DAL {
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Notification>, StoreError> {
        self.notification().find_due(now).await
    }

    async fn save(&self, notification: &Notification) -> Result<(), StoreError> {
        self.notification().save(notification).await
    }

    async fn delete(&self, notification: &Notification) -> Result<(), StoreError> {
        self.notification().delete(notification).await
    }

    async fn get_case(&self, notification: &Notification) -> Result<Case, StoreError> {
        self.case().get(notification.case_id).await
    }
}
