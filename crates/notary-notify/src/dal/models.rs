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

//! Backend row types and their conversion to domain types.
//!
//! SQLite has no native UUID or timezone-aware timestamp, so ids are stored as
//! hyphenated text and timestamps as naive UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::database::schema::{cases, notifications};
use crate::error::StoreError;
use crate::models::{Case, CaseState, Notification};

/// A row of the `notifications` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NotificationRow {
    pub id: String,
    pub case_id: String,
    pub action: String,
    pub retry_count: i32,
    pub retry_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

/// A row of the `cases` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = cases)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CaseRow {
    pub id: String,
    pub external_id: String,
    pub state: String,
    pub execution_condition_fulfillment: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

pub(crate) fn to_naive(timestamp: DateTime<Utc>) -> NaiveDateTime {
    timestamp.naive_utc()
}

pub(crate) fn from_naive(timestamp: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(timestamp, Utc)
}

/// Clamps a retry count into the `INTEGER` column range.
pub(crate) fn retry_count_to_db(retry_count: u32) -> i32 {
    i32::try_from(retry_count).unwrap_or(i32::MAX)
}

fn parse_uuid(table: &'static str, value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|e| StoreError::CorruptRow {
        table,
        reason: format!("invalid uuid '{}': {}", value, e),
    })
}

impl From<&Notification> for NotificationRow {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id.to_string(),
            case_id: notification.case_id.to_string(),
            action: notification.action.clone(),
            retry_count: retry_count_to_db(notification.retry_count),
            retry_at: notification.retry_at.map(to_naive),
            created_at: to_naive(notification.created_at),
        }
    }
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let retry_count = u32::try_from(row.retry_count).map_err(|_| StoreError::CorruptRow {
            table: "notifications",
            reason: format!("negative retry_count {}", row.retry_count),
        })?;

        Ok(Notification {
            id: parse_uuid("notifications", &row.id)?,
            case_id: parse_uuid("notifications", &row.case_id)?,
            action: row.action,
            retry_count,
            retry_at: row.retry_at.map(from_naive),
            created_at: from_naive(row.created_at),
        })
    }
}

impl CaseRow {
    /// Builds a row for a new case, stamping both timestamps with `now`.
    pub fn from_case(case: &Case, now: DateTime<Utc>) -> Result<Self, StoreError> {
        let fulfillment = case
            .execution_condition_fulfillment
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::CorruptRow {
                table: "cases",
                reason: format!("unserializable fulfillment: {}", e),
            })?;

        Ok(Self {
            id: case.id.to_string(),
            external_id: case.external_id.clone(),
            state: case.state.as_str().to_string(),
            execution_condition_fulfillment: fulfillment,
            created_at: to_naive(now),
            updated_at: to_naive(now),
        })
    }
}

impl TryFrom<CaseRow> for Case {
    type Error = StoreError;

    fn try_from(row: CaseRow) -> Result<Self, Self::Error> {
        let state = row
            .state
            .parse::<CaseState>()
            .map_err(|reason| StoreError::CorruptRow {
                table: "cases",
                reason,
            })?;

        let execution_condition_fulfillment = row
            .execution_condition_fulfillment
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| StoreError::CorruptRow {
                table: "cases",
                reason: format!("invalid fulfillment json: {}", e),
            })?;

        Ok(Case {
            id: parse_uuid("cases", &row.id)?,
            external_id: row.external_id,
            state,
            execution_condition_fulfillment,
        })
    }
}
