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

//! Case DAL
//!
//! The engine itself only reads cases. The write operations here exist for
//! host processes that keep cases in the same SQLite database: they persist
//! the case change and enqueue its notifications in one transaction.

use chrono::Utc;
use diesel::connection::Connection;
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use super::models::{to_naive, CaseRow};
use super::DAL;
use crate::database::schema::cases;
use crate::error::StoreError;
use crate::models::{Case, CaseState, Notification};
use crate::queuer::NotificationQueuer;

/// Data access layer for case operations.
#[derive(Clone)]
pub struct CaseDAL<'a> {
    dal: &'a DAL,
}

impl<'a> CaseDAL<'a> {
    /// Creates a new CaseDAL instance.
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Loads a case by id.
    pub async fn get(&self, id: Uuid) -> Result<Case, StoreError> {
        let conn = self.dal.database.get_connection().await?;
        let key = id.to_string();

        let row: Option<CaseRow> = conn
            .interact(move |conn| {
                cases::table
                    .find(key)
                    .select(CaseRow::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        row.ok_or(StoreError::CaseNotFound(id))
            .and_then(Case::try_from)
    }

    /// Inserts a case and enqueues one notification per action, atomically.
    pub async fn create_with_actions(
        &self,
        case: &Case,
        actions: Vec<String>,
    ) -> Result<Vec<Notification>, StoreError> {
        let conn = self.dal.database.get_connection().await?;
        let row = CaseRow::from_case(case, Utc::now())?;
        let case_id = case.id;

        let queued = conn
            .interact(move |conn| {
                conn.transaction::<_, diesel::result::Error, _>(|conn| {
                    diesel::insert_into(cases::table)
                        .values(&row)
                        .execute(conn)?;
                    NotificationQueuer::enqueue(conn, case_id, &actions)
                })
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(queued)
    }

    /// Records a case's final state and enqueues one notification per action,
    /// atomically.
    pub async fn finalize_with_actions(
        &self,
        id: Uuid,
        state: CaseState,
        execution_condition_fulfillment: Option<Value>,
        actions: Vec<String>,
    ) -> Result<Vec<Notification>, StoreError> {
        let conn = self.dal.database.get_connection().await?;
        let key = id.to_string();
        let fulfillment = execution_condition_fulfillment
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::CorruptRow {
                table: "cases",
                reason: format!("unserializable fulfillment: {}", e),
            })?;
        let now = to_naive(Utc::now());

        let (updated, queued) = conn
            .interact(move |conn| {
                conn.transaction::<_, diesel::result::Error, _>(|conn| {
                    let updated = diesel::update(cases::table.find(key))
                        .set((
                            cases::state.eq(state.as_str()),
                            cases::execution_condition_fulfillment.eq(fulfillment),
                            cases::updated_at.eq(now),
                        ))
                        .execute(conn)?;
                    if updated == 0 {
                        // Unknown case: nothing to enqueue.
                        return Ok((0, Vec::new()));
                    }
                    let queued = NotificationQueuer::enqueue(conn, id, &actions)?;
                    Ok((updated, queued))
                })
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        if updated == 0 {
            return Err(StoreError::CaseNotFound(id));
        }
        Ok(queued)
    }
}
