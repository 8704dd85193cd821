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

//! Case Model
//!
//! A case is the record whose outcome gets announced. The engine only reads
//! cases: it needs the external identity and final state to build the
//! attestation, and the case's own execution fulfillment when it executed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Finalization state of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseState {
    /// Not yet decided
    Pending,
    /// Finalized: the execution condition was met
    Executed,
    /// Finalized: the case was cancelled
    Rejected,
}

impl CaseState {
    /// Returns the string representation used in storage and attestations.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseState::Pending => "pending",
            CaseState::Executed => "executed",
            CaseState::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for CaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CaseState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CaseState::Pending),
            "executed" => Ok(CaseState::Executed),
            "rejected" => Ok(CaseState::Rejected),
            other => Err(format!("unknown case state '{}'", other)),
        }
    }
}

/// A case as seen by the notification engine (domain type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    /// Internal identifier, referenced by notifications
    pub id: Uuid,
    /// Public identity of the case (typically its URI)
    pub external_id: String,
    /// Current finalization state
    pub state: CaseState,
    /// Fulfillment supplied by the case when it executed
    pub execution_condition_fulfillment: Option<Value>,
}

impl Case {
    /// Creates a pending case.
    pub fn pending(id: Uuid, external_id: impl Into<String>) -> Self {
        Self {
            id,
            external_id: external_id.into(),
            state: CaseState::Pending,
            execution_condition_fulfillment: None,
        }
    }

    /// Creates an executed case carrying its execution fulfillment.
    pub fn executed(id: Uuid, external_id: impl Into<String>, fulfillment: Value) -> Self {
        Self {
            id,
            external_id: external_id.into(),
            state: CaseState::Executed,
            execution_condition_fulfillment: Some(fulfillment),
        }
    }

    /// Creates a rejected case.
    pub fn rejected(id: Uuid, external_id: impl Into<String>) -> Self {
        Self {
            id,
            external_id: external_id.into(),
            state: CaseState::Rejected,
            execution_condition_fulfillment: None,
        }
    }
}
