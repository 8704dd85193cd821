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

//! Case finalization with transactional enqueue.

use notary_notify::{Case, CaseState, StoreError};
use serde_json::json;
use uuid::Uuid;

use crate::fixtures::TestDatabase;

#[tokio::test]
async fn test_finalize_records_state_and_enqueues() {
    let db = TestDatabase::new().await;
    let dal = db.dal();
    let case = Case::pending(Uuid::new_v4(), "http://notary.example/cases/10");
    dal.case()
        .create_with_actions(&case, Vec::new())
        .await
        .expect("Failed to create case");
    assert_eq!(dal.notification().count_pending().await.unwrap(), 0);

    let fulfillment = json!({"type": "sha256", "preimage": "eQ=="});
    let queued = dal
        .case()
        .finalize_with_actions(
            case.id,
            CaseState::Executed,
            Some(fulfillment.clone()),
            vec![
                "http://a.example/cb".to_string(),
                "http://b.example/cb".to_string(),
                "http://c.example/cb".to_string(),
            ],
        )
        .await
        .expect("Failed to finalize case");

    assert_eq!(queued.len(), 3);
    assert!(queued.iter().all(|n| n.case_id == case.id));

    let loaded = dal.case().get(case.id).await.unwrap();
    assert_eq!(loaded.state, CaseState::Executed);
    assert_eq!(loaded.execution_condition_fulfillment, Some(fulfillment));
    assert_eq!(dal.notification().count_pending().await.unwrap(), 3);
}

#[tokio::test]
async fn test_finalize_unknown_case_enqueues_nothing() {
    let db = TestDatabase::new().await;
    let dal = db.dal();
    let missing = Uuid::new_v4();

    let result = dal
        .case()
        .finalize_with_actions(
            missing,
            CaseState::Rejected,
            None,
            vec!["http://a.example/cb".to_string()],
        )
        .await;

    assert!(matches!(result, Err(StoreError::CaseNotFound(id)) if id == missing));
    assert_eq!(dal.notification().count_pending().await.unwrap(), 0);
}

#[tokio::test]
async fn test_get_missing_case() {
    let db = TestDatabase::new().await;
    let result = db.dal().case().get(Uuid::new_v4()).await;
    assert!(matches!(result, Err(StoreError::CaseNotFound(_))));
}
