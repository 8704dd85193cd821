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

//! Notification persistence against a real SQLite database.

use chrono::{Duration, Utc};
use diesel::connection::Connection;
use notary_notify::{Case, NotificationQueuer, NotificationStore, StoreError};
use uuid::Uuid;

use crate::fixtures::TestDatabase;

fn actions(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("http://callbacks.example/{}", i))
        .collect()
}

#[tokio::test]
async fn test_enqueue_commits_all_rows() {
    let db = TestDatabase::new().await;
    let dal = db.dal();
    let case = Case::rejected(Uuid::new_v4(), "http://notary.example/cases/1");

    let queued = dal
        .case()
        .create_with_actions(&case, actions(3))
        .await
        .expect("Failed to create case");

    assert_eq!(queued.len(), 3);
    assert!(queued.iter().all(|n| n.retry_count == 0 && n.retry_at.is_none()));
    assert_eq!(dal.notification().count_pending().await.unwrap(), 3);

    let stored = dal.notification().list_for_case(case.id).await.unwrap();
    assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn test_enqueue_rolls_back_with_transaction() {
    let db = TestDatabase::new().await;
    let dal = db.dal();
    let case = Case::rejected(Uuid::new_v4(), "http://notary.example/cases/2");
    dal.case()
        .create_with_actions(&case, Vec::new())
        .await
        .expect("Failed to create case");

    let case_id = case.id;
    let result = {
        // Single-connection pool: release it before querying through the DAL.
        let conn = db.database.get_connection().await.unwrap();
        conn.interact(move |conn| {
            conn.transaction::<(), diesel::result::Error, _>(|conn| {
                let queued = NotificationQueuer::enqueue(conn, case_id, &actions(3))?;
                assert_eq!(queued.len(), 3);
                // The triggering write fails after the enqueue.
                Err(diesel::result::Error::RollbackTransaction)
            })
        })
        .await
        .unwrap()
    };

    assert!(result.is_err());
    assert_eq!(dal.notification().count_pending().await.unwrap(), 0);
}

#[tokio::test]
async fn test_enqueue_in_committed_transaction_is_visible() {
    let db = TestDatabase::new().await;
    let dal = db.dal();
    let case = Case::rejected(Uuid::new_v4(), "http://notary.example/cases/2c");
    dal.case()
        .create_with_actions(&case, Vec::new())
        .await
        .expect("Failed to create case");

    let case_id = case.id;
    {
        let conn = db.database.get_connection().await.unwrap();
        conn.interact(move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                NotificationQueuer::enqueue(conn, case_id, &actions(3))
            })
        })
        .await
        .unwrap()
        .expect("Enqueue should commit");
    }

    assert_eq!(dal.notification().count_pending().await.unwrap(), 3);
}

#[tokio::test]
async fn test_failed_case_insert_enqueues_nothing() {
    let db = TestDatabase::new().await;
    let dal = db.dal();
    let first = Case::rejected(Uuid::new_v4(), "http://notary.example/cases/dup");
    dal.case()
        .create_with_actions(&first, actions(1))
        .await
        .unwrap();

    // Same external id violates the unique index.
    let duplicate = Case::rejected(Uuid::new_v4(), "http://notary.example/cases/dup");
    let result = dal.case().create_with_actions(&duplicate, actions(3)).await;

    assert!(matches!(result, Err(StoreError::Database(_))));
    assert_eq!(dal.notification().count_pending().await.unwrap(), 1);
    assert!(dal
        .notification()
        .list_for_case(duplicate.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_find_due_honours_retry_at() {
    let db = TestDatabase::new().await;
    let dal = db.dal();
    let case = Case::rejected(Uuid::new_v4(), "http://notary.example/cases/3");
    let queued = dal
        .case()
        .create_with_actions(&case, actions(2))
        .await
        .unwrap();

    let now = Utc::now();
    let mut later = queued[0].clone();
    later.retry_count = 1;
    later.retry_at = Some(now + Duration::seconds(2));
    dal.save(&later).await.unwrap();

    let due = dal.find_due(now).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, queued[1].id);

    let due = dal.find_due(now + Duration::seconds(2)).await.unwrap();
    assert_eq!(due.len(), 2);

    let stored = dal.notification().get(later.id).await.unwrap().unwrap();
    assert_eq!(stored.retry_count, 1);
    assert_eq!(
        stored.retry_at.unwrap().timestamp_millis(),
        later.retry_at.unwrap().timestamp_millis()
    );
}

#[tokio::test]
async fn test_delete_is_permanent() {
    let db = TestDatabase::new().await;
    let dal = db.dal();
    let case = Case::rejected(Uuid::new_v4(), "http://notary.example/cases/4");
    let queued = dal
        .case()
        .create_with_actions(&case, actions(1))
        .await
        .unwrap();

    dal.delete(&queued[0]).await.unwrap();

    let far_future = Utc::now() + Duration::days(1);
    assert!(dal.find_due(far_future).await.unwrap().is_empty());
    assert!(dal.notification().get(queued[0].id).await.unwrap().is_none());
    assert!(matches!(
        dal.save(&queued[0]).await,
        Err(StoreError::NotificationNotFound(_))
    ));
}

#[tokio::test]
async fn test_get_case_resolves_owner() {
    let db = TestDatabase::new().await;
    let dal = db.dal();
    let case = Case::executed(
        Uuid::new_v4(),
        "http://notary.example/cases/5",
        serde_json::json!({"type": "sha256", "preimage": "eA=="}),
    );
    let queued = dal
        .case()
        .create_with_actions(&case, actions(1))
        .await
        .unwrap();

    let loaded = dal.get_case(&queued[0]).await.unwrap();
    assert_eq!(loaded, case);
}
