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

//! Scheduler, processor, SQLite store and HTTP delivery working together.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use notary_notify::{
    verify_attestation, Case, CaseState, HttpDeliveryClient, NotificationPayload,
    NotificationProcessor, NotificationStore, NotifierConfig, QueueScheduler, DAL,
};
use serde_json::json;
use serial_test::serial;
use uuid::Uuid;

use crate::fixtures::{test_signer, CallbackServer, TestDatabase};

fn fast_config() -> NotifierConfig {
    NotifierConfig::builder()
        .processing_interval(Duration::from_millis(50))
        .retry_base_delay(Duration::from_millis(100))
        .retry_max_delay(Duration::from_secs(1))
        .delivery_timeout(Some(Duration::from_secs(5)))
        .build()
        .expect("Invalid test config")
}

fn processor(dal: &DAL, config: &NotifierConfig) -> (NotificationProcessor, Vec<u8>) {
    let (signer, keypair) = test_signer();
    let deliverer = HttpDeliveryClient::from_config(config).expect("Failed to build client");
    let processor = NotificationProcessor::new(
        Arc::new(dal.clone()),
        Arc::new(deliverer),
        Arc::new(signer),
        config,
    );
    (processor, keypair.public_key)
}

async fn wait_until_drained(dal: &DAL, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if dal.notification().count_pending().await.unwrap() == 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
#[serial]
async fn test_executed_case_is_delivered_to_every_action() {
    let db = TestDatabase::new().await;
    let dal = db.dal();
    let server = CallbackServer::start(Vec::new()).await;
    let config = fast_config();
    let (processor, public_key) = processor(&dal, &config);

    let fulfillment = json!({"type": "sha256", "preimage": "ZG9uZQ=="});
    let case = Case::executed(
        Uuid::new_v4(),
        "http://notary.example/cases/e2e-1",
        fulfillment.clone(),
    );
    dal.case()
        .create_with_actions(&case, vec![server.url("alice"), server.url("bob")])
        .await
        .unwrap();

    let scheduler = QueueScheduler::new(Arc::new(processor), &config);
    scheduler.start();
    scheduler.schedule_processing();

    assert!(wait_until_drained(&dal, Duration::from_secs(5)).await);
    scheduler.shutdown().await;

    let received = server.received();
    assert_eq!(received.len(), 2);
    let mut paths: Vec<&str> = received.iter().map(|r| r.path.as_str()).collect();
    paths.sort();
    assert_eq!(paths, vec!["alice", "bob"]);

    for callback in received {
        let body = &callback.body["execution_condition_fulfillment"];
        assert_eq!(body["type"], "and");
        assert_eq!(body["subfulfillments"][1], fulfillment);

        let payload: NotificationPayload = serde_json::from_value(callback.body.clone()).unwrap();
        verify_attestation(
            &case.external_id,
            CaseState::Executed,
            payload.fulfillment(),
            &public_key,
        )
        .expect("Attestation should verify");
    }
}

#[tokio::test]
#[serial]
async fn test_failed_delivery_is_retried_until_accepted() {
    let db = TestDatabase::new().await;
    let dal = db.dal();
    let server = CallbackServer::start(vec![500, 503]).await;
    let config = fast_config();
    let (processor, _) = processor(&dal, &config);

    let case = Case::rejected(Uuid::new_v4(), "http://notary.example/cases/e2e-2");
    dal.case()
        .create_with_actions(&case, vec![server.url("flaky")])
        .await
        .unwrap();

    let scheduler = QueueScheduler::new(Arc::new(processor), &config);
    scheduler.start();

    assert!(wait_until_drained(&dal, Duration::from_secs(5)).await);
    scheduler.shutdown().await;

    let received = server.received();
    assert_eq!(received.len(), 3);
    assert!(received
        .iter()
        .all(|r| r.body.get("cancellation_condition_fulfillment").is_some()));
}

#[tokio::test]
async fn test_server_error_sets_backoff_in_database() {
    let db = TestDatabase::new().await;
    let dal = db.dal();
    let server = CallbackServer::start(vec![500]).await;
    let (processor, _) = processor(&dal, &NotifierConfig::default());

    let case = Case::rejected(Uuid::new_v4(), "http://notary.example/cases/e2e-3");
    let queued = dal
        .case()
        .create_with_actions(&case, vec![server.url("down")])
        .await
        .unwrap();

    let summary = processor.process_due(Utc::now()).await.unwrap();
    assert_eq!(summary.rescheduled, 1);

    let stored = dal.notification().get(queued[0].id).await.unwrap().unwrap();
    assert_eq!(stored.retry_count, 1);
    let retry_at = stored.retry_at.unwrap();
    assert!(retry_at > Utc::now());

    assert!(dal.find_due(Utc::now()).await.unwrap().is_empty());
    let due = dal.find_due(retry_at).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, queued[0].id);
}

#[tokio::test]
async fn test_pending_case_is_dropped_without_callback() {
    let db = TestDatabase::new().await;
    let dal = db.dal();
    let server = CallbackServer::start(Vec::new()).await;
    let (processor, _) = processor(&dal, &NotifierConfig::default());

    let case = Case::pending(Uuid::new_v4(), "http://notary.example/cases/e2e-4");
    dal.case()
        .create_with_actions(&case, vec![server.url("early")])
        .await
        .unwrap();

    let summary = processor.process_due(Utc::now()).await.unwrap();

    assert_eq!(summary.abandoned, 1);
    assert!(server.received().is_empty());
    assert_eq!(dal.notification().count_pending().await.unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn test_stopped_scheduler_leaves_notifications_queued() {
    let db = TestDatabase::new().await;
    let dal = db.dal();
    let server = CallbackServer::start(Vec::new()).await;
    let config = fast_config();
    let (processor, _) = processor(&dal, &config);

    let scheduler = QueueScheduler::new(Arc::new(processor), &config);
    scheduler.start();
    scheduler.stop();

    let case = Case::rejected(Uuid::new_v4(), "http://notary.example/cases/e2e-5");
    dal.case()
        .create_with_actions(&case, vec![server.url("idle")])
        .await
        .unwrap();
    scheduler.schedule_processing();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(server.received().is_empty());
    assert_eq!(dal.notification().count_pending().await.unwrap(), 1);
}
