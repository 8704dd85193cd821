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

//! HTTP delivery and outcome classification against a live callback server.

use std::time::Duration;

use notary_notify::{
    build_payload, Case, Deliverer, DeliveryError, HttpDeliveryClient, NotificationPayload,
};
use uuid::Uuid;

use crate::fixtures::{test_signer, CallbackServer};

fn rejected_payload() -> NotificationPayload {
    let (signer, _) = test_signer();
    let case = Case::rejected(Uuid::new_v4(), "http://notary.example/cases/7");
    build_payload(&case, &signer).expect("Failed to build payload")
}

fn client(timeout: Option<Duration>) -> HttpDeliveryClient {
    HttpDeliveryClient::new(timeout, "notary-notify-tests").expect("Failed to build client")
}

#[tokio::test]
async fn test_success_status_is_accepted_and_body_is_payload() {
    let server = CallbackServer::start(vec![200]).await;
    let payload = rejected_payload();

    client(None)
        .deliver(&server.url("ok"), &payload)
        .await
        .expect("Delivery should succeed");

    let received = server.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].path, "ok");
    assert_eq!(received[0].body, serde_json::to_value(&payload).unwrap());
    assert!(received[0].body.get("cancellation_condition_fulfillment").is_some());
}

#[tokio::test]
async fn test_accepted_statuses_below_400() {
    let server = CallbackServer::start(vec![201, 204]).await;
    let payload = rejected_payload();
    let client = client(None);

    client.deliver(&server.url("a"), &payload).await.unwrap();
    client.deliver(&server.url("b"), &payload).await.unwrap();
}

#[tokio::test]
async fn test_error_statuses_are_retryable_rejections() {
    let server = CallbackServer::start(vec![500, 404, 400]).await;
    let payload = rejected_payload();
    let client = client(None);

    for expected in [500u16, 404, 400] {
        let err = client
            .deliver(&server.url("fail"), &payload)
            .await
            .expect_err("Delivery should fail");
        assert!(matches!(err, DeliveryError::Rejected { status, .. } if status == expected));
        assert!(err.is_retryable());
    }
    assert_eq!(server.received().len(), 3);
}

#[tokio::test]
async fn test_connection_refused_is_retryable() {
    // Bind then release a port so nothing is listening on it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(Some(Duration::from_secs(5)))
        .deliver(&format!("http://{}/cb", addr), &rejected_payload())
        .await
        .expect_err("Delivery should fail");

    assert!(matches!(err, DeliveryError::Transport { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_timeout_is_retryable() {
    // Accepts connections but never answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let silent = tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });

    let err = client(Some(Duration::from_millis(200)))
        .deliver(&format!("http://{}/cb", addr), &rejected_payload())
        .await
        .expect_err("Delivery should time out");

    assert!(matches!(err, DeliveryError::Transport { .. }));
    assert!(err.is_retryable());
    silent.abort();
}

#[tokio::test]
async fn test_invalid_action_is_not_retryable() {
    let err = client(None)
        .deliver("not a callback url", &rejected_payload())
        .await
        .expect_err("Delivery should fail");

    assert!(matches!(err, DeliveryError::InvalidAction { .. }));
    assert!(!err.is_retryable());
}
