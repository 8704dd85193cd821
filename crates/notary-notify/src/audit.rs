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

//! Structured logging for notification outcomes.
//!
//! Every outcome of a delivery attempt is logged with a stable `event_type`
//! and the fields needed to trace a notification through its retries:
//! `notification_id`, `case_id`, `action`, `retry_count` and, where relevant,
//! `retry_at`.

use chrono::{DateTime, Utc};

use crate::models::Notification;

/// Event types for notification outcomes.
pub mod events {
    /// The callback accepted the payload.
    pub const NOTIFICATION_DELIVERED: &str = "notification.delivered";
    /// A retryable failure was rescheduled.
    pub const NOTIFICATION_RETRY_SCHEDULED: &str = "notification.retry_scheduled";
    /// The notification was dropped without being delivered.
    pub const NOTIFICATION_ABANDONED: &str = "notification.abandoned";
    /// Persisting an outcome failed.
    pub const NOTIFICATION_STORE_FAILED: &str = "notification.store_failed";
    /// The due-set query failed and the pass was skipped.
    pub const PASS_FAILED: &str = "pass.failed";
}

/// Log a successful delivery.
pub fn log_delivered(notification: &Notification) {
    tracing::info!(
        event_type = events::NOTIFICATION_DELIVERED,
        notification_id = %notification.id,
        case_id = %notification.case_id,
        action = %notification.action,
        retry_count = notification.retry_count,
        "Notification delivered"
    );
}

/// Log a retryable failure and the time of the next attempt.
pub fn log_retry_scheduled(
    notification: &Notification,
    retry_count: u32,
    retry_at: DateTime<Utc>,
    error: &str,
) {
    tracing::warn!(
        event_type = events::NOTIFICATION_RETRY_SCHEDULED,
        notification_id = %notification.id,
        case_id = %notification.case_id,
        action = %notification.action,
        retry_count = retry_count,
        retry_at = %retry_at,
        error = %error,
        "Delivery failed, retry scheduled"
    );
}

/// Log a notification dropped without delivery.
pub fn log_abandoned(notification: &Notification, reason: &str) {
    tracing::error!(
        event_type = events::NOTIFICATION_ABANDONED,
        notification_id = %notification.id,
        case_id = %notification.case_id,
        action = %notification.action,
        retry_count = notification.retry_count,
        reason = %reason,
        "Notification abandoned"
    );
}

/// Log a failed store write or lookup for a single notification.
pub fn log_store_failed(notification: &Notification, operation: &str, error: &str) {
    tracing::error!(
        event_type = events::NOTIFICATION_STORE_FAILED,
        notification_id = %notification.id,
        case_id = %notification.case_id,
        operation = %operation,
        error = %error,
        "Notification store operation failed"
    );
}

/// Log a pass that could not load its due set.
pub fn log_pass_failed(error: &str) {
    tracing::error!(
        event_type = events::PASS_FAILED,
        error = %error,
        "Processing pass failed"
    );
}
