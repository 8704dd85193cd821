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

//! Processing passes over due notifications.
//!
//! One pass loads every due notification and handles each independently:
//!
//! ```text
//! get_case ──► build_payload ──► deliver ──► delete          (accepted)
//!    │              │               │
//!    │              │               └──────► save retry_at   (retryable)
//!    │              │                        delete          (attempt ceiling)
//!    │              └──────────────────────► delete          (not finalized)
//!    └─────────────────────────────────────► leave in place  (store error)
//! ```
//!
//! Per-notification failures are contained in the pass. Only a failure to
//! load the due set fails the pass as a whole.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::attestation::build_payload;
use crate::audit;
use crate::config::NotifierConfig;
use crate::crypto::AttestationSigner;
use crate::delivery::Deliverer;
use crate::error::StoreError;
use crate::models::Notification;
use crate::retry::RetryPolicy;
use crate::store::NotificationStore;

/// Counts of what happened during one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Notifications that were due when the pass started
    pub due: usize,
    /// Accepted by their callback and removed
    pub delivered: usize,
    /// Failed with a retryable error and saved for later
    pub rescheduled: usize,
    /// Removed without being delivered
    pub abandoned: usize,
    /// Left untouched because the store failed
    pub failed: usize,
}

impl PassSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Delivered => self.delivered += 1,
            Outcome::Rescheduled => self.rescheduled += 1,
            Outcome::Abandoned => self.abandoned += 1,
            Outcome::Failed => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Delivered,
    Rescheduled,
    Abandoned,
    Failed,
}

/// One unit of scheduled work.
#[async_trait]
pub trait ProcessingPass: Send + Sync {
    /// Runs a single pass to completion.
    async fn run_pass(&self) -> Result<PassSummary, StoreError>;
}

/// Delivers due notifications and records their outcomes.
pub struct NotificationProcessor {
    store: Arc<dyn NotificationStore>,
    deliverer: Arc<dyn Deliverer>,
    signer: Arc<AttestationSigner>,
    retry: RetryPolicy,
    max_concurrent: usize,
}

impl NotificationProcessor {
    /// Creates a processor.
    pub fn new(
        store: Arc<dyn NotificationStore>,
        deliverer: Arc<dyn Deliverer>,
        signer: Arc<AttestationSigner>,
        config: &NotifierConfig,
    ) -> Self {
        Self {
            store,
            deliverer,
            signer,
            retry: config.retry_policy(),
            max_concurrent: config.max_concurrent_deliveries().max(1),
        }
    }

    /// Handles every notification due at `now`.
    ///
    /// Backoff for failed attempts is measured from `now` as well.
    ///
    /// Returns only after each attempt has been delivered or failed and its
    /// outcome persisted.
    pub async fn process_due(&self, now: DateTime<Utc>) -> Result<PassSummary, StoreError> {
        let due = self.store.find_due(now).await?;

        let mut summary = PassSummary {
            due: due.len(),
            ..PassSummary::default()
        };
        if due.is_empty() {
            return Ok(summary);
        }

        debug!(due = summary.due, "Processing due notifications");

        let outcomes: Vec<Outcome> = stream::iter(due)
            .map(|notification| self.process_one(notification, now))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        for outcome in outcomes {
            summary.record(outcome);
        }

        debug!(
            delivered = summary.delivered,
            rescheduled = summary.rescheduled,
            abandoned = summary.abandoned,
            failed = summary.failed,
            "Processing pass complete"
        );
        Ok(summary)
    }

    async fn process_one(&self, notification: Notification, now: DateTime<Utc>) -> Outcome {
        let case = match self.store.get_case(&notification).await {
            Ok(case) => case,
            Err(StoreError::CaseNotFound(_)) => {
                return self.abandon(&notification, "case does not exist").await;
            }
            Err(e) => {
                audit::log_store_failed(&notification, "get_case", &e.to_string());
                return Outcome::Failed;
            }
        };

        let payload = match build_payload(&case, &self.signer) {
            Ok(payload) => payload,
            Err(e) => return self.abandon(&notification, &e.to_string()).await,
        };

        match self.deliverer.deliver(&notification.action, &payload).await {
            Ok(()) => match self.store.delete(&notification).await {
                Ok(()) => {
                    metrics::counter!("notary_notifications_delivered_total").increment(1);
                    audit::log_delivered(&notification);
                    Outcome::Delivered
                }
                Err(e) => {
                    audit::log_store_failed(&notification, "delete", &e.to_string());
                    Outcome::Failed
                }
            },
            Err(e) if e.is_retryable() => {
                self.reschedule(&notification, &e.to_string(), now).await
            }
            Err(e) => self.abandon(&notification, &e.to_string()).await,
        }
    }

    async fn reschedule(
        &self,
        notification: &Notification,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Outcome {
        let Some(updated) = self.retry.reschedule(notification, now) else {
            return self.abandon(notification, "attempt ceiling reached").await;
        };

        if let Err(e) = self.store.save(&updated).await {
            audit::log_store_failed(notification, "save", &e.to_string());
            return Outcome::Failed;
        }

        metrics::counter!("notary_notifications_retried_total").increment(1);
        if let Some(retry_at) = updated.retry_at {
            audit::log_retry_scheduled(&updated, updated.retry_count, retry_at, reason);
        }
        Outcome::Rescheduled
    }

    async fn abandon(&self, notification: &Notification, reason: &str) -> Outcome {
        if let Err(e) = self.store.delete(notification).await {
            audit::log_store_failed(notification, "delete", &e.to_string());
            return Outcome::Failed;
        }
        metrics::counter!("notary_notifications_abandoned_total").increment(1);
        audit::log_abandoned(notification, reason);
        Outcome::Abandoned
    }
}

#[async_trait]
impl ProcessingPass for NotificationProcessor {
    async fn run_pass(&self) -> Result<PassSummary, StoreError> {
        metrics::counter!("notary_notification_passes_total").increment(1);
        self.process_due(Utc::now()).await
    }
}
