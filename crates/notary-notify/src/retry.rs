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

//! Exponential backoff for failed deliveries.
//!
//! After the n-th failed attempt the next one is scheduled
//! `min(ceiling, base * 2^(n-1))` from now. With the default base of two
//! seconds this is `min(120, 2^n)` seconds: 2s, 4s, 8s, ... 64s, then 120s
//! forever.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::Notification;

/// What to do with a notification after a retryable failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Persist the new bookkeeping and try again at `retry_at`.
    Retry {
        /// Failed attempts so far, including this one
        retry_count: u32,
        /// Earliest time of the next attempt
        retry_at: DateTime<Utc>,
    },
    /// The attempt ceiling was reached; drop the notification.
    GiveUp {
        /// Failed attempts so far, including this one
        retry_count: u32,
    },
}

/// Backoff parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(120),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts = None` retries forever.
    pub fn new(base_delay: Duration, max_delay: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts,
        }
    }

    /// Delay before the attempt following the `retry_count`-th failure.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        if retry_count == 0 {
            return Duration::ZERO;
        }
        // Past 2^31 the ceiling has long been reached.
        let exponent = (retry_count - 1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Applies one failed attempt to the notification's bookkeeping.
    pub fn next_attempt(&self, retry_count: u32, now: DateTime<Utc>) -> RetryDecision {
        let retry_count = retry_count.saturating_add(1);

        if let Some(max_attempts) = self.max_attempts {
            if retry_count >= max_attempts {
                return RetryDecision::GiveUp { retry_count };
            }
        }

        let delay = chrono::Duration::from_std(self.delay_for(retry_count))
            .unwrap_or_else(|_| chrono::Duration::seconds(self.max_delay.as_secs() as i64));

        RetryDecision::Retry {
            retry_count,
            retry_at: now + delay,
        }
    }

    /// Applies the decision to a notification, returning the updated copy to
    /// persist, or `None` when the notification should be dropped.
    pub fn reschedule(&self, notification: &Notification, now: DateTime<Utc>) -> Option<Notification> {
        match self.next_attempt(notification.retry_count, now) {
            RetryDecision::Retry {
                retry_count,
                retry_at,
            } => {
                let mut updated = notification.clone();
                updated.retry_count = retry_count;
                updated.retry_at = Some(retry_at);
                Some(updated)
            }
            RetryDecision::GiveUp { .. } => None,
        }
    }

    /// Upper bound on any single delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Attempt ceiling, if any.
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}
