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

//! Configuration for the notification engine.
//!
//! Use [`NotifierConfig::builder()`] to create a configuration:
//!
//! ```rust
//! use std::time::Duration;
//! use notary_notify::NotifierConfig;
//!
//! let config = NotifierConfig::builder()
//!     .processing_interval(Duration::from_millis(500))
//!     .max_attempts(Some(50))
//!     .build()
//!     .unwrap();
//! assert_eq!(config.processing_interval(), Duration::from_millis(500));
//! ```

use std::time::Duration;

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

/// Default `User-Agent` for outbound deliveries.
pub const DEFAULT_USER_AGENT: &str = concat!("notary-notify/", env!("CARGO_PKG_VERSION"));

/// Settings for the scheduler, processor and delivery client.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct NotifierConfig {
    processing_interval: Duration,
    retry_base_delay: Duration,
    retry_max_delay: Duration,
    max_attempts: Option<u32>,
    max_concurrent_deliveries: usize,
    delivery_timeout: Option<Duration>,
    user_agent: String,
}

impl NotifierConfig {
    /// Creates a new configuration builder with default values.
    pub fn builder() -> NotifierConfigBuilder {
        NotifierConfigBuilder::default()
    }

    /// Time between the end of one pass and the start of the next.
    pub fn processing_interval(&self) -> Duration {
        self.processing_interval
    }

    /// Delay after the first failed attempt.
    pub fn retry_base_delay(&self) -> Duration {
        self.retry_base_delay
    }

    /// Upper bound on any retry delay.
    pub fn retry_max_delay(&self) -> Duration {
        self.retry_max_delay
    }

    /// Failed attempts after which a notification is abandoned.
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Deliveries in flight at once within a pass.
    pub fn max_concurrent_deliveries(&self) -> usize {
        self.max_concurrent_deliveries
    }

    /// Per-request timeout for outbound deliveries.
    pub fn delivery_timeout(&self) -> Option<Duration> {
        self.delivery_timeout
    }

    /// `User-Agent` header sent with every delivery.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Backoff policy derived from the retry settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_base_delay,
            self.retry_max_delay,
            self.max_attempts,
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.processing_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("processing_interval"));
        }
        if self.retry_base_delay.is_zero() {
            return Err(ConfigError::ZeroDuration("retry_base_delay"));
        }
        if self.retry_max_delay < self.retry_base_delay {
            return Err(ConfigError::CeilingBelowBase {
                ceiling_secs: self.retry_max_delay.as_secs(),
                base_secs: self.retry_base_delay.as_secs(),
            });
        }
        if self.max_attempts == Some(0) {
            return Err(ConfigError::ZeroCount("max_attempts"));
        }
        if self.max_concurrent_deliveries == 0 {
            return Err(ConfigError::ZeroCount("max_concurrent_deliveries"));
        }
        if self.delivery_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroDuration("delivery_timeout"));
        }
        Ok(())
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        NotifierConfigBuilder::default().config
    }
}

/// Builder for [`NotifierConfig`].
#[derive(Debug, Clone)]
pub struct NotifierConfigBuilder {
    config: NotifierConfig,
}

impl Default for NotifierConfigBuilder {
    fn default() -> Self {
        Self {
            config: NotifierConfig {
                processing_interval: Duration::from_millis(1000),
                retry_base_delay: Duration::from_secs(2),
                retry_max_delay: Duration::from_secs(120),
                max_attempts: None,
                max_concurrent_deliveries: 256,
                delivery_timeout: None,
                user_agent: DEFAULT_USER_AGENT.to_string(),
            },
        }
    }
}

impl NotifierConfigBuilder {
    /// Sets the processing interval.
    pub fn processing_interval(mut self, value: Duration) -> Self {
        self.config.processing_interval = value;
        self
    }

    /// Sets the delay after the first failed attempt.
    pub fn retry_base_delay(mut self, value: Duration) -> Self {
        self.config.retry_base_delay = value;
        self
    }

    /// Sets the retry delay ceiling.
    pub fn retry_max_delay(mut self, value: Duration) -> Self {
        self.config.retry_max_delay = value;
        self
    }

    /// Sets the attempt ceiling. `None` retries forever.
    pub fn max_attempts(mut self, value: Option<u32>) -> Self {
        self.config.max_attempts = value;
        self
    }

    /// Sets the number of deliveries in flight at once.
    pub fn max_concurrent_deliveries(mut self, value: usize) -> Self {
        self.config.max_concurrent_deliveries = value;
        self
    }

    /// Sets the per-request delivery timeout.
    pub fn delivery_timeout(mut self, value: Option<Duration>) -> Self {
        self.config.delivery_timeout = value;
        self
    }

    /// Sets the `User-Agent` header.
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.user_agent = value.into();
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<NotifierConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
