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

//! Daemon settings loaded from an optional TOML file.
//!
//! Every key is optional; missing keys fall back to the engine defaults.
//! Command-line flags and environment variables override the file. Key
//! material is never read from the file.
//!
//! ```toml
//! database_url = "sqlite:///var/lib/notary/notary.db"
//! processing_interval_ms = 1000
//! retry_base_delay_secs = 2
//! retry_max_delay_secs = 120
//! max_attempts = 500
//! max_concurrent_deliveries = 64
//! delivery_timeout_secs = 30
//! user_agent = "notary/1.0"
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use notary_notify::{ConfigError, NotifierConfig};
use serde::Deserialize;

/// Contents of the settings file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub database_url: Option<String>,
    pub processing_interval_ms: Option<u64>,
    pub retry_base_delay_secs: Option<u64>,
    pub retry_max_delay_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub max_concurrent_deliveries: Option<usize>,
    pub delivery_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl Settings {
    /// Reads and parses a settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Builds the engine configuration, preferring `interval_override` to
    /// the file's processing interval.
    pub fn notifier_config(
        &self,
        interval_override: Option<u64>,
    ) -> Result<NotifierConfig, ConfigError> {
        let mut builder = NotifierConfig::builder();

        if let Some(ms) = interval_override.or(self.processing_interval_ms) {
            builder = builder.processing_interval(Duration::from_millis(ms));
        }
        if let Some(secs) = self.retry_base_delay_secs {
            builder = builder.retry_base_delay(Duration::from_secs(secs));
        }
        if let Some(secs) = self.retry_max_delay_secs {
            builder = builder.retry_max_delay(Duration::from_secs(secs));
        }
        if self.max_attempts.is_some() {
            builder = builder.max_attempts(self.max_attempts);
        }
        if let Some(count) = self.max_concurrent_deliveries {
            builder = builder.max_concurrent_deliveries(count);
        }
        if let Some(secs) = self.delivery_timeout_secs {
            builder = builder.delivery_timeout(Some(Duration::from_secs(secs)));
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        builder.build()
    }
}
