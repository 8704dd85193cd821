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

//! `reqwest` backed delivery client.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{Deliverer, DeliveryError};
use crate::attestation::NotificationPayload;
use crate::config::NotifierConfig;

/// Delivers payloads with an HTTP PUT and a JSON body.
///
/// The response body is never read; only the status code matters.
#[derive(Debug, Clone)]
pub struct HttpDeliveryClient {
    client: reqwest::Client,
}

impl HttpDeliveryClient {
    /// Creates a client with an optional per-request timeout.
    ///
    /// Without a timeout, requests are bounded only by the transport's own
    /// defaults.
    pub fn new(timeout: Option<Duration>, user_agent: &str) -> Result<Self, DeliveryError> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent.to_string());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(DeliveryError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Creates a client using the delivery settings of `config`.
    pub fn from_config(config: &NotifierConfig) -> Result<Self, DeliveryError> {
        Self::new(config.delivery_timeout(), config.user_agent())
    }

    fn parse_action(action: &str) -> Result<Url, DeliveryError> {
        let url = Url::parse(action).map_err(|e| DeliveryError::InvalidAction {
            action: action.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(DeliveryError::InvalidAction {
                action: action.to_string(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }
}

#[async_trait]
impl Deliverer for HttpDeliveryClient {
    async fn deliver(
        &self,
        action: &str,
        payload: &NotificationPayload,
    ) -> Result<(), DeliveryError> {
        let url = Self::parse_action(action)?;

        let response = self
            .client
            .put(url)
            .json(payload)
            .send()
            .await
            .map_err(|source| DeliveryError::Transport {
                action: action.to_string(),
                source,
            })?;

        let status = response.status();
        debug!(action = %action, status = status.as_u16(), "Callback responded");

        if status.as_u16() >= 400 {
            return Err(DeliveryError::Rejected {
                action: action.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
