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

//! Outbound delivery of notification payloads.
//!
//! A [`Deliverer`] sends one payload to one callback URL and reports either
//! success or a [`DeliveryError`]. Classification of the error decides what the
//! processor does next:
//!
//! | Outcome                          | Retryable |
//! |----------------------------------|-----------|
//! | HTTP status < 400                | success   |
//! | HTTP status >= 400               | yes       |
//! | connection error, timeout        | yes       |
//! | callback URL cannot be parsed    | no        |

mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::attestation::NotificationPayload;

pub use http::HttpDeliveryClient;

/// Errors raised while delivering a payload.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The request never produced a response.
    #[error("Transport error delivering to {action}: {source}")]
    Transport {
        action: String,
        #[source]
        source: reqwest::Error,
    },

    /// The callback answered with an error status.
    #[error("Callback {action} responded with status {status}")]
    Rejected { action: String, status: u16 },

    /// The callback URL is not a usable HTTP(S) URL.
    #[error("Invalid callback URL '{action}': {reason}")]
    InvalidAction { action: String, reason: String },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl DeliveryError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeliveryError::Transport { .. } | DeliveryError::Rejected { .. }
        )
    }
}

/// Sends one payload to one callback.
#[async_trait]
pub trait Deliverer: Send + Sync {
    /// PUTs `payload` to `action`. `Ok` means the callback accepted it.
    async fn deliver(&self, action: &str, payload: &NotificationPayload)
        -> Result<(), DeliveryError>;
}
