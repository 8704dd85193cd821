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

//! # notary-notify
//!
//! Delivers signed case outcomes to registered callback URLs, retrying failed
//! deliveries with capped exponential backoff until they succeed.
//!
//! When a case is finalized as `executed` or `rejected`, one [`Notification`]
//! is queued per callback action in the same transaction as the case write.
//! A [`QueueScheduler`] then drives [`NotificationProcessor`] passes: every
//! due notification gets a freshly signed attestation PUT to its action.
//! Accepted notifications are deleted; failed ones are rescheduled
//! `min(120, 2^n)` seconds out.
//!
//! ## Components
//!
//! | Module          | Role                                                  |
//! |-----------------|-------------------------------------------------------|
//! | [`attestation`] | builds and verifies the signed payload                |
//! | [`delivery`]    | HTTP PUT and outcome classification                   |
//! | [`retry`]       | backoff schedule                                      |
//! | [`queuer`]      | transactional enqueue                                 |
//! | [`store`]       | store trait and in-memory store                       |
//! | [`dal`]         | SQLite store via diesel                               |
//! | [`processor`]   | one processing pass                                   |
//! | [`scheduler`]   | start/stop lifecycle and polling                      |
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use notary_notify::{
//!     AttestationSigner, Database, HttpDeliveryClient, NotificationProcessor,
//!     NotifierConfig, QueueScheduler, DAL,
//! };
//!
//! # async fn run(public_key: &str, secret_key: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let config = NotifierConfig::default();
//! let database = Database::new("sqlite://notary.db")?;
//! database.run_migrations().await?;
//!
//! let processor = NotificationProcessor::new(
//!     Arc::new(DAL::new(database)),
//!     Arc::new(HttpDeliveryClient::from_config(&config)?),
//!     Arc::new(AttestationSigner::from_base64(public_key, secret_key)?),
//!     &config,
//! );
//! let scheduler = QueueScheduler::new(Arc::new(processor), &config);
//! scheduler.start();
//! # Ok(())
//! # }
//! ```

pub mod attestation;
pub mod audit;
pub mod config;
pub mod crypto;
pub mod dal;
pub mod database;
pub mod delivery;
pub mod error;
pub mod models;
pub mod processor;
pub mod queuer;
pub mod retry;
pub mod scheduler;
pub mod store;

pub use attestation::{
    build_payload, verify_attestation, AttestationError, Fulfillment, NotificationPayload,
};
pub use config::{NotifierConfig, NotifierConfigBuilder};
pub use crypto::{generate_signing_keypair, AttestationSigner, GeneratedKeypair, SigningError};
pub use dal::DAL;
pub use database::Database;
pub use delivery::{Deliverer, DeliveryError, HttpDeliveryClient};
pub use error::{ConfigError, StoreError};
pub use models::{Case, CaseState, Notification};
pub use processor::{NotificationProcessor, PassSummary, ProcessingPass};
pub use queuer::NotificationQueuer;
pub use retry::{RetryDecision, RetryPolicy};
pub use scheduler::QueueScheduler;
pub use store::{MemoryStore, NotificationStore};
