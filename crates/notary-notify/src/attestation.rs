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

//! Case-state attestations.
//!
//! An attestation proves that a case reached a specific final state. It is
//! built in three steps:
//!
//! 1. A canonical URN `urn:notary:<external_id>:<state>`
//! 2. The base64 SHA-512 digest of that URN
//! 3. A detached Ed25519 signature over the digest string
//!
//! The signed attestation becomes the body of every outbound notification:
//!
//! ```json
//! { "execution_condition_fulfillment": {
//!     "type": "and",
//!     "subfulfillments": [
//!       { "type": "ed25519-sha512", "signature": "..." },
//!       <case execution fulfillment>
//!     ] } }
//! ```
//!
//! or, for rejected cases,
//!
//! ```json
//! { "cancellation_condition_fulfillment": { "type": "ed25519-sha512", "signature": "..." } }
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::crypto::{attestation_digest, verify_signature, AttestationSigner, SigningError};
use crate::models::{Case, CaseState};

/// Namespace prefix of the canonical attestation URN.
pub const ATTESTATION_NAMESPACE: &str = "urn:notary";

/// Fulfillment type tag of the engine's signed attestation.
pub const SIGNED_ATTESTATION_TYPE: &str = "ed25519-sha512";

/// Errors raised while building or checking an attestation.
///
/// Every variant is non-retryable.
#[derive(Debug, Error)]
pub enum AttestationError {
    /// The case has not reached a terminal state.
    #[error("Case {case_id} is not finalized (state: {state})")]
    NotFinalized { case_id: Uuid, state: CaseState },

    /// An executed case carries no execution fulfillment to combine with.
    #[error("Executed case {case_id} has no execution condition fulfillment")]
    MissingExecutionFulfillment { case_id: Uuid },

    /// A fulfillment did not contain a signed attestation.
    #[error("Fulfillment does not contain an ed25519-sha512 attestation")]
    MissingSignature,

    /// Signature decoding or verification failed.
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The signed attestation could not be encoded as JSON.
    #[error("Failed to encode attestation: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// A cryptographic proof object presented to a callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Fulfillment {
    /// The engine's detached signature over the attestation digest.
    #[serde(rename = "ed25519-sha512")]
    Ed25519Sha512 {
        /// Base64 encoded 64-byte signature
        signature: String,
    },
    /// All subfulfillments must hold.
    #[serde(rename = "and")]
    And {
        /// Component proofs; the case's own fulfillment is kept verbatim
        subfulfillments: Vec<Value>,
    },
}

/// The body of one outbound notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotificationPayload {
    /// Sent for executed cases.
    #[serde(rename = "execution_condition_fulfillment")]
    Execution(Fulfillment),
    /// Sent for rejected cases.
    #[serde(rename = "cancellation_condition_fulfillment")]
    Cancellation(Fulfillment),
}

impl NotificationPayload {
    /// The fulfillment carried by the payload, whichever key it sits under.
    pub fn fulfillment(&self) -> &Fulfillment {
        match self {
            NotificationPayload::Execution(f) | NotificationPayload::Cancellation(f) => f,
        }
    }
}

/// Canonical attestation string for a case state.
pub fn canonical_attestation(external_id: &str, state: CaseState) -> String {
    format!("{}:{}:{}", ATTESTATION_NAMESPACE, external_id, state.as_str())
}

/// Signs the canonical attestation for `external_id` in `state`.
pub fn sign_attestation(
    signer: &AttestationSigner,
    external_id: &str,
    state: CaseState,
) -> Fulfillment {
    let digest = attestation_digest(&canonical_attestation(external_id, state));
    Fulfillment::Ed25519Sha512 {
        signature: signer.sign(digest.as_bytes()),
    }
}

/// Builds the outbound payload for a case.
///
/// # Errors
///
/// Returns [`AttestationError::NotFinalized`] for pending cases and
/// [`AttestationError::MissingExecutionFulfillment`] for executed cases that
/// carry no fulfillment. Neither is worth retrying.
pub fn build_payload(
    case: &Case,
    signer: &AttestationSigner,
) -> Result<NotificationPayload, AttestationError> {
    match case.state {
        CaseState::Executed => {
            let case_fulfillment = case.execution_condition_fulfillment.clone().ok_or(
                AttestationError::MissingExecutionFulfillment { case_id: case.id },
            )?;
            let signed = signed_attestation_value(signer, &case.external_id, case.state)?;
            Ok(NotificationPayload::Execution(Fulfillment::And {
                subfulfillments: vec![signed, case_fulfillment],
            }))
        }
        CaseState::Rejected => Ok(NotificationPayload::Cancellation(sign_attestation(
            signer,
            &case.external_id,
            case.state,
        ))),
        CaseState::Pending => Err(AttestationError::NotFinalized {
            case_id: case.id,
            state: case.state,
        }),
    }
}

fn signed_attestation_value(
    signer: &AttestationSigner,
    external_id: &str,
    state: CaseState,
) -> Result<Value, AttestationError> {
    Ok(serde_json::to_value(sign_attestation(
        signer,
        external_id,
        state,
    ))?)
}

/// Verifies that `fulfillment` carries a valid engine attestation for
/// `external_id` in `state`.
///
/// Accepts either a bare signed attestation or an `and` combination whose
/// subfulfillments include one.
pub fn verify_attestation(
    external_id: &str,
    state: CaseState,
    fulfillment: &Fulfillment,
    public_key: &[u8],
) -> Result<(), AttestationError> {
    let signature = find_signature(fulfillment).ok_or(AttestationError::MissingSignature)?;
    let signature = BASE64
        .decode(signature)
        .map_err(|e| SigningError::InvalidEncoding {
            field: "signature",
            reason: e.to_string(),
        })?;

    let digest = attestation_digest(&canonical_attestation(external_id, state));
    verify_signature(digest.as_bytes(), &signature, public_key)?;
    Ok(())
}

fn find_signature(fulfillment: &Fulfillment) -> Option<String> {
    match fulfillment {
        Fulfillment::Ed25519Sha512 { signature } => Some(signature.clone()),
        Fulfillment::And { subfulfillments } => subfulfillments
            .iter()
            .filter_map(|value| serde_json::from_value::<Fulfillment>(value.clone()).ok())
            .find_map(|inner| find_signature(&inner)),
    }
}
