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

//! Cryptographic utilities for case-state attestations.
//!
//! This module provides:
//! - Ed25519 key generation and loading from base64 configuration
//! - SHA-512 attestation digests
//! - Detached signing and verification
//! - Key fingerprint computation

mod signing;

pub use signing::{
    attestation_digest, compute_key_fingerprint, generate_signing_keypair, verify_signature,
    AttestationSigner, GeneratedKeypair, SigningError,
};
