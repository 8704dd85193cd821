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

//! Ed25519 signing utilities for case-state attestations.
//!
//! Provides functions for:
//! - Generating Ed25519 signing keypairs
//! - Loading the engine's keypair from base64 configuration
//! - Computing SHA-512 attestation digests
//! - Signing and verifying digests

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256, Sha512};
use thiserror::Error;

/// Errors that can occur during signing operations.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Invalid private key: expected 32 or 64 bytes, got {0}")]
    InvalidPrivateKeyLength(usize),

    #[error("Invalid public key: expected 32 bytes, got {0}")]
    InvalidPublicKeyLength(usize),

    #[error("Invalid signature: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    #[error("Invalid base64 in {field}: {reason}")]
    InvalidEncoding { field: &'static str, reason: String },

    #[error("Failed to create signing key: {0}")]
    KeyCreationFailed(String),

    #[error("Configured public key does not match the secret key")]
    KeyPairMismatch,

    #[error("Signature verification failed")]
    VerificationFailed,
}

/// A generated Ed25519 keypair.
pub struct GeneratedKeypair {
    /// The 32-byte private key seed
    pub private_key: Vec<u8>,
    /// The 32-byte public key
    pub public_key: Vec<u8>,
    /// SHA256 hex fingerprint of the public key
    pub fingerprint: String,
}

impl GeneratedKeypair {
    /// Base64 encoding of the private key seed, as accepted in configuration.
    pub fn private_key_base64(&self) -> String {
        BASE64.encode(&self.private_key)
    }

    /// Base64 encoding of the public key, as accepted in configuration.
    pub fn public_key_base64(&self) -> String {
        BASE64.encode(&self.public_key)
    }
}

/// Generates a new Ed25519 signing keypair.
pub fn generate_signing_keypair() -> GeneratedKeypair {
    let mut csprng = rand::thread_rng();
    let signing_key = SigningKey::generate(&mut csprng);
    let verifying_key = signing_key.verifying_key();

    let public_key_bytes = verifying_key.to_bytes();
    let fingerprint = compute_key_fingerprint(&public_key_bytes);

    GeneratedKeypair {
        private_key: signing_key.to_bytes().to_vec(),
        public_key: public_key_bytes.to_vec(),
        fingerprint,
    }
}

/// Computes the SHA256 hex fingerprint of a public key.
///
/// Used to identify the engine key in logs without exposing key material.
pub fn compute_key_fingerprint(public_key: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(public_key);
    hex::encode(hasher.finalize())
}

/// Computes the attestation digest of a canonical message.
///
/// The digest is the base64 encoding of the SHA-512 hash of `message`. The
/// base64 string itself (not the raw hash) is what gets signed.
pub fn attestation_digest(message: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(message.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Verifies a detached signature using an Ed25519 public key.
///
/// # Errors
///
/// Returns `SigningError` if the inputs are malformed or verification fails.
pub fn verify_signature(
    digest: &[u8],
    signature: &[u8],
    public_key: &[u8],
) -> Result<(), SigningError> {
    let key_bytes: [u8; 32] = public_key
        .try_into()
        .map_err(|_| SigningError::InvalidPublicKeyLength(public_key.len()))?;

    let sig_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| SigningError::InvalidSignatureLength(signature.len()))?;

    let verifying_key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| SigningError::KeyCreationFailed(e.to_string()))?;

    let sig = Signature::from_bytes(&sig_bytes);

    verifying_key
        .verify(digest, &sig)
        .map_err(|_| SigningError::VerificationFailed)
}

fn signing_key_from_bytes(private_key: &[u8]) -> Result<SigningKey, SigningError> {
    match private_key.len() {
        32 => {
            let seed: [u8; 32] = private_key
                .try_into()
                .map_err(|_| SigningError::InvalidPrivateKeyLength(private_key.len()))?;
            Ok(SigningKey::from_bytes(&seed))
        }
        64 => {
            let keypair: [u8; 64] = private_key
                .try_into()
                .map_err(|_| SigningError::InvalidPrivateKeyLength(private_key.len()))?;
            SigningKey::from_keypair_bytes(&keypair)
                .map_err(|e| SigningError::KeyCreationFailed(e.to_string()))
        }
        other => Err(SigningError::InvalidPrivateKeyLength(other)),
    }
}

fn decode_base64(field: &'static str, value: &str) -> Result<Vec<u8>, SigningError> {
    BASE64
        .decode(value.trim())
        .map_err(|e| SigningError::InvalidEncoding {
            field,
            reason: e.to_string(),
        })
}

/// The engine's process-wide attestation key.
///
/// Loaded once at startup and shared read-only between processing passes.
#[derive(Clone)]
pub struct AttestationSigner {
    signing_key: SigningKey,
    fingerprint: String,
}

impl std::fmt::Debug for AttestationSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttestationSigner")
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

impl AttestationSigner {
    /// Loads the signer from the configured `{public, secret}` pair.
    ///
    /// The secret may be a 32-byte seed or a 64-byte seed-plus-public key.
    /// The public key must match the one derived from the secret.
    pub fn from_base64(public_key: &str, secret_key: &str) -> Result<Self, SigningError> {
        let secret = decode_base64("secret key", secret_key)?;
        let public = decode_base64("public key", public_key)?;

        if public.len() != 32 {
            return Err(SigningError::InvalidPublicKeyLength(public.len()));
        }

        let signing_key = signing_key_from_bytes(&secret)?;
        if signing_key.verifying_key().as_bytes().as_slice() != public.as_slice() {
            return Err(SigningError::KeyPairMismatch);
        }

        Ok(Self::from_signing_key(signing_key))
    }

    /// Builds a signer from a freshly generated keypair.
    pub fn from_keypair(keypair: &GeneratedKeypair) -> Result<Self, SigningError> {
        Ok(Self::from_signing_key(signing_key_from_bytes(
            &keypair.private_key,
        )?))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let fingerprint = compute_key_fingerprint(signing_key.verifying_key().as_bytes());
        Self {
            signing_key,
            fingerprint,
        }
    }

    /// Signs `message` and returns the base64 encoded detached signature.
    pub fn sign(&self, message: &[u8]) -> String {
        BASE64.encode(self.signing_key.sign(message).to_bytes())
    }

    /// The raw 32-byte public key.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Base64 encoding of the public key.
    pub fn public_key_base64(&self) -> String {
        BASE64.encode(self.public_key())
    }

    /// SHA256 hex fingerprint of the public key.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}
