// ABOUTME: Secret codec for refresh secrets: AES-256-GCM with AAD row binding
// ABOUTME: Recovers cleartext secrets from encrypted or legacy plaintext storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck

use crate::errors::{AppError, AppResult};
use crate::models::RefreshSecret;
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use uuid::Uuid;
use zeroize::Zeroize;

/// Ciphertext layout: 12-byte nonce followed by ciphertext+tag
const NONCE_LEN: usize = 12;

/// Secret recovery failures
///
/// `DecryptionFailed` and `NoRefreshSecret` are reported distinctly:
/// the former points at configuration or data corruption, the latter at a
/// credential that was issued without a refresh secret. Neither is
/// automatically recoverable.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The encrypted secret could not be decrypted (wrong key, AAD
    /// mismatch, or tampered data)
    #[error("Refresh secret decryption failed: {0}")]
    DecryptionFailed(String),

    /// The credential holds neither an encrypted nor a plaintext secret
    #[error("Credential has no refresh secret")]
    NoRefreshSecret,
}

/// AAD context binding a ciphertext to its row
///
/// The same context must be presented at decryption time, so ciphertext
/// cannot be moved between users or providers.
#[must_use]
pub fn credential_aad(user_id: Uuid, provider: &str) -> String {
    format!("{user_id}|{provider}|provider_credentials")
}

/// Generate a fresh 32-byte master key for operational setup
///
/// The result is handed to deployment tooling base64-encoded via
/// [`encode_master_key`].
#[must_use]
pub fn generate_master_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    key
}

/// Base64-encode a master key for storage in configuration
#[must_use]
pub fn encode_master_key(key: &[u8; 32]) -> String {
    general_purpose::STANDARD.encode(key)
}

/// Process-wide symmetric cipher for refresh secrets
///
/// Holds the 32-byte master key sourced from configuration. Every
/// encryption uses a fresh random nonce; output is
/// base64(nonce || ciphertext || tag).
pub struct SecretCipher {
    key: [u8; 32],
    rng: SystemRandom,
}

impl SecretCipher {
    /// Create a cipher from the configured master key
    #[must_use]
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            key,
            rng: SystemRandom::new(),
        }
    }

    /// Encrypt a secret with AAD binding
    ///
    /// Used by the initial-grant flow when writing new credential rows.
    ///
    /// # Errors
    ///
    /// Returns an error if nonce generation or encryption fails.
    pub fn encrypt_with_aad(&self, secret: &str, aad_context: &str) -> AppResult<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|e| AppError::internal(format!("Failed to generate nonce: {e}")))?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let unbound_key = UnboundKey::new(&AES_256_GCM, &self.key)
            .map_err(|e| AppError::internal(format!("Failed to create encryption key: {e}")))?;
        let key = LessSafeKey::new(unbound_key);

        let mut data_bytes = secret.as_bytes().to_vec();
        let aad = Aad::from(aad_context.as_bytes());
        key.seal_in_place_append_tag(nonce, aad, &mut data_bytes)
            .map_err(|e| AppError::internal(format!("Failed to encrypt secret: {e}")))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(data_bytes);

        Ok(general_purpose::STANDARD.encode(combined))
    }

    /// Decrypt an encrypted secret, verifying its AAD binding
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::DecryptionFailed`] if the payload is
    /// malformed, the key is wrong, or the AAD context does not match.
    pub fn decrypt_with_aad(
        &self,
        encrypted: &str,
        aad_context: &str,
    ) -> Result<String, SecretError> {
        let combined = general_purpose::STANDARD
            .decode(encrypted)
            .map_err(|e| SecretError::DecryptionFailed(format!("invalid base64: {e}")))?;

        if combined.len() < NONCE_LEN {
            return Err(SecretError::DecryptionFailed(
                "ciphertext too short".to_owned(),
            ));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::assume_unique_for_key(
            nonce_bytes
                .try_into()
                .map_err(|_| SecretError::DecryptionFailed("invalid nonce".to_owned()))?,
        );

        let unbound_key = UnboundKey::new(&AES_256_GCM, &self.key)
            .map_err(|e| SecretError::DecryptionFailed(format!("key setup failed: {e}")))?;
        let key = LessSafeKey::new(unbound_key);

        let mut plaintext = ciphertext.to_vec();
        let aad = Aad::from(aad_context.as_bytes());
        let decrypted = key
            .open_in_place(nonce, aad, &mut plaintext)
            .map_err(|_| {
                SecretError::DecryptionFailed(
                    "authentication failed (possible AAD mismatch or tampered data)".to_owned(),
                )
            })?
            .to_vec();
        plaintext.zeroize();

        String::from_utf8(decrypted)
            .map_err(|e| SecretError::DecryptionFailed(format!("not valid UTF-8: {e}")))
    }
}

impl Drop for SecretCipher {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl RefreshSecret {
    /// Recover the cleartext refresh secret for a credential
    ///
    /// The encrypted variant decrypts under the row's AAD context; the
    /// legacy plaintext variant is returned directly and must keep working
    /// until a data migration removes all plaintext rows.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::DecryptionFailed`] for an undecryptable
    /// encrypted secret and [`SecretError::NoRefreshSecret`] when the
    /// credential holds no secret at all.
    pub fn recover(
        &self,
        cipher: &SecretCipher,
        user_id: Uuid,
        provider: &str,
    ) -> Result<String, SecretError> {
        match self {
            Self::Encrypted(ciphertext) => {
                cipher.decrypt_with_aad(ciphertext, &credential_aad(user_id, provider))
            }
            Self::Plaintext(secret) => Ok(secret.clone()),
            Self::Absent => Err(SecretError::NoRefreshSecret),
        }
    }
}
