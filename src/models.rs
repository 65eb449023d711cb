// ABOUTME: Core data models for provider credentials
// ABOUTME: Credential entity, tagged refresh secret variant, and connection listing types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Natural key of a credential: one credential per (user, provider) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialKey {
    /// Opaque tenant identifier
    pub user_id: Uuid,
    /// Provider name key (e.g. "google")
    pub provider: String,
}

impl CredentialKey {
    /// Create a key from its parts
    pub fn new(user_id: Uuid, provider: impl Into<String>) -> Self {
        Self {
            user_id,
            provider: provider.into(),
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.provider)
    }
}

/// Long-lived secret used to obtain new access tokens
///
/// Stored rows carry two nullable columns (encrypted and legacy plaintext);
/// this enum is constructed in exactly one place (row mapping) so the
/// "encrypted wins" rule is structural rather than a convention repeated at
/// every call site. Rows predating encryption keep working through the
/// `Plaintext` variant until a data migration retires them.
#[derive(Clone, PartialEq, Eq)]
pub enum RefreshSecret {
    /// Base64(nonce || AES-256-GCM ciphertext), AAD-bound to its row
    Encrypted(String),
    /// Legacy cleartext secret from rows predating encryption
    Plaintext(String),
    /// No secret stored: the credential can never be refreshed again
    Absent,
}

impl RefreshSecret {
    /// Map the two nullable storage columns onto the tagged variant
    ///
    /// The encrypted column takes priority when both happen to be populated,
    /// so a stale plaintext copy is never trusted over the authoritative
    /// encrypted one. Empty strings count as absent.
    #[must_use]
    pub fn from_columns(encrypted: Option<String>, plaintext: Option<String>) -> Self {
        match (
            encrypted.filter(|s| !s.is_empty()),
            plaintext.filter(|s| !s.is_empty()),
        ) {
            (Some(enc), _) => Self::Encrypted(enc),
            (None, Some(plain)) => Self::Plaintext(plain),
            (None, None) => Self::Absent,
        }
    }
}

// Secret material must never reach logs; Debug shows the variant only.
impl fmt::Debug for RefreshSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encrypted(_) => write!(f, "RefreshSecret::Encrypted(..)"),
            Self::Plaintext(_) => write!(f, "RefreshSecret::Plaintext(..)"),
            Self::Absent => write!(f, "RefreshSecret::Absent"),
        }
    }
}

/// A stored provider credential
#[derive(Clone)]
pub struct Credential {
    /// User this credential belongs to
    pub user_id: Uuid,
    /// OAuth provider name key
    pub provider: String,
    /// Current bearer token, valid until `expires_at`
    pub access_token: String,
    /// Long-lived refresh secret (encrypted, legacy plaintext, or absent)
    pub refresh_secret: RefreshSecret,
    /// Absolute deadline after which `access_token` must not be used
    pub expires_at: DateTime<Utc>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time (refreshes bump this)
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user_id", &self.user_id)
            .field("provider", &self.provider)
            .field("access_token", &"<redacted>")
            .field("refresh_secret", &self.refresh_secret)
            .field("expires_at", &self.expires_at)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Credential data for the initial-grant upsert
///
/// Written by the (out-of-scope) OAuth consent flow when a user first
/// connects a provider, and by tests. New writes carry only the encrypted
/// secret column; the plaintext column exists for legacy rows.
pub struct NewCredential<'a> {
    /// User the credential belongs to
    pub user_id: Uuid,
    /// OAuth provider name key
    pub provider: &'a str,
    /// Bearer token from the grant
    pub access_token: &'a str,
    /// Encrypted refresh secret, if the grant issued one
    pub encrypted_refresh_secret: Option<&'a str>,
    /// Legacy cleartext secret (pre-encryption rows only)
    pub plaintext_refresh_secret: Option<&'a str>,
    /// Token expiry deadline
    pub expires_at: DateTime<Utc>,
}

/// Connection listing entry for dependent features
///
/// Dashboards gate their provider panels on this without materializing a
/// token.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectedProvider {
    /// OAuth provider name key
    pub provider: String,
    /// When the user first connected the provider
    pub connected_at: DateTime<Utc>,
    /// Last credential mutation (refresh or re-grant)
    pub updated_at: DateTime<Utc>,
}
