// ABOUTME: Shared test utilities for the credential lifecycle tests
// ABOUTME: In-memory database, test cipher, credential seeding, and a mock token client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `searchdeck_connect`
//!
//! Common setup helpers to reduce duplication across integration tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use searchdeck_connect::crypto::{credential_aad, SecretCipher};
use searchdeck_connect::database::Database;
use searchdeck_connect::models::NewCredential;
use searchdeck_connect::oauth2_client::{ProviderTokenClient, RefreshedToken, TokenClientError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// Deterministic master key for codec tests
pub const TEST_MASTER_KEY: [u8; 32] = [7u8; 32];

/// A different key, for decryption-failure tests
pub const WRONG_MASTER_KEY: [u8; 32] = [9u8; 32];

pub async fn test_database() -> Database {
    Database::new("sqlite::memory:")
        .await
        .expect("Failed to create test database")
}

pub fn test_cipher() -> SecretCipher {
    SecretCipher::new(TEST_MASTER_KEY)
}

/// Encrypt a refresh secret the way the grant flow would
pub fn encrypt_secret(cipher: &SecretCipher, user_id: Uuid, provider: &str, secret: &str) -> String {
    cipher
        .encrypt_with_aad(secret, &credential_aad(user_id, provider))
        .expect("Failed to encrypt test secret")
}

/// Timestamp truncated to whole seconds, matching SQLite round-trip precision
pub fn truncated(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.timestamp(), 0).expect("Valid timestamp")
}

/// Insert a credential row with explicit secret columns
pub async fn seed_credential(
    db: &Database,
    user_id: Uuid,
    provider: &str,
    access_token: &str,
    encrypted_refresh_secret: Option<&str>,
    plaintext_refresh_secret: Option<&str>,
    expires_at: DateTime<Utc>,
) {
    db.upsert_credential(&NewCredential {
        user_id,
        provider,
        access_token,
        encrypted_refresh_secret,
        plaintext_refresh_secret,
        expires_at,
    })
    .await
    .expect("Failed to seed credential");
}

/// Configured refresh behavior for the mock client
pub enum MockRefresh {
    Succeed {
        access_token: String,
        expires_in_secs: i64,
    },
    Reject {
        status: u16,
        body: String,
    },
    Unreachable,
}

/// Configured revoke behavior for the mock client
pub enum MockRevoke {
    Succeed,
    Unreachable,
}

/// Token client double recording calls at the trait seam
pub struct MockTokenClient {
    pub refresh_calls: AtomicUsize,
    pub revoke_calls: AtomicUsize,
    pub last_refresh_secret: Mutex<Option<String>>,
    pub last_revoked_token: Mutex<Option<String>>,
    refresh_behavior: MockRefresh,
    revoke_behavior: MockRevoke,
    refresh_delay: Option<Duration>,
}

impl MockTokenClient {
    pub fn succeeding(access_token: &str, expires_in_secs: i64) -> Self {
        Self::with_behavior(MockRefresh::Succeed {
            access_token: access_token.to_owned(),
            expires_in_secs,
        })
    }

    pub fn rejecting(status: u16, body: &str) -> Self {
        Self::with_behavior(MockRefresh::Reject {
            status,
            body: body.to_owned(),
        })
    }

    pub fn unreachable() -> Self {
        Self::with_behavior(MockRefresh::Unreachable)
    }

    fn with_behavior(refresh_behavior: MockRefresh) -> Self {
        Self {
            refresh_calls: AtomicUsize::new(0),
            revoke_calls: AtomicUsize::new(0),
            last_refresh_secret: Mutex::new(None),
            last_revoked_token: Mutex::new(None),
            refresh_behavior,
            revoke_behavior: MockRevoke::Succeed,
            refresh_delay: None,
        }
    }

    /// Delay each refresh, making concurrent-batch contention deterministic
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    pub fn with_revoke_unreachable(mut self) -> Self {
        self.revoke_behavior = MockRevoke::Unreachable;
        self
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn revoke_count(&self) -> usize {
        self.revoke_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderTokenClient for MockTokenClient {
    async fn refresh(
        &self,
        _provider: &str,
        refresh_secret: &str,
    ) -> Result<RefreshedToken, TokenClientError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_refresh_secret.lock().unwrap() = Some(refresh_secret.to_owned());

        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }

        match &self.refresh_behavior {
            MockRefresh::Succeed {
                access_token,
                expires_in_secs,
            } => Ok(RefreshedToken {
                access_token: access_token.clone(),
                expires_in_secs: *expires_in_secs,
            }),
            MockRefresh::Reject { status, body } => Err(TokenClientError::RefreshRejected {
                status: *status,
                body: body.clone(),
            }),
            MockRefresh::Unreachable => Err(TokenClientError::RefreshUnreachable(
                "request timed out".to_owned(),
            )),
        }
    }

    async fn revoke(&self, _provider: &str, access_token: &str) -> Result<(), TokenClientError> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_revoked_token.lock().unwrap() = Some(access_token.to_owned());

        match self.revoke_behavior {
            MockRevoke::Succeed => Ok(()),
            MockRevoke::Unreachable => Err(TokenClientError::RevokeUnreachable(
                "request timed out".to_owned(),
            )),
        }
    }
}
