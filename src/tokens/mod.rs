// ABOUTME: Token lifecycle primitives: freshness evaluation and the caller-facing error taxonomy
// ABOUTME: Home of the credential manager orchestrating store, codec, and token client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck

use crate::errors::AppError;
use crate::oauth2_client::TokenClientError;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Credential manager orchestration
pub mod manager;

pub use manager::CredentialManager;

/// Decide whether a cached access token is still usable
///
/// True iff `expires_at > now + buffer`. The buffer keeps a token from
/// expiring mid-flight during the round trip to the downstream provider
/// API; the boundary is inclusive, so a token expiring at exactly
/// `now + buffer` must be refreshed.
#[must_use]
pub fn is_fresh(expires_at: DateTime<Utc>, now: DateTime<Utc>, buffer: Duration) -> bool {
    expires_at > now + buffer
}

/// Caller-facing credential lifecycle errors
///
/// `NotConnected` and `NeedsReconnect` both resolve to the same "please
/// (re)connect your account" treatment in the dashboard; transient refresh
/// failures stay distinguishable in logs but present generically.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No credential exists; the user must start the consent flow
    #[error("No {provider} credential found. Please connect your {provider} account.")]
    NotConnected {
        /// Provider the caller asked for
        provider: String,
    },

    /// The credential exists but can no longer be refreshed; the user must
    /// redo consent
    #[error(
        "The {provider} connection can no longer be refreshed. Please reconnect your {provider} account."
    )]
    NeedsReconnect {
        /// Provider the caller asked for
        provider: String,
    },

    /// The provider refused or could not serve the refresh grant
    ///
    /// Not retried in-process; the caller decides whether to retry later
    /// (unreachable) or send the user back through consent (rejected).
    #[error("Token refresh failed for {provider}. Please reconnect your {provider} account.")]
    RefreshFailed {
        /// Provider the caller asked for
        provider: String,
        /// Underlying client failure, distinguished for logging
        #[source]
        source: TokenClientError,
    },

    /// Ambient failure beneath the lifecycle (storage, crypto setup)
    #[error(transparent)]
    App(#[from] AppError),
}
