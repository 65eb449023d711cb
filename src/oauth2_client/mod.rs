// ABOUTME: OAuth 2.0 token client seam (Searchdeck as client to search providers)
// ABOUTME: Refresh grant and best-effort revoke against provider token endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck

use crate::models::CredentialKey;
use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

/// HTTP implementation of the token client
pub mod http;

pub use http::HttpTokenClient;

/// Result of a successful refresh grant
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    /// Newly issued bearer token
    pub access_token: String,
    /// Validity window reported by the provider, in seconds
    pub expires_in_secs: i64,
}

/// Token endpoint failures
///
/// Rejected and unreachable are handled identically by callers (neither is
/// retried within the call) but logged distinctly: a rejection carries the
/// provider's raw error body for diagnostics, unreachable points at the
/// network or a timeout.
#[derive(Debug, Error)]
pub enum TokenClientError {
    /// Provider answered the refresh grant with a non-2xx status
    #[error("Provider rejected token refresh (status {status}): {body}")]
    RefreshRejected {
        /// HTTP status returned by the token endpoint
        status: u16,
        /// Raw response body, kept for diagnostics
        body: String,
    },

    /// The token endpoint could not be reached (network failure or timeout)
    #[error("Provider token endpoint unreachable: {0}")]
    RefreshUnreachable(String),

    /// Provider answered the revoke call with a non-2xx status
    #[error("Provider rejected token revocation (status {status}): {body}")]
    RevokeRejected {
        /// HTTP status returned by the revoke endpoint
        status: u16,
        /// Raw response body, kept for diagnostics
        body: String,
    },

    /// The revoke endpoint could not be reached (network failure or timeout)
    #[error("Provider revoke endpoint unreachable: {0}")]
    RevokeUnreachable(String),

    /// Provider OAuth configuration is missing or invalid
    #[error("Provider configuration error: {0}")]
    Config(String),
}

/// Client for the provider's token endpoint
///
/// Knows nothing about storage; the credential manager composes it with the
/// store and the secret codec. The trait seam keeps the manager testable
/// without a live provider.
#[async_trait]
pub trait ProviderTokenClient: Send + Sync {
    /// Execute the `refresh_token` grant
    ///
    /// # Errors
    ///
    /// Returns [`TokenClientError::RefreshRejected`] for a non-2xx response
    /// and [`TokenClientError::RefreshUnreachable`] for network failure or
    /// timeout. Not retried within this call.
    async fn refresh(
        &self,
        provider: &str,
        refresh_secret: &str,
    ) -> Result<RefreshedToken, TokenClientError>;

    /// Revoke an access token with the provider
    ///
    /// Callers treat this as a courtesy: failure must not block local
    /// credential deletion.
    ///
    /// # Errors
    ///
    /// Returns [`TokenClientError::RevokeRejected`] for a non-2xx response
    /// and [`TokenClientError::RevokeUnreachable`] for network failure or
    /// timeout.
    async fn revoke(&self, provider: &str, access_token: &str) -> Result<(), TokenClientError>;
}

/// Outcome of a provider call whose failure is intentionally swallowed
///
/// Revocation with the provider is a courtesy, not a precondition for the
/// local record disappearing. Wrapping the result makes the swallow explicit
/// at the call site instead of looking like a dropped error.
#[must_use = "a best-effort outcome should still be logged"]
pub struct BestEffort<T>(Result<T, TokenClientError>);

impl<T> From<Result<T, TokenClientError>> for BestEffort<T> {
    fn from(result: Result<T, TokenClientError>) -> Self {
        Self(result)
    }
}

impl<T> BestEffort<T> {
    /// Log the failure, if any, and discard the outcome
    pub fn log_if_failed(self, operation: &str, key: &CredentialKey) {
        if let Err(e) = self.0 {
            warn!(
                credential = %key,
                error = %e,
                "Best-effort {operation} failed; continuing"
            );
        }
    }

    /// Whether the call completed successfully
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.0.is_ok()
    }
}
