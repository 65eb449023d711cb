// ABOUTME: reqwest-backed token client for provider refresh and revoke endpoints
// ABOUTME: Form-encoded refresh grant with explicit timeout and rejected-vs-unreachable mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck

use super::{ProviderTokenClient, RefreshedToken, TokenClientError};
use crate::config::environment::get_oauth_config;
use crate::constants::defaults;
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Token endpoint response for the refresh grant
///
/// Providers return more fields (scope, token_type, sometimes a rotated
/// refresh_token); only the two the lifecycle needs are read. The old
/// refresh secret remains valid with the providers Searchdeck integrates,
/// so a rotated secret is deliberately not consumed here.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    expires_in: i64,
}

/// HTTP token client with per-request timeout
///
/// Provider endpoints and client credentials are resolved from the
/// environment at call time, so a credential rotation does not require a
/// process restart.
pub struct HttpTokenClient {
    client: Client,
}

impl HttpTokenClient {
    /// Create a client with the default provider timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new() -> AppResult<Self> {
        Self::with_timeout(Duration::from_secs(defaults::PROVIDER_HTTP_TIMEOUT_SECS))
    }

    /// Create a client with an explicit timeout
    ///
    /// The timeout covers the whole request so a hung provider surfaces as
    /// unreachable instead of hanging the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    fn describe_transport_error(err: &reqwest::Error) -> String {
        if err.is_timeout() {
            "request timed out".to_owned()
        } else {
            err.to_string()
        }
    }
}

#[async_trait]
impl ProviderTokenClient for HttpTokenClient {
    async fn refresh(
        &self,
        provider: &str,
        refresh_secret: &str,
    ) -> Result<RefreshedToken, TokenClientError> {
        let config = get_oauth_config(provider);
        let (client_id, client_secret) = config
            .credentials()
            .map_err(|e| TokenClientError::Config(e.to_string()))?;
        let endpoint = config
            .require_token_endpoint()
            .map_err(|e| TokenClientError::Config(e.to_string()))?;

        let params = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_secret),
        ];

        debug!(provider, endpoint, "Executing refresh_token grant");

        let response = self
            .client
            .post(endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                TokenClientError::RefreshUnreachable(Self::describe_transport_error(&e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenClientError::RefreshRejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenEndpointResponse = response.json().await.map_err(|e| {
            TokenClientError::RefreshRejected {
                status: status.as_u16(),
                body: format!("malformed token response: {e}"),
            }
        })?;

        Ok(RefreshedToken {
            access_token: token.access_token,
            expires_in_secs: token.expires_in,
        })
    }

    async fn revoke(&self, provider: &str, access_token: &str) -> Result<(), TokenClientError> {
        let config = get_oauth_config(provider);
        let Some(revoke_endpoint) = config.revoke_endpoint.as_deref() else {
            // No revoke endpoint for this provider: disconnect is local-only.
            debug!(provider, "No revoke endpoint configured; skipping provider revoke");
            return Ok(());
        };

        let mut url = Url::parse(revoke_endpoint)
            .map_err(|e| TokenClientError::Config(format!("Invalid revoke endpoint: {e}")))?;
        url.query_pairs_mut().append_pair("token", access_token);

        debug!(provider, "Revoking access token with provider");

        let response = self.client.post(url).send().await.map_err(|e| {
            TokenClientError::RevokeUnreachable(Self::describe_transport_error(&e))
        })?;

        let status = response.status();
        if !status.is_success() {
            // Response body is otherwise ignored; keep it for diagnostics only.
            let body = response.text().await.unwrap_or_default();
            return Err(TokenClientError::RevokeRejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
