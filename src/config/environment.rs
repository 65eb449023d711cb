// ABOUTME: Environment-only configuration: service settings and per-provider OAuth config
// ABOUTME: Resolves SEARCHDECK_<PROVIDER>_* variables with built-in endpoint defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck

use crate::constants::{defaults, env_names, oauth_providers};
use crate::errors::{AppError, AppResult};
use base64::{engine::general_purpose, Engine as _};
use std::env;
use std::time::Duration;
use zeroize::Zeroize;

/// Service-wide configuration loaded from the environment
pub struct ServiceConfig {
    /// Database connection string
    pub database_url: String,
    /// 32-byte master key for refresh secret encryption
    pub master_key: [u8; 32],
    /// Token expiry safety buffer
    pub token_expiry_buffer: chrono::Duration,
    /// Timeout for provider token-endpoint calls
    pub provider_http_timeout: Duration,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("database_url", &self.database_url)
            .field("master_key", &"[redacted]")
            .field("token_expiry_buffer", &self.token_expiry_buffer)
            .field("provider_http_timeout", &self.provider_http_timeout)
            .finish()
    }
}

impl ServiceConfig {
    /// Load configuration from the environment
    ///
    /// `DATABASE_URL` and `SEARCHDECK_MASTER_ENCRYPTION_KEY` are required;
    /// timing settings fall back to the crate defaults.
    ///
    /// # Errors
    ///
    /// Returns a config error naming the variable that is missing or
    /// malformed.
    pub fn from_env() -> AppResult<Self> {
        let database_url = env::var(env_names::DATABASE_URL)
            .map_err(|_| AppError::config(format!("{} not set", env_names::DATABASE_URL)))?;

        let master_key = load_master_key()?;

        let token_expiry_buffer =
            env_i64_or(env_names::TOKEN_EXPIRY_BUFFER, defaults::TOKEN_EXPIRY_BUFFER_SECS)?;
        let provider_http_timeout = env_i64_or(
            env_names::PROVIDER_HTTP_TIMEOUT,
            i64::try_from(defaults::PROVIDER_HTTP_TIMEOUT_SECS)
                .map_err(|e| AppError::internal(format!("timeout default out of range: {e}")))?,
        )?;

        if token_expiry_buffer < 0 || provider_http_timeout <= 0 {
            return Err(AppError::config(
                "Timing overrides must be non-negative seconds",
            ));
        }

        Ok(Self {
            database_url,
            master_key,
            token_expiry_buffer: chrono::Duration::seconds(token_expiry_buffer),
            provider_http_timeout: Duration::from_secs(provider_http_timeout as u64),
        })
    }
}

/// Load and decode the master encryption key
///
/// The key is base64-encoded in `SEARCHDECK_MASTER_ENCRYPTION_KEY` and must
/// decode to exactly 32 bytes. Intermediate buffers are zeroized.
///
/// # Errors
///
/// Returns a config error if the variable is missing, is not valid base64,
/// or decodes to the wrong length.
pub fn load_master_key() -> AppResult<[u8; 32]> {
    let encoded = env::var(env_names::MASTER_ENCRYPTION_KEY).map_err(|_| {
        AppError::config(format!("{} not set", env_names::MASTER_ENCRYPTION_KEY))
    })?;

    let mut decoded = general_purpose::STANDARD.decode(encoded.trim()).map_err(|e| {
        AppError::config(format!(
            "{} is not valid base64: {e}",
            env_names::MASTER_ENCRYPTION_KEY
        ))
    })?;

    if decoded.len() != 32 {
        decoded.zeroize();
        return Err(AppError::config(format!(
            "{} must decode to 32 bytes",
            env_names::MASTER_ENCRYPTION_KEY
        )));
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(&decoded);
    decoded.zeroize();
    Ok(key)
}

fn env_i64_or(name: &str, default: i64) -> AppResult<i64> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|e| AppError::config(format!("{name} is not an integer: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Per-provider OAuth client configuration
///
/// Endpoint fields fall back to built-in defaults for known providers;
/// client credentials always come from the environment.
#[derive(Debug, Clone)]
pub struct OAuthProviderConfig {
    /// Provider name key
    pub provider: String,
    /// OAuth client id, if configured
    pub client_id: Option<String>,
    /// OAuth client secret, if configured
    pub client_secret: Option<String>,
    /// Token endpoint for the refresh grant
    pub token_endpoint: Option<String>,
    /// Revoke endpoint; providers without one revoke locally only
    pub revoke_endpoint: Option<String>,
}

impl OAuthProviderConfig {
    /// Require the client id/secret pair
    ///
    /// # Errors
    ///
    /// Returns a config error naming the missing environment variable.
    pub fn credentials(&self) -> AppResult<(String, String)> {
        let upper = self.provider.to_uppercase();
        let client_id = self.client_id.clone().ok_or_else(|| {
            AppError::config(format!(
                "SEARCHDECK_{upper}_CLIENT_ID not configured for provider {}",
                self.provider
            ))
        })?;
        let client_secret = self.client_secret.clone().ok_or_else(|| {
            AppError::config(format!(
                "SEARCHDECK_{upper}_CLIENT_SECRET not configured for provider {}",
                self.provider
            ))
        })?;
        Ok((client_id, client_secret))
    }

    /// Require the token endpoint
    ///
    /// # Errors
    ///
    /// Returns a config error if neither the environment nor the built-in
    /// defaults provide one.
    pub fn require_token_endpoint(&self) -> AppResult<&str> {
        self.token_endpoint.as_deref().ok_or_else(|| {
            AppError::config(format!(
                "SEARCHDECK_{}_TOKEN_ENDPOINT not configured for provider {}",
                self.provider.to_uppercase(),
                self.provider
            ))
        })
    }
}

/// Resolve OAuth configuration for a provider from the environment
///
/// Reads `SEARCHDECK_<PROVIDER>_CLIENT_ID`, `..._CLIENT_SECRET`,
/// `..._TOKEN_ENDPOINT`, and `..._REVOKE_ENDPOINT`, applying built-in
/// endpoint defaults for known providers.
#[must_use]
pub fn get_oauth_config(provider: &str) -> OAuthProviderConfig {
    let upper = provider.to_uppercase();
    let var = |suffix: &str| env::var(format!("SEARCHDECK_{upper}_{suffix}")).ok();

    let (default_token, default_revoke) = default_endpoints(provider);

    OAuthProviderConfig {
        provider: provider.to_lowercase(),
        client_id: var("CLIENT_ID"),
        client_secret: var("CLIENT_SECRET"),
        token_endpoint: var("TOKEN_ENDPOINT").or_else(|| default_token.map(str::to_owned)),
        revoke_endpoint: var("REVOKE_ENDPOINT").or_else(|| default_revoke.map(str::to_owned)),
    }
}

fn default_endpoints(provider: &str) -> (Option<&'static str>, Option<&'static str>) {
    match provider {
        oauth_providers::GOOGLE => (
            Some("https://oauth2.googleapis.com/token"),
            Some("https://oauth2.googleapis.com/revoke"),
        ),
        _ => (None, None),
    }
}
