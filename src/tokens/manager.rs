// ABOUTME: Credential manager: the single entry point for provider token lifecycle
// ABOUTME: Composes store, secret codec, and token client with per-key single-flight refresh
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck

use super::{is_fresh, CredentialError};
use crate::crypto::{SecretCipher, SecretError};
use crate::database::Database;
use crate::errors::AppResult;
use crate::models::{ConnectedProvider, Credential, CredentialKey};
use crate::oauth2_client::{BestEffort, ProviderTokenClient, TokenClientError};
use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Orchestrates the steady-state credential lifecycle
///
/// The only component dependent features call. Serializes refreshes per
/// (user, provider) so a burst of concurrent callers for the same key
/// collapses into a single provider round trip.
pub struct CredentialManager {
    database: Database,
    cipher: Arc<SecretCipher>,
    token_client: Arc<dyn ProviderTokenClient>,
    expiry_buffer: Duration,
    flow_guards: DashMap<CredentialKey, Arc<Mutex<()>>>,
}

impl CredentialManager {
    /// Create a manager with the default expiry buffer
    #[must_use]
    pub fn new(
        database: Database,
        cipher: SecretCipher,
        token_client: Arc<dyn ProviderTokenClient>,
    ) -> Self {
        Self::with_expiry_buffer(
            database,
            cipher,
            token_client,
            Duration::seconds(crate::constants::defaults::TOKEN_EXPIRY_BUFFER_SECS),
        )
    }

    /// Create a manager with an explicit expiry buffer
    #[must_use]
    pub fn with_expiry_buffer(
        database: Database,
        cipher: SecretCipher,
        token_client: Arc<dyn ProviderTokenClient>,
        expiry_buffer: Duration,
    ) -> Self {
        Self {
            database,
            cipher: Arc::new(cipher),
            token_client,
            expiry_buffer,
            flow_guards: DashMap::new(),
        }
    }

    /// Get a currently valid access token for a (user, provider) pair
    ///
    /// Returns the cached token when it is still fresh; otherwise refreshes
    /// it through the provider's token endpoint and persists the result.
    /// Never retries in-process: a single failed refresh surfaces
    /// immediately with user-actionable guidance.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::NotConnected`] when no credential exists
    /// - [`CredentialError::NeedsReconnect`] when the refresh secret is
    ///   missing or undecryptable
    /// - [`CredentialError::RefreshFailed`] when the provider rejects the
    ///   grant or cannot be reached
    pub async fn get_fresh_token(
        &self,
        user_id: Uuid,
        provider: &str,
    ) -> Result<String, CredentialError> {
        let key = CredentialKey::new(user_id, provider);
        debug!(credential = %key, "get_fresh_token called");

        let credential = self.load_required(&key).await?;
        if is_fresh(credential.expires_at, Utc::now(), self.expiry_buffer) {
            debug!(credential = %key, "Returning cached access token");
            return Ok(credential.access_token);
        }

        // Stale: serialize the refresh per key so concurrent callers
        // collapse into one provider round trip.
        let guard = self.flow_guard(&key);
        let _flow = guard.lock().await;

        // Re-check under the guard: an earlier holder may have refreshed
        // (or revoked) while this caller waited.
        let credential = self.load_required(&key).await?;
        if is_fresh(credential.expires_at, Utc::now(), self.expiry_buffer) {
            debug!(credential = %key, "Token refreshed by concurrent caller");
            return Ok(credential.access_token);
        }

        self.refresh_credential(&key, &credential).await
    }

    /// Check whether the user has ever connected the provider
    ///
    /// Existence only: no token is materialized and nothing is refreshed.
    /// Dependent features gate their UI and flows on this.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub async fn has_credential(&self, user_id: Uuid, provider: &str) -> AppResult<bool> {
        self.database.has_credential(user_id, provider).await
    }

    /// Disconnect the user from a provider
    ///
    /// Revocation with the provider is best-effort; local deletion proceeds
    /// unconditionally, because "disconnect" is about this application's
    /// state, not the provider's bookkeeping. Idempotent: revoking an
    /// already-absent credential succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local store read or delete fails.
    pub async fn revoke(&self, user_id: Uuid, provider: &str) -> AppResult<()> {
        let key = CredentialKey::new(user_id, provider);

        // Hold the key's guard so a concurrent refresh cannot write back
        // between the provider call and the local delete.
        let guard = self.flow_guard(&key);
        let _flow = guard.lock().await;

        match self.database.get_credential(user_id, provider).await? {
            Some(credential) => {
                BestEffort::from(
                    self.token_client
                        .revoke(provider, &credential.access_token)
                        .await,
                )
                .log_if_failed("token revocation", &key);
            }
            None => {
                debug!(credential = %key, "Revoke on absent credential; nothing to revoke upstream");
            }
        }

        self.database.delete_credential(user_id, provider).await?;
        info!(credential = %key, "Credential revoked");

        self.flow_guards.remove(&key);
        Ok(())
    }

    /// List the providers the user has connected
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub async fn connected_providers(&self, user_id: Uuid) -> AppResult<Vec<ConnectedProvider>> {
        self.database.list_connected_providers(user_id).await
    }

    /// Load the credential or report the user as not connected
    async fn load_required(&self, key: &CredentialKey) -> Result<Credential, CredentialError> {
        self.database
            .get_credential(key.user_id, &key.provider)
            .await?
            .ok_or_else(|| CredentialError::NotConnected {
                provider: key.provider.clone(),
            })
    }

    /// Refresh a stale credential and persist the result
    ///
    /// Runs the provider call and the write-back on a spawned task, so a
    /// caller whose outer request is cancelled cannot abort a refresh that
    /// other waiters on the same key are depending on.
    async fn refresh_credential(
        &self,
        key: &CredentialKey,
        credential: &Credential,
    ) -> Result<String, CredentialError> {
        let secret = match credential
            .refresh_secret
            .recover(&self.cipher, key.user_id, &key.provider)
        {
            Ok(secret) => secret,
            Err(e @ SecretError::DecryptionFailed(_)) => {
                // Configuration or data corruption; logged distinctly from
                // an absent secret for operability.
                error!(credential = %key, error = %e, "Refresh secret undecryptable");
                return Err(CredentialError::NeedsReconnect {
                    provider: key.provider.clone(),
                });
            }
            Err(SecretError::NoRefreshSecret) => {
                debug!(credential = %key, "Credential has no refresh secret");
                return Err(CredentialError::NeedsReconnect {
                    provider: key.provider.clone(),
                });
            }
        };

        info!(credential = %key, "Access token stale, refreshing");

        let client = Arc::clone(&self.token_client);
        let database = self.database.clone();
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let refreshed = client.refresh(&task_key.provider, &secret).await?;
            let expires_at = Utc::now() + Duration::seconds(refreshed.expires_in_secs);

            if let Err(e) = database
                .update_credential_tokens(
                    task_key.user_id,
                    &task_key.provider,
                    &refreshed.access_token,
                    expires_at,
                )
                .await
            {
                // Returning a known-good in-memory token beats failing the
                // caller's request; the next call simply re-refreshes.
                warn!(
                    credential = %task_key,
                    error = %e,
                    "Failed to persist refreshed token; returning in-memory token"
                );
            }

            Ok::<String, TokenClientError>(refreshed.access_token)
        });

        match handle.await {
            Ok(Ok(access_token)) => {
                info!(credential = %key, "Token refreshed successfully");
                Ok(access_token)
            }
            Ok(Err(e)) => {
                warn!(credential = %key, error = %e, "Token refresh failed");
                Err(CredentialError::RefreshFailed {
                    provider: key.provider.clone(),
                    source: e,
                })
            }
            Err(e) => Err(CredentialError::RefreshFailed {
                provider: key.provider.clone(),
                source: TokenClientError::RefreshUnreachable(format!("refresh task aborted: {e}")),
            }),
        }
    }

    /// Get or create the single-flight guard for a key
    fn flow_guard(&self, key: &CredentialKey) -> Arc<Mutex<()>> {
        self.flow_guards
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
