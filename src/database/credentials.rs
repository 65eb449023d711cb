// ABOUTME: Credential CRUD for the provider_credentials table
// ABOUTME: Targeted token updates that never touch the refresh secret columns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{ConnectedProvider, Credential, NewCredential, RefreshSecret};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Get the credential for a (user, provider) pair
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the stored row is
    /// malformed.
    pub async fn get_credential(
        &self,
        user_id: Uuid,
        provider: &str,
    ) -> AppResult<Option<Credential>> {
        let row = sqlx::query(
            r"
            SELECT user_id, provider, access_token, encrypted_refresh_secret,
                   plaintext_refresh_secret, expires_at, created_at, updated_at
            FROM provider_credentials
            WHERE user_id = $1 AND provider = $2
            ",
        )
        .bind(user_id.to_string())
        .bind(provider)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to query credential: {e}")))?;

        row.map_or_else(|| Ok(None), |row| Ok(Some(Self::row_to_credential(&row)?)))
    }

    /// Upsert a credential from the initial OAuth grant
    ///
    /// Used by the (out-of-scope) consent flow when a user connects a
    /// provider: overwriting an existing row with a brand-new grant is how a
    /// credential leaves the needs-reconnect state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn upsert_credential(&self, credential: &NewCredential<'_>) -> AppResult<()> {
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO provider_credentials (
                user_id, provider, access_token, encrypted_refresh_secret,
                plaintext_refresh_secret, expires_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, provider)
            DO UPDATE SET
                access_token = EXCLUDED.access_token,
                encrypted_refresh_secret = EXCLUDED.encrypted_refresh_secret,
                plaintext_refresh_secret = EXCLUDED.plaintext_refresh_secret,
                expires_at = EXCLUDED.expires_at,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(credential.user_id.to_string())
        .bind(credential.provider)
        .bind(credential.access_token)
        .bind(credential.encrypted_refresh_secret)
        .bind(credential.plaintext_refresh_secret)
        .bind(credential.expires_at)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert credential: {e}")))?;

        Ok(())
    }

    /// Targeted update of the access token and expiry after a refresh
    ///
    /// Touches only `access_token`, `expires_at`, and `updated_at` so a
    /// refresh can never clobber the refresh secret columns. A row deleted
    /// by a concurrent revoke is left deleted (zero rows affected is not an
    /// error).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn update_credential_tokens(
        &self,
        user_id: Uuid,
        provider: &str,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE provider_credentials
            SET access_token = $3,
                expires_at = $4,
                updated_at = $5
            WHERE user_id = $1 AND provider = $2
            ",
        )
        .bind(user_id.to_string())
        .bind(provider)
        .bind(access_token)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to update credential tokens: {e}")))?;

        Ok(())
    }

    /// Delete the credential for a (user, provider) pair
    ///
    /// Deleting an absent row succeeds, which keeps revoke idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn delete_credential(&self, user_id: Uuid, provider: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM provider_credentials WHERE user_id = $1 AND provider = $2")
            .bind(user_id.to_string())
            .bind(provider)
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to delete credential: {e}")))?;

        Ok(())
    }

    /// Check whether a credential exists for a (user, provider) pair
    ///
    /// Existence only; no token is materialized and no freshness is
    /// evaluated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn has_credential(&self, user_id: Uuid, provider: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM provider_credentials WHERE user_id = $1 AND provider = $2",
        )
        .bind(user_id.to_string())
        .bind(provider)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to check credential existence: {e}")))?;

        Ok(count > 0)
    }

    /// List the providers a user has connected
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_connected_providers(
        &self,
        user_id: Uuid,
    ) -> AppResult<Vec<ConnectedProvider>> {
        let rows = sqlx::query(
            r"
            SELECT provider, created_at, updated_at
            FROM provider_credentials
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to list connected providers: {e}")))?;

        let mut connections = Vec::with_capacity(rows.len());
        for row in rows {
            connections.push(ConnectedProvider {
                provider: row.get("provider"),
                connected_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            });
        }

        Ok(connections)
    }

    /// Convert a database row to a [`Credential`]
    ///
    /// The secret columns map onto the tagged [`RefreshSecret`] variant
    /// here and nowhere else; the encrypted column wins when both are
    /// populated.
    fn row_to_credential(row: &SqliteRow) -> AppResult<Credential> {
        let user_id_str: String = row.get("user_id");
        let user_id = Uuid::parse_str(&user_id_str)?;

        let encrypted: Option<String> = row.get("encrypted_refresh_secret");
        let plaintext: Option<String> = row.get("plaintext_refresh_secret");

        Ok(Credential {
            user_id,
            provider: row.get("provider"),
            access_token: row.get("access_token"),
            refresh_secret: RefreshSecret::from_columns(encrypted, plaintext),
            expires_at: row.get("expires_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
