// ABOUTME: Main library entry point for the Searchdeck Connect credential service
// ABOUTME: Provides the provider credential lifecycle consumed by all dashboard features
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck

#![deny(unsafe_code)]

//! # Searchdeck Connect
//!
//! The credential lifecycle service of the Searchdeck SEO dashboard. Every
//! feature that talks to an external provider (Search Console queries,
//! Analytics reports, AI summaries) depends on this crate through two
//! narrow interfaces: "give me a currently valid access token for user U
//! and provider P" and "tell me whether user U has ever connected
//! provider P".
//!
//! ## Features
//!
//! - **Transparent refresh**: stale access tokens are refreshed through the
//!   provider's token endpoint without involving the caller
//! - **Single-flight**: concurrent callers for the same (user, provider)
//!   collapse into one refresh round trip
//! - **Encrypted secrets**: refresh secrets are AES-256-GCM encrypted at
//!   rest, AAD-bound to their row, with a legacy plaintext fallback
//! - **Best-effort revoke**: disconnecting locally never waits on the
//!   provider
//!
//! ## Architecture
//!
//! - **Models**: the credential entity and its tagged refresh secret
//! - **Database**: thin persistence boundary (SQLite via sqlx)
//! - **Crypto**: the secret codec
//! - **`OAuth2` client**: refresh grant and revoke against provider endpoints
//! - **Tokens**: freshness evaluation and the credential manager
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use searchdeck_connect::config::environment::ServiceConfig;
//! use searchdeck_connect::crypto::SecretCipher;
//! use searchdeck_connect::database::Database;
//! use searchdeck_connect::oauth2_client::HttpTokenClient;
//! use searchdeck_connect::tokens::CredentialManager;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::from_env()?;
//! let database = Database::new(&config.database_url).await?;
//! let manager = CredentialManager::new(
//!     database,
//!     SecretCipher::new(config.master_key),
//!     Arc::new(HttpTokenClient::new()?),
//! );
//!
//! let user_id = uuid::Uuid::new_v4();
//! let token = manager.get_fresh_token(user_id, "google").await?;
//! # Ok(())
//! # }
//! ```

/// Configuration management (environment-only)
pub mod config;

/// Application constants and configuration defaults
pub mod constants;

/// Secret codec for refresh secrets
pub mod crypto;

/// Credential persistence (SQLite via sqlx)
pub mod database;

/// Central application error types
pub mod errors;

/// Tracing subscriber setup
pub mod logging;

/// Core data models for provider credentials
pub mod models;

/// OAuth 2.0 token client (Searchdeck as client to search providers)
pub mod oauth2_client;

/// Token freshness and the credential manager
pub mod tokens;
