// ABOUTME: Application constants and configuration defaults
// ABOUTME: Provider name keys, lifecycle timing defaults, and environment variable names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck

/// Canonical provider name keys
///
/// These are the values stored in the `provider` column and accepted by the
/// credential manager. Environment variable lookups uppercase them
/// (`SEARCHDECK_GOOGLE_CLIENT_ID`).
pub mod oauth_providers {
    /// Google (Search Console + Analytics share one OAuth credential)
    pub const GOOGLE: &str = "google";
    /// Bing Webmaster Tools
    pub const BING: &str = "bing";
}

/// Lifecycle timing defaults
pub mod defaults {
    /// Safety buffer subtracted from the token expiry deadline.
    ///
    /// A token expiring within this window is treated as stale so it cannot
    /// expire mid-flight during the round trip to the downstream API.
    pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 300;

    /// Timeout applied to every provider token-endpoint call
    pub const PROVIDER_HTTP_TIMEOUT_SECS: u64 = 10;
}

/// Environment variable names consumed by [`crate::config::environment`]
pub mod env_names {
    /// Database connection string (SQLite URL)
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Base64-encoded 32-byte master key for refresh secret encryption
    pub const MASTER_ENCRYPTION_KEY: &str = "SEARCHDECK_MASTER_ENCRYPTION_KEY";
    /// Override for the token expiry buffer, in seconds
    pub const TOKEN_EXPIRY_BUFFER: &str = "SEARCHDECK_TOKEN_EXPIRY_BUFFER_SECS";
    /// Override for the provider HTTP timeout, in seconds
    pub const PROVIDER_HTTP_TIMEOUT: &str = "SEARCHDECK_PROVIDER_HTTP_TIMEOUT_SECS";
}
