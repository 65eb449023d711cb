// ABOUTME: Central application error type and result alias
// ABOUTME: Classifies ambient failures (database, config, crypto, internal) for uniform propagation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck

use thiserror::Error;

/// Convenient result alias used throughout the crate
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error classification
///
/// Credential-specific outcomes (`NotConnected`, `NeedsReconnect`, ...) live
/// in [`crate::tokens::CredentialError`]; this type covers the ambient
/// failures beneath them.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller-supplied input failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal failure (crypto, encoding, lock poisoning)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        Self::InvalidInput(format!("Invalid UUID: {err}"))
    }
}
