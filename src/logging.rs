// ABOUTME: Tracing subscriber initialization for the credential service
// ABOUTME: Env-filtered fmt output by default, JSON output for production deployments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging with the default filter
///
/// Reads `RUST_LOG`, falling back to `info` for this crate and `warn` for
/// dependencies. Safe to call once per process; a second call returns an
/// error from the underlying registry.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_with_filter("searchdeck_connect=info,warn", false)
}

/// Initialize logging with an explicit filter directive
///
/// `json` switches the output format for log aggregation in production.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or a global
/// subscriber is already installed.
pub fn init_with_filter(
    directive: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(directive))?;

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()?;
    }

    Ok(())
}
