// ABOUTME: Configuration module root
// ABOUTME: Environment-only configuration for the credential service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck

/// Environment-based configuration loading
pub mod environment;
