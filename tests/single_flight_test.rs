// ABOUTME: Concurrency tests for per-key single-flight refresh
// ABOUTME: Validates that a concurrent batch of callers collapses into one provider round trip
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Searchdeck

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration, Utc};
use common::{encrypt_secret, seed_credential, test_cipher, test_database, truncated, MockTokenClient};
use searchdeck_connect::constants::oauth_providers;
use searchdeck_connect::tokens::CredentialManager;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use uuid::Uuid;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_refresh() {
    let db = test_database().await;
    let cipher = test_cipher();
    let client = Arc::new(
        MockTokenClient::succeeding("AT2", 3600)
            .with_refresh_delay(StdDuration::from_millis(100)),
    );
    let user_id = Uuid::new_v4();

    let ciphertext = encrypt_secret(&cipher, user_id, oauth_providers::GOOGLE, "1//secret");
    seed_credential(
        &db,
        user_id,
        oauth_providers::GOOGLE,
        "AT1",
        Some(&ciphertext),
        None,
        truncated(Utc::now() - Duration::seconds(1)),
    )
    .await;

    let manager = Arc::new(CredentialManager::new(
        db.clone(),
        test_cipher(),
        Arc::clone(&client) as Arc<dyn searchdeck_connect::oauth2_client::ProviderTokenClient>,
    ));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager.get_fresh_token(user_id, oauth_providers::GOOGLE).await
        }));
    }

    for handle in handles {
        let token = handle
            .await
            .expect("caller task panicked")
            .expect("get_fresh_token failed");
        assert_eq!(token, "AT2");
    }

    // One provider round trip for the whole batch; the other callers picked
    // up the refreshed row under the flow guard.
    assert_eq!(client.refresh_count(), 1);

    let stored = db
        .get_credential(user_id, oauth_providers::GOOGLE)
        .await
        .expect("query failed")
        .expect("credential not found");
    assert_eq!(stored.access_token, "AT2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_second_batch_after_refresh_hits_cache() {
    let db = test_database().await;
    let cipher = test_cipher();
    let client = Arc::new(
        MockTokenClient::succeeding("AT2", 3600)
            .with_refresh_delay(StdDuration::from_millis(50)),
    );
    let user_id = Uuid::new_v4();

    let ciphertext = encrypt_secret(&cipher, user_id, oauth_providers::GOOGLE, "1//secret");
    seed_credential(
        &db,
        user_id,
        oauth_providers::GOOGLE,
        "AT1",
        Some(&ciphertext),
        None,
        truncated(Utc::now() - Duration::seconds(1)),
    )
    .await;

    let manager = Arc::new(CredentialManager::new(
        db.clone(),
        test_cipher(),
        Arc::clone(&client) as Arc<dyn searchdeck_connect::oauth2_client::ProviderTokenClient>,
    ));

    let first = manager
        .get_fresh_token(user_id, oauth_providers::GOOGLE)
        .await
        .expect("first refresh failed");
    assert_eq!(first, "AT2");

    let mut handles = Vec::new();
    for _ in 0..4 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager.get_fresh_token(user_id, oauth_providers::GOOGLE).await
        }));
    }
    for handle in handles {
        let token = handle
            .await
            .expect("caller task panicked")
            .expect("get_fresh_token failed");
        assert_eq!(token, "AT2");
    }

    assert_eq!(client.refresh_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_keys_refresh_independently() {
    let db = test_database().await;
    let cipher = test_cipher();
    let client = Arc::new(
        MockTokenClient::succeeding("AT2", 3600)
            .with_refresh_delay(StdDuration::from_millis(50)),
    );
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();
    let stale = truncated(Utc::now() - Duration::seconds(1));

    let secret_a = encrypt_secret(&cipher, user_a, oauth_providers::GOOGLE, "secret-a");
    let secret_b = encrypt_secret(&cipher, user_b, oauth_providers::GOOGLE, "secret-b");
    seed_credential(&db, user_a, oauth_providers::GOOGLE, "AT1", Some(&secret_a), None, stale)
        .await;
    seed_credential(&db, user_b, oauth_providers::GOOGLE, "AT1", Some(&secret_b), None, stale)
        .await;

    let manager = Arc::new(CredentialManager::new(
        db.clone(),
        test_cipher(),
        Arc::clone(&client) as Arc<dyn searchdeck_connect::oauth2_client::ProviderTokenClient>,
    ));

    let ma = Arc::clone(&manager);
    let mb = Arc::clone(&manager);
    let (ra, rb) = tokio::join!(
        tokio::spawn(async move { ma.get_fresh_token(user_a, oauth_providers::GOOGLE).await }),
        tokio::spawn(async move { mb.get_fresh_token(user_b, oauth_providers::GOOGLE).await }),
    );

    assert_eq!(ra.expect("task panicked").expect("refresh failed"), "AT2");
    assert_eq!(rb.expect("task panicked").expect("refresh failed"), "AT2");

    // Different keys do not share a flight.
    assert_eq!(client.refresh_count(), 2);
}
