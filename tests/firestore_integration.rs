// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running and
//! FIRESTORE_EMULATOR_HOST to point at it; otherwise they are skipped.

use travel_auth_gateway::db::DocumentStore;
use travel_auth_gateway::models::{AuthProvider, NewProfile};

mod common;
use common::test_store;

/// Generate a unique uid for test isolation.
fn unique_uid() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test-uid-{nanos}")
}

fn new_profile(uid: &str, provider: AuthProvider) -> NewProfile {
    NewProfile {
        uid: uid.to_string(),
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        photo_url: Some("https://example.com/first.png".to_string()),
        provider,
    }
}

#[tokio::test]
async fn test_password_profile_roundtrip() {
    require_emulator!();

    let store = test_store().await;
    let uid = unique_uid();

    assert!(store.get_profile(&uid).await.unwrap().is_none());

    store
        .create_profile(&new_profile(&uid, AuthProvider::Password))
        .await
        .unwrap();

    let fetched = store.get_profile(&uid).await.unwrap().expect("profile exists");
    assert_eq!(fetched.uid, uid);
    assert_eq!(fetched.name, "Test User");
    assert_eq!(fetched.provider, AuthProvider::Password);
    assert!(fetched.last_login.is_none());
}

#[tokio::test]
async fn test_record_login_only_touches_login_fields() {
    require_emulator!();

    let store = test_store().await;
    let uid = unique_uid();

    store
        .create_profile(&new_profile(&uid, AuthProvider::Google))
        .await
        .unwrap();
    let created = store.get_profile(&uid).await.unwrap().unwrap();
    assert!(created.last_login.is_some());

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    store
        .record_login(&uid, Some("https://example.com/second.png"))
        .await
        .unwrap();

    let updated = store.get_profile(&uid).await.unwrap().unwrap();
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.email, created.email);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.provider, AuthProvider::Google);
    assert_eq!(
        updated.photo_url.as_deref(),
        Some("https://example.com/second.png")
    );
    assert!(updated.last_login > created.last_login);
}
