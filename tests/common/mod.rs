// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use std::sync::Arc;
use travel_auth_gateway::db::mock::MockProfileStore;
use travel_auth_gateway::db::FirestoreProfileStore;
use travel_auth_gateway::routes::create_router;
use travel_auth_gateway::services::identity::mock::MockIdentityProvider;
use travel_auth_gateway::services::{Admin, AuthGateway};
use travel_auth_gateway::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Connect to the Firestore emulator.
#[allow(dead_code)]
pub async fn test_store() -> FirestoreProfileStore {
    FirestoreProfileStore::new("test-project", std::path::Path::new("unused.json"))
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Router wired to in-memory doubles, plus handles to inspect them.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub identity: Arc<MockIdentityProvider>,
    pub store: Arc<MockProfileStore>,
}

/// Create a test app whose admin backend is ready.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let identity = Arc::new(MockIdentityProvider::new());
    let store = Arc::new(MockProfileStore::new());
    let gateway = AuthGateway::new(identity.clone(), Admin::ready(store.clone()));
    build(gateway, identity, store)
}

/// Create a test app whose service-account credentials never loaded.
#[allow(dead_code)]
pub fn create_unconfigured_app() -> TestApp {
    let identity = Arc::new(MockIdentityProvider::new());
    let store = Arc::new(MockProfileStore::new());
    let gateway = AuthGateway::new(
        identity.clone(),
        Admin::unavailable("service account key not loaded"),
    );
    build(gateway, identity, store)
}

fn build(
    gateway: AuthGateway,
    identity: Arc<MockIdentityProvider>,
    store: Arc<MockProfileStore>,
) -> TestApp {
    TestApp {
        router: create_router(Arc::new(AppState { gateway })),
        identity,
        store,
    }
}

/// POST a JSON body.
#[allow(dead_code)]
pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}
