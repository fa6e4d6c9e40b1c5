// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Travel Auth Gateway API Server
//!
//! Signup, password login and Google sign-in backed by Firebase
//! Authentication and Firestore.

use gcloud_sdk::TokenSourceType;
use std::sync::Arc;
use travel_auth_gateway::{
    config::{Config, ServiceAccountKey},
    db::FirestoreProfileStore,
    services::{Admin, AuthGateway, FirebaseIdentity},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    let config = Config::from_env();
    tracing::info!(port = config.port, "Starting Travel Auth Gateway");

    if config.web_api_key.is_none() {
        tracing::warn!("FIREBASE_WEB_API_KEY not set; password login will fail");
    }

    // Missing credentials degrade the admin routes instead of aborting startup.
    let key = match ServiceAccountKey::from_file(&config.service_account_path) {
        Ok(key) => {
            tracing::info!(
                project = %key.project_id,
                client_email = %key.client_email,
                "Service account key loaded"
            );
            Some(key)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not load service account key; signup and Google sign-in disabled");
            None
        }
    };

    let (identity, admin) = match &key {
        Some(key) => admin_backend(&config, key).await?,
        None => (
            FirebaseIdentity::new(&config)?,
            Admin::unavailable("service account key not loaded"),
        ),
    };

    // Build shared state
    let state = Arc::new(AppState {
        gateway: AuthGateway::new(Arc::new(identity), admin),
    });

    // Build router
    let app = travel_auth_gateway::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the service-account identity adapter and the profile store.
///
/// Either failing leaves the admin backend unavailable; password login
/// still works.
async fn admin_backend(
    config: &Config,
    key: &ServiceAccountKey,
) -> anyhow::Result<(FirebaseIdentity, Admin)> {
    let project_id = config.project_id.as_deref().unwrap_or(&key.project_id);
    let tokens = TokenSourceType::File(config.service_account_path.clone());

    let identity = match FirebaseIdentity::with_service_account(config, project_id, tokens).await
    {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(error = %e, "Service account token source unavailable; signup and Google sign-in disabled");
            return Ok((FirebaseIdentity::new(config)?, Admin::unavailable(e.to_string())));
        }
    };

    let admin = match FirestoreProfileStore::new(project_id, &config.service_account_path).await {
        Ok(store) => Admin::ready(Arc::new(store)),
        Err(e) => {
            tracing::warn!(error = %e, "Firestore unavailable; signup and Google sign-in disabled");
            Admin::unavailable(e.to_string())
        }
    };

    Ok((identity, admin))
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("travel_auth_gateway=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
