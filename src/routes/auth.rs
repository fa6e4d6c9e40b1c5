// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signup, password login and Google sign-in routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::services::gateway::{GoogleSignInRequest, LoginRequest, SignupRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/google", post(google_sign_in))
}

/// A body that is not a JSON object is treated as empty, so it fails the
/// required-field check instead of producing a framework rejection.
fn body_or_default<T: DeserializeOwned + Default>(
    payload: std::result::Result<Json<T>, JsonRejection>,
) -> T {
    match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable JSON body");
            T::default()
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignupResponse {
    pub message: String,
    pub uid: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub message: String,
    pub id_token: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GoogleSignInResponse {
    pub message: String,
    pub uid: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Register an email/password account.
async fn signup(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let outcome = state.gateway.signup(&body_or_default(payload)).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered successfully".to_string(),
            uid: outcome.uid,
        }),
    ))
}

/// Password login.
async fn login(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let outcome = state.gateway.login(&body_or_default(payload)).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        id_token: outcome.id_token,
        user_id: outcome.user_id,
        name: outcome.name,
        email: outcome.email,
    }))
}

/// Google sign-in with a client-obtained ID token.
async fn google_sign_in(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<GoogleSignInRequest>, JsonRejection>,
) -> Result<Json<GoogleSignInResponse>> {
    let outcome = state
        .gateway
        .google_sign_in(&body_or_default(payload))
        .await?;

    Ok(Json(GoogleSignInResponse {
        message: "Google Login successful".to_string(),
        uid: outcome.uid,
        name: outcome.name,
        email: outcome.email,
        photo_url: outcome.photo_url,
    }))
}
