// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Client-facing message for any failed password login.
pub const LOGIN_FAILED: &str = "Invalid credentials or login failed.";
/// Client-facing message for any failed Google sign-in.
pub const GOOGLE_LOGIN_FAILED: &str = "Invalid Google Token or Login Failed.";
/// Client-facing message when the admin backend is unavailable.
pub const BACKEND_NOT_CONFIGURED: &str = "Backend not configured (identity provider missing).";

/// Provider-supplied error text, passed through to the caller uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamMessage(pub String);

impl std::fmt::Display for UpstreamMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Backend not configured: {0}")]
    Configuration(String),

    #[error("{0}")]
    Validation(&'static str),

    #[error("Password login failed")]
    InvalidCredentials,

    #[error("Google sign-in failed")]
    InvalidGoogleToken,

    #[error("Upstream error: {0}")]
    Upstream(UpstreamMessage),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AppError::Configuration(reason) => {
                tracing::error!(reason = %reason, "Backend not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    BACKEND_NOT_CONFIGURED.to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, LOGIN_FAILED.to_string()),
            AppError::InvalidGoogleToken => {
                (StatusCode::UNAUTHORIZED, GOOGLE_LOGIN_FAILED.to_string())
            }
            AppError::Upstream(msg) => (StatusCode::BAD_REQUEST, msg.0.clone()),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
