// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The auth gateway: signup, password login and Google sign-in.
//!
//! Each operation validates its input, makes one to three sequential calls to
//! the identity provider and profile store, and translates failures into
//! [`AppError`] variants. Nothing is retried and nothing is rolled back.

use crate::db::DocumentStore;
use crate::error::{AppError, UpstreamMessage};
use crate::models::{AuthProvider, NewProfile};
use crate::services::identity::IdentityProvider;
use serde::Deserialize;
use std::sync::Arc;

/// Name returned by login when no profile document exists.
pub const DEFAULT_USER_NAME: &str = "User";
/// Name used for Google accounts whose token carries no name.
pub const DEFAULT_GOOGLE_NAME: &str = "Google User";

const MISSING_SIGNUP_FIELDS: &str = "Missing required fields.";
const MISSING_LOGIN_FIELDS: &str = "Missing email or password.";
const MISSING_ID_TOKEN: &str = "Missing ID Token.";

/// Availability of the service-account side (admin identity calls + store).
///
/// Decided once at startup and never changed.
pub enum Admin {
    Ready { store: Arc<dyn DocumentStore> },
    Unavailable { reason: String },
}

impl Admin {
    pub fn ready(store: Arc<dyn DocumentStore>) -> Self {
        Admin::Ready { store }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Admin::Unavailable {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSignInRequest {
    #[serde(default)]
    pub id_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupOutcome {
    pub uid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub id_token: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleOutcome {
    pub uid: String,
    pub name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

/// Thin pass-through to the identity provider and profile store.
pub struct AuthGateway {
    identity: Arc<dyn IdentityProvider>,
    admin: Admin,
}

fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.is_empty())
}

fn google_failure(stage: &'static str, e: impl std::fmt::Display) -> AppError {
    tracing::warn!(stage, error = %e, "Google sign-in failed");
    AppError::InvalidGoogleToken
}

impl AuthGateway {
    pub fn new(identity: Arc<dyn IdentityProvider>, admin: Admin) -> Self {
        Self { identity, admin }
    }

    /// Create an identity account and its profile document.
    pub async fn signup(&self, req: &SignupRequest) -> Result<SignupOutcome, AppError> {
        let store = match &self.admin {
            Admin::Ready { store } => store,
            Admin::Unavailable { reason } => {
                return Err(AppError::Configuration(reason.clone()));
            }
        };

        let (Some(name), Some(email), Some(password)) = (
            required(&req.name),
            required(&req.email),
            required(&req.password),
        ) else {
            return Err(AppError::Validation(MISSING_SIGNUP_FIELDS));
        };

        let user = self
            .identity
            .create_user(email, password, name)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Signup rejected by identity provider");
                AppError::Upstream(e.upstream_message())
            })?;

        let profile = NewProfile {
            uid: user.uid.clone(),
            name: name.to_string(),
            email: email.to_string(),
            photo_url: None,
            provider: AuthProvider::Password,
        };

        // The account already exists at this point and stays if this fails.
        store.create_profile(&profile).await.map_err(|e| {
            tracing::error!(uid = %user.uid, error = %e, "Profile write failed after account creation");
            AppError::Upstream(UpstreamMessage(e.0))
        })?;

        tracing::info!(uid = %user.uid, "User registered");
        Ok(SignupOutcome { uid: user.uid })
    }

    /// Exchange email/password for an ID token and look up the display name.
    pub async fn login(&self, req: &LoginRequest) -> Result<LoginOutcome, AppError> {
        let (Some(email), Some(password)) = (required(&req.email), required(&req.password)) else {
            return Err(AppError::Validation(MISSING_LOGIN_FIELDS));
        };

        let session = self
            .identity
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Login failed");
                AppError::InvalidCredentials
            })?;

        let name = match &self.admin {
            Admin::Ready { store } => store
                .get_profile(&session.local_id)
                .await
                .map_err(|e| {
                    tracing::warn!(uid = %session.local_id, error = %e, "Login profile lookup failed");
                    AppError::InvalidCredentials
                })?
                .map(|profile| profile.name),
            Admin::Unavailable { .. } => None,
        }
        .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());

        tracing::info!(uid = %session.local_id, "Login successful");
        Ok(LoginOutcome {
            id_token: session.id_token,
            user_id: session.local_id,
            name,
            email: email.to_string(),
        })
    }

    /// Verify a Google ID token and create or refresh the profile.
    ///
    /// The response is built from the verified claims, not from the stored
    /// document, so a concurrent write to the same profile is not reflected.
    pub async fn google_sign_in(
        &self,
        req: &GoogleSignInRequest,
    ) -> Result<GoogleOutcome, AppError> {
        let Some(id_token) = required(&req.id_token) else {
            return Err(AppError::Validation(MISSING_ID_TOKEN));
        };

        let store = match &self.admin {
            Admin::Ready { store } => store,
            Admin::Unavailable { reason } => {
                tracing::warn!(reason = %reason, "Google sign-in attempted without admin backend");
                return Err(AppError::InvalidGoogleToken);
            }
        };

        let identity = self
            .identity
            .verify_id_token(id_token)
            .await
            .map_err(|e| google_failure("verify", e))?;

        let name = identity
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_GOOGLE_NAME.to_string());

        let existing = store
            .get_profile(&identity.uid)
            .await
            .map_err(|e| google_failure("lookup", e))?;

        if existing.is_none() {
            let profile = NewProfile {
                uid: identity.uid.clone(),
                name: name.clone(),
                email: identity.email.clone().unwrap_or_default(),
                photo_url: identity.picture.clone(),
                provider: AuthProvider::Google,
            };
            store
                .create_profile(&profile)
                .await
                .map_err(|e| google_failure("create", e))?;
            tracing::info!(uid = %identity.uid, "Google profile created");
        } else {
            store
                .record_login(&identity.uid, identity.picture.as_deref())
                .await
                .map_err(|e| google_failure("update", e))?;
            tracing::info!(uid = %identity.uid, "Google profile refreshed");
        }

        Ok(GoogleOutcome {
            uid: identity.uid,
            name,
            email: identity.email,
            photo_url: identity.picture,
        })
    }
}
