// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication adapter (Identity Toolkit REST API).
//!
//! Handles:
//! - Password sign-in with the web API key
//! - Account creation with a service-account OAuth token
//! - ID token verification (delegated to [`IdTokenVerifier`])

use super::id_token::IdTokenVerifier;
use super::identity::{
    CreatedUser, IdentityError, IdentityProvider, PasswordSession, VerifiedIdentity,
};
use crate::config::Config;
use anyhow::Context;
use async_trait::async_trait;
use gcloud_sdk::{GoogleAuthTokenGenerator, TokenSourceType};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const OAUTH_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/identitytoolkit",
];
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity provider backed by Firebase Authentication.
pub struct FirebaseIdentity {
    http: reqwest::Client,
    toolkit_url: String,
    api_key: Option<String>,
    admin: Option<AdminAuth>,
}

/// Service-account side: account management and token verification.
struct AdminAuth {
    project_id: String,
    tokens: GoogleAuthTokenGenerator,
    verifier: IdTokenVerifier,
}

impl FirebaseIdentity {
    /// Password sign-in only; admin operations report `NotConfigured`.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::build(config, None)
    }

    /// Full adapter authenticated as the service account.
    ///
    /// `tokens` is normally `TokenSourceType::File` over the key file;
    /// `gcloud-sdk` mints and caches the OAuth access tokens.
    pub async fn with_service_account(
        config: &Config,
        project_id: &str,
        tokens: TokenSourceType,
    ) -> anyhow::Result<Self> {
        let verifier = IdTokenVerifier::new(project_id)?;
        Self::with_verifier(config, project_id, tokens, verifier).await
    }

    /// Full adapter with a caller-supplied token verifier.
    pub async fn with_verifier(
        config: &Config,
        project_id: &str,
        tokens: TokenSourceType,
        verifier: IdTokenVerifier,
    ) -> anyhow::Result<Self> {
        let scopes = OAUTH_SCOPES.iter().map(|s| s.to_string()).collect();
        let tokens = GoogleAuthTokenGenerator::new(tokens, scopes)
            .await
            .context("failed creating service account token source")?;

        let admin = AdminAuth {
            project_id: project_id.to_string(),
            tokens,
            verifier,
        };
        Self::build(config, Some(admin))
    }

    fn build(config: &Config, admin: Option<AdminAuth>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building identity HTTP client")?;

        Ok(Self {
            http,
            toolkit_url: config.identity_toolkit_url.clone(),
            api_key: config.web_api_key.clone(),
            admin,
        })
    }

    fn admin(&self) -> Result<&AdminAuth, IdentityError> {
        self.admin
            .as_ref()
            .ok_or(IdentityError::NotConfigured("service account key missing"))
    }
}

impl AdminAuth {
    /// `Authorization` header value for the service account.
    async fn bearer(&self) -> Result<String, IdentityError> {
        let token = self.tokens.create_token().await.map_err(|e| {
            IdentityError::Transport(format!("service account token unavailable: {e}"))
        })?;
        Ok(format!(
            "{} {}",
            token.token_type,
            token.token.as_sensitive_str()
        ))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<CreatedUser, IdentityError> {
        let admin = self.admin()?;
        let bearer = admin.bearer().await?;

        let url = format!(
            "{}/v1/projects/{}/accounts",
            self.toolkit_url,
            urlencoding::encode(&admin.project_id)
        );

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, bearer)
            .json(&CreateAccountRequest {
                email,
                password,
                display_name,
            })
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let code = error_message(response).await;
            return Err(IdentityError::Rejected(account_error_message(&code)));
        }

        let created: CreateAccountResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Transport(format!("invalid signup response: {e}")))?;

        tracing::info!(uid = %created.local_id, "Identity account created");
        Ok(CreatedUser {
            uid: created.local_id,
        })
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError> {
        self.admin()?.verifier.verify(id_token).await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<PasswordSession, IdentityError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(IdentityError::NotConfigured("FIREBASE_WEB_API_KEY missing"))?;

        let url = format!("{}/v1/accounts:signInWithPassword", self.toolkit_url);

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&PasswordSignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::Rejected(error_message(response).await));
        }

        let session: PasswordSignInResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Transport(format!("invalid sign-in response: {e}")))?;

        Ok(PasswordSession {
            id_token: session.id_token,
            local_id: session.local_id,
        })
    }
}

/// Pull `error.message` out of an Identity Toolkit error body.
async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ToolkitErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => {
            tracing::debug!(status = %status, "Identity Toolkit error without JSON body");
            "Authentication failed".to_string()
        }
    }
}

/// Turn Identity Toolkit account error codes into user-facing sentences.
fn account_error_message(code: &str) -> String {
    let head = code.split(':').next().unwrap_or(code).trim();
    match head {
        "EMAIL_EXISTS" | "DUPLICATE_EMAIL" => {
            "The email address is already in use by another account.".to_string()
        }
        "INVALID_EMAIL" => "The email address is improperly formatted.".to_string(),
        "WEAK_PASSWORD" | "INVALID_PASSWORD" => {
            "The password must be a string with at least 6 characters.".to_string()
        }
        _ => code.to_string(),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAccountRequest<'a> {
    email: &'a str,
    password: &'a str,
    display_name: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAccountResponse {
    local_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordSignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordSignInResponse {
    id_token: String,
    local_id: String,
}

#[derive(Deserialize)]
struct ToolkitErrorBody {
    error: ToolkitError,
}

#[derive(Deserialize)]
struct ToolkitError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_error_codes_are_humanized() {
        assert_eq!(
            account_error_message("EMAIL_EXISTS"),
            "The email address is already in use by another account."
        );
        assert_eq!(
            account_error_message("WEAK_PASSWORD : Password should be at least 6 characters"),
            "The password must be a string with at least 6 characters."
        );
        assert_eq!(account_error_message("QUOTA_EXCEEDED"), "QUOTA_EXCEEDED");
    }

    #[tokio::test]
    async fn sign_in_without_api_key_is_not_configured() {
        let identity = FirebaseIdentity::new(&Config::test_default()).unwrap();
        let err = identity
            .sign_in_with_password("a@example.com", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn admin_operations_without_key_are_not_configured() {
        let identity = FirebaseIdentity::new(&Config::test_default()).unwrap();

        assert!(matches!(
            identity.create_user("a@example.com", "secret1", "A").await,
            Err(IdentityError::NotConfigured(_))
        ));
        assert!(matches!(
            identity.verify_id_token("token").await,
            Err(IdentityError::NotConfigured(_))
        ));
    }
}
