// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The service-account key file and the web API key are both optional at
//! startup: their absence degrades the affected routes instead of aborting.

use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_KEY_PATH: &str = "serviceAccountKey.json";
const DEFAULT_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Path to the service-account key file (service identity)
    pub service_account_path: PathBuf,
    /// Web API key for password sign-in
    pub web_api_key: Option<String>,
    /// Identity Toolkit REST base URL (no trailing slash)
    pub identity_toolkit_url: String,
    /// Project override; defaults to the key file's `project_id`
    pub project_id: Option<String>,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            service_account_path: env::var("SERVICE_ACCOUNT_KEY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_KEY_PATH)),
            web_api_key: non_empty_var("FIREBASE_WEB_API_KEY"),
            identity_toolkit_url: non_empty_var("IDENTITY_TOOLKIT_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_TOOLKIT_URL.to_string()),
            project_id: non_empty_var("FIREBASE_PROJECT_ID"),
        }
    }

    /// Config for tests: no key file, no API key.
    pub fn test_default() -> Self {
        Self {
            port: DEFAULT_PORT,
            service_account_path: PathBuf::from("does-not-exist.json"),
            web_api_key: None,
            identity_toolkit_url: DEFAULT_TOOLKIT_URL.to_string(),
            project_id: Some("travel-auth-test".to_string()),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Google service-account key, as downloaded from the cloud console.
///
/// Only the fields the gateway reads itself are kept; token minting goes
/// through `gcloud-sdk`, which reads the same file.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub client_email: String,
    private_key: String,
}

// Keeps the private key out of logs.
impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Read and parse a key file. The private key must be a usable RSA PEM.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::Missing(path.display().to_string())
            } else {
                ConfigError::Unreadable(format!("{}: {}", path.display(), e))
            }
        })?;

        let key: Self = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::Malformed(format!("{}: {}", path.display(), e)))?;

        if key.private_key.trim().is_empty() || key.client_email.trim().is_empty() {
            return Err(ConfigError::Malformed(format!(
                "{}: private_key and client_email must be set",
                path.display()
            )));
        }

        jsonwebtoken::EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            ConfigError::Malformed(format!(
                "{}: private_key is not an RSA PEM: {}",
                path.display(),
                e
            ))
        })?;

        Ok(key)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Service account key not found: {0}")]
    Missing(String),

    #[error("Service account key unreadable: {0}")]
    Unreadable(String),

    #[error("Service account key malformed: {0}")]
    Malformed(String),
}
