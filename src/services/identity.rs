// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider abstraction.
//!
//! The gateway never authenticates anyone itself: user creation, password
//! verification and ID-token verification all go through this trait.

use crate::error::UpstreamMessage;
use async_trait::async_trait;

/// A user account created by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedUser {
    pub uid: String,
}

/// Result of a successful password-grant exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordSession {
    /// Provider-issued ID token for the client
    pub id_token: String,
    /// Subject id of the signed-in user
    pub local_id: String,
}

impl std::fmt::Debug for PasswordSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordSession")
            .field("local_id", &self.local_id)
            .finish_non_exhaustive()
    }
}

/// Claims of a verified ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

/// Identity provider failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdentityError {
    /// The provider refused the request; the message is the provider's own.
    #[error("{0}")]
    Rejected(String),

    #[error("Identity provider not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Identity provider request failed: {0}")]
    Transport(String),

    #[error("Invalid ID token: {0}")]
    InvalidToken(String),
}

impl IdentityError {
    /// Message safe to hand back to a signup caller.
    pub fn upstream_message(&self) -> UpstreamMessage {
        match self {
            IdentityError::Rejected(msg) => UpstreamMessage(msg.clone()),
            other => UpstreamMessage(other.to_string()),
        }
    }
}

/// External credential service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an email/password account.
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<CreatedUser, IdentityError>;

    /// Verify an ID token's signature and claims.
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError>;

    /// Exchange email/password for an ID token (one round trip, no retry).
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<PasswordSession, IdentityError>;
}

/// Deterministic in-memory provider for tests.
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub const EMAIL_EXISTS: &str = "The email address is already in use by another account.";
    pub const WEAK_PASSWORD: &str = "The password must be a string with at least 6 characters.";
    pub const INVALID_LOGIN: &str = "INVALID_LOGIN_CREDENTIALS";

    #[derive(Clone)]
    struct Account {
        uid: String,
        password: String,
    }

    #[derive(Default)]
    pub struct MockIdentityProvider {
        accounts: Mutex<HashMap<String, Account>>, // key: email
        id_tokens: Mutex<HashMap<String, VerifiedIdentity>>,
        next_id: AtomicUsize,
        calls: AtomicUsize,
    }

    impl MockIdentityProvider {
        pub fn new() -> Self {
            Self::default()
        }

        /// Accept `token` as a valid ID token carrying `identity`.
        pub fn register_id_token(&self, token: &str, identity: VerifiedIdentity) {
            self.id_tokens
                .lock()
                .unwrap()
                .insert(token.to_string(), identity);
        }

        /// Number of accounts created so far.
        pub fn account_count(&self) -> usize {
            self.accounts.lock().unwrap().len()
        }

        pub fn uid_for(&self, email: &str) -> Option<String> {
            self.accounts
                .lock()
                .unwrap()
                .get(email)
                .map(|a| a.uid.clone())
        }

        /// Total calls across all operations.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityProvider for MockIdentityProvider {
        async fn create_user(
            &self,
            email: &str,
            password: &str,
            _display_name: &str,
        ) -> Result<CreatedUser, IdentityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if password.len() < 6 {
                return Err(IdentityError::Rejected(WEAK_PASSWORD.to_string()));
            }

            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(email) {
                return Err(IdentityError::Rejected(EMAIL_EXISTS.to_string()));
            }

            let uid = format!("uid-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            accounts.insert(
                email.to_string(),
                Account {
                    uid: uid.clone(),
                    password: password.to_string(),
                },
            );
            Ok(CreatedUser { uid })
        }

        async fn verify_id_token(
            &self,
            id_token: &str,
        ) -> Result<VerifiedIdentity, IdentityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.id_tokens
                .lock()
                .unwrap()
                .get(id_token)
                .cloned()
                .ok_or_else(|| IdentityError::InvalidToken("unknown or expired token".to_string()))
        }

        async fn sign_in_with_password(
            &self,
            email: &str,
            password: &str,
        ) -> Result<PasswordSession, IdentityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let accounts = self.accounts.lock().unwrap();
            match accounts.get(email) {
                Some(account) if account.password == password => Ok(PasswordSession {
                    id_token: format!("id-token-for-{}", account.uid),
                    local_id: account.uid.clone(),
                }),
                _ => Err(IdentityError::Rejected(INVALID_LOGIN.to_string())),
            }
        }
    }
}
