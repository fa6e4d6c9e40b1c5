// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model for storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the user authenticates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    #[default]
    Password,
    Google,
}

/// User profile stored in the `users` collection, keyed by uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Provider-issued subject id (also the document id)
    pub uid: String,
    /// Display name
    pub name: String,
    pub email: String,
    /// Profile picture URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Older documents predate this field and read back as `password`
    #[serde(default)]
    pub provider: AuthProvider,
    /// Stamped by the store when the document is created
    pub created_at: DateTime<Utc>,
    /// Stamped by the store on each federated sign-in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

/// Profile fields supplied by the gateway when a document is first written.
///
/// Timestamps are not part of this type: the store assigns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub provider: AuthProvider,
}

impl NewProfile {
    /// Whether the store should also stamp `lastLogin` on creation.
    pub fn stamps_login(&self) -> bool {
        self.provider == AuthProvider::Google
    }

    /// Materialize the stored document at the given write time.
    pub fn into_profile(self, now: DateTime<Utc>) -> UserProfile {
        let last_login = self.stamps_login().then_some(now);
        UserProfile {
            uid: self.uid,
            name: self.name,
            email: self.email,
            photo_url: self.photo_url,
            provider: self.provider,
            created_at: now,
            last_login,
        }
    }
}
