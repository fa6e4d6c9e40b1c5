// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: the profile document store.

pub mod firestore;
pub mod mock;

pub use self::firestore::FirestoreProfileStore;

use crate::models::{NewProfile, UserProfile};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// Document store failure. The message is the store's own wording.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Keyed profile documents in the `users` collection.
///
/// Implementations assign `createdAt`/`lastLogin` themselves at write time.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get a profile by uid.
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Write a new profile document, replacing anything at the same uid.
    async fn create_profile(&self, profile: &NewProfile) -> Result<(), StoreError>;

    /// Stamp `lastLogin` and overwrite `photoUrl`, leaving other fields alone.
    async fn record_login(&self, uid: &str, photo_url: Option<&str>) -> Result<(), StoreError>;
}
