// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed profile store.
//!
//! Connects with the service-account key file, or unauthenticated when
//! `FIRESTORE_EMULATOR_HOST` is set. `createdAt` and `lastLogin` are set by
//! Firestore itself through server-request-time field transforms.

use super::{collections, DocumentStore, StoreError};
use crate::models::{AuthProvider, NewProfile, UserProfile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

const CREATED_AT: &str = "createdAt";
const LAST_LOGIN: &str = "lastLogin";

/// Profile fields written by the gateway. Timestamps are transforms.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileFields {
    uid: String,
    name: String,
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_url: Option<String>,
    provider: AuthProvider,
}

impl From<&NewProfile> for ProfileFields {
    fn from(profile: &NewProfile) -> Self {
        Self {
            uid: profile.uid.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            photo_url: profile.photo_url.clone(),
            provider: profile.provider,
        }
    }
}

/// Photo field refreshed by a federated sign-in on an existing profile.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhotoStamp {
    photo_url: Option<String>,
}

/// Firestore profile store.
#[derive(Clone)]
pub struct FirestoreProfileStore {
    client: firestore::FirestoreDb,
}

impl FirestoreProfileStore {
    /// Connect using the service-account key file.
    pub async fn new(project_id: &str, key_path: &Path) -> Result<Self, StoreError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::with_options_token_source(
            firestore::FirestoreDbOptions::new(project_id.to_string()),
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::File(key_path.to_path_buf()),
        )
        .await
        .map_err(|e| StoreError(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let client = firestore::FirestoreDb::with_options_token_source(
            firestore::FirestoreDbOptions::new(project_id.to_string()),
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| StoreError(format!("Failed to connect to Firestore Emulator: {}", e)))?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentStore for FirestoreProfileStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| StoreError(e.to_string()))
    }

    async fn create_profile(&self, profile: &NewProfile) -> Result<(), StoreError> {
        let stamps_login = profile.stamps_login();
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.uid)
            .object(&ProfileFields::from(profile))
            .transforms(|t| {
                let mut stamps = vec![t.field(CREATED_AT).server_value(firestore::FirestoreTransformServerValue::RequestTime)];
                if stamps_login {
                    stamps.push(t.field(LAST_LOGIN).server_value(firestore::FirestoreTransformServerValue::RequestTime));
                }
                t.fields(stamps)
            })
            .execute()
            .await
            .map_err(|e| StoreError(e.to_string()))?;
        Ok(())
    }

    async fn record_login(&self, uid: &str, photo_url: Option<&str>) -> Result<(), StoreError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .fields(["photoUrl"])
            .in_col(collections::USERS)
            .document_id(uid)
            .object(&PhotoStamp {
                photo_url: photo_url.map(str::to_string),
            })
            .transforms(|t| t.fields([t.field(LAST_LOGIN).server_value(firestore::FirestoreTransformServerValue::RequestTime)]))
            .execute()
            .await
            .map_err(|e| StoreError(e.to_string()))?;
        Ok(())
    }
}
