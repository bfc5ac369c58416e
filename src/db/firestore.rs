// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed document operations.
//!
//! Every record in the application is a JSON-shaped document addressed by
//! `(collection, id)`. Per-user records carry a `user_id` field that the
//! list operations filter on. The same operations are served by an
//! in-memory store for local development and tests.

use crate::db::collections;
use crate::error::AppError;
use crate::models::User;
use dashmap::DashMap;
use futures_util::{stream, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Documents held by the in-memory backend: collection -> id -> document.
type MemoryStore = DashMap<String, DashMap<String, serde_json::Value>>;

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
    Offline,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

fn db_err(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator does not accept real credentials.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
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

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a process-local store. Used for local development and tests.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    /// Create a client with no backend (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    fn offline() -> AppError {
        AppError::Database("Database not connected (offline mode)".to_string())
    }

    // ─── Generic Document Operations ─────────────────────────────

    /// Fetch a document by ID.
    pub async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collection)
                .obj()
                .one(id)
                .await
                .map_err(db_err),
            Backend::Memory(store) => {
                let value = match store.get(collection) {
                    Some(docs) => docs.get(id).map(|doc| doc.value().clone()),
                    None => None,
                };
                value
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(db_err)
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Create or replace a document.
    pub async fn set<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(id)
                    .object(doc)
                    .execute()
                    .await
                    .map_err(db_err)?;
                Ok(())
            }
            Backend::Memory(store) => {
                let value = serde_json::to_value(doc).map_err(db_err)?;
                store
                    .entry(collection.to_string())
                    .or_default()
                    .insert(id.to_string(), value);
                Ok(())
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Delete a document. Deleting a missing document is not an error.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(id)
                    .execute()
                    .await
                    .map_err(db_err)?;
                Ok(())
            }
            Backend::Memory(store) => {
                if let Some(docs) = store.get(collection) {
                    docs.remove(id);
                }
                Ok(())
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// List documents whose string `field` equals `value`.
    pub async fn list_by_field<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let value = value.to_string();
                client
                    .fluent()
                    .select()
                    .from(collection)
                    .filter(|q| q.for_all([q.field(field).eq(value.clone())]))
                    .obj()
                    .query()
                    .await
                    .map_err(db_err)
            }
            Backend::Memory(store) => {
                let matches: Vec<serde_json::Value> = match store.get(collection) {
                    Some(docs) => docs
                        .iter()
                        .filter(|doc| {
                            doc.value().get(field).and_then(|v| v.as_str()) == Some(value)
                        })
                        .map(|doc| doc.value().clone())
                        .collect(),
                    None => Vec::new(),
                };
                matches
                    .into_iter()
                    .map(serde_json::from_value)
                    .collect::<Result<Vec<T>, _>>()
                    .map_err(db_err)
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Find the first document whose string `field` equals `value`.
    pub async fn find_one_by_field<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        Ok(self
            .list_by_field(collection, field, value)
            .await?
            .into_iter()
            .next())
    }

    /// List every document in a collection (admin views).
    pub async fn list_all<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collection)
                .obj()
                .query()
                .await
                .map_err(db_err),
            Backend::Memory(store) => {
                let all: Vec<serde_json::Value> = match store.get(collection) {
                    Some(docs) => docs.iter().map(|doc| doc.value().clone()).collect(),
                    None => Vec::new(),
                };
                all.into_iter()
                    .map(serde_json::from_value)
                    .collect::<Result<Vec<T>, _>>()
                    .map_err(db_err)
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Delete many documents from one collection.
    ///
    /// Uses concurrent deletes with a limit to avoid overloading Firestore.
    pub async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<usize, AppError> {
        stream::iter(ids.to_vec())
            .map(|id: String| async move { self.delete(collection, &id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(ids.len())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get(collections::USERS, user_id).await
    }

    /// Look up a user by (lowercased) email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.trim().to_lowercase();
        self.find_one_by_field(collections::USERS, "email", &email)
            .await
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.set(collections::USERS, &user.id, user).await
    }
}
