// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed cache store.
//!
//! One collection per [`CacheCategory`]; each document carries the owning
//! Dailymile username in its `owner` field.

use crate::error::AppError;
use crate::services::cache::{CacheCategory, CacheStore, CachedRecord};
use async_trait::async_trait;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore cache store client.
#[derive(Clone)]
pub struct FirestoreCacheStore {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreCacheStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Cache(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
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
        .map_err(|e| AppError::Cache(format!("Failed to connect to Firestore Emulator: {}", e)))?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Offline store for tests; every operation fails.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Cache("Cache store not connected (offline mode)".to_string()))
    }

    /// Delete documents in transactional chunks.
    async fn batch_delete(&self, records: &[CachedRecord], collection: &str) -> Result<(), AppError> {
        let client = self.get_client()?;

        for chunk in records.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Cache(format!("Failed to begin transaction: {}", e)))?;

            for record in chunk {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(document_id(record))
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Cache(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction
                .commit()
                .await
                .map_err(|e| AppError::Cache(format!("Failed to commit batch deletion: {}", e)))?;
        }

        Ok(())
    }
}

/// Document id: owner and record id, URL-encoded so `/` cannot nest paths.
fn document_id(record: &CachedRecord) -> String {
    format!(
        "{}_{}",
        urlencoding::encode(&record.owner),
        urlencoding::encode(&record.record_id)
    )
}

#[async_trait]
impl CacheStore for FirestoreCacheStore {
    async fn store(&self, category: CacheCategory, record: CachedRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(category.collection())
            .document_id(document_id(&record))
            .object(&record)
            .execute()
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        Ok(())
    }

    async fn remove_by_owner(&self, owner: &str, category: CacheCategory) -> Result<usize, AppError> {
        let owner_value = owner.to_string();
        let records: Vec<CachedRecord> = self
            .get_client()?
            .fluent()
            .select()
            .from(category.collection())
            .filter(|q| q.for_all([q.field("owner").eq(owner_value.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;

        let count = records.len();
        self.batch_delete(&records, category.collection()).await?;

        tracing::debug!(owner, collection = category.collection(), count, "Removed cached records");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_escapes_path_separators() {
        let record = CachedRecord {
            owner: "a/b".to_string(),
            record_id: "entries page 1".to_string(),
            payload: serde_json::Value::Null,
            cached_at: "2013-06-01T14:30:05Z".to_string(),
        };
        assert_eq!(document_id(&record), "a%2Fb_entries%20page%201");
    }

    #[tokio::test]
    async fn test_offline_store_reports_cache_error() {
        let store = FirestoreCacheStore::new_mock();
        let err = store
            .remove_by_owner("runner", CacheCategory::General)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Cache(_)));
    }
}
