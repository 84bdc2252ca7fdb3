// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cached Dailymile data and its invalidation.
//!
//! Records are keyed by owner (the Dailymile username) within one of two
//! categories. Invalidating an account with nothing cached is not an error.

use crate::error::Result;
use crate::models::RemoteCredential;
use crate::services::sync::DailymileService;
use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};

/// Kinds of cached records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    /// Account-level responses
    General,
    /// Per-activity responses
    Activity,
}

impl CacheCategory {
    pub const ALL: [CacheCategory; 2] = [CacheCategory::General, CacheCategory::Activity];

    /// Collection (or table) name in a persistent store.
    pub fn collection(self) -> &'static str {
        match self {
            CacheCategory::General => "dailymile_cache",
            CacheCategory::Activity => "dailymile_activity_cache",
        }
    }
}

/// One cached record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRecord {
    /// Dailymile username
    pub owner: String,
    pub record_id: String,
    pub payload: serde_json::Value,
    /// When this record was cached (ISO 8601)
    pub cached_at: String,
}

/// Persistent cache shared with the rest of the platform.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Insert or replace a record.
    async fn store(&self, category: CacheCategory, record: CachedRecord) -> Result<()>;

    /// Remove every record of `category` owned by `owner`; returns the count.
    async fn remove_by_owner(&self, owner: &str, category: CacheCategory) -> Result<usize>;
}

/// Process-local cache store.
#[derive(Default)]
pub struct InMemoryCacheStore {
    records: DashMap<(CacheCategory, String), Vec<CachedRecord>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held for `owner` in `category`.
    pub fn count(&self, owner: &str, category: CacheCategory) -> usize {
        self.records
            .get(&(category, owner.to_string()))
            .map(|records| records.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn store(&self, category: CacheCategory, record: CachedRecord) -> Result<()> {
        let mut records = self
            .records
            .entry((category, record.owner.clone()))
            .or_default();
        records.retain(|r| r.record_id != record.record_id);
        records.push(record);
        Ok(())
    }

    async fn remove_by_owner(&self, owner: &str, category: CacheCategory) -> Result<usize> {
        Ok(self
            .records
            .remove(&(category, owner.to_string()))
            .map(|(_, records)| records.len())
            .unwrap_or(0))
    }
}

impl DailymileService {
    /// Drop everything cached for the credential's account.
    pub async fn delete_cached_data(&self, credential: &RemoteCredential) -> Result<()> {
        let removed: usize = try_join_all(
            CacheCategory::ALL
                .iter()
                .map(|category| self.cache.remove_by_owner(&credential.username, *category)),
        )
        .await?
        .into_iter()
        .sum();

        tracing::info!(username = %credential.username, removed, "Cached data invalidated");
        Ok(())
    }
}
