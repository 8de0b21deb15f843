//! Typed reference-data queries for one filing session.
//!
//! `BusinessQueryService` wraps a `ReferenceDataSource` (the registry API
//! client, injected) with one deduplicating cache per resource, and seeds
//! edit-tracking tables from the results. This is the session control flow:
//! fetch reference data, seed a table, let the user edit, snapshot into the
//! filing payload.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::QueryDedupCache;
use crate::entity::{Office, Party, ShareClass, ShareSeries};
use crate::error::{FetchResult, QueryError, Result};
use crate::table::{EntityChangeTable, ShareStructureTable};

/// The registry API surface the session core reads from. Implementations
/// own transport concerns (HTTP, auth headers, timeouts, retries); the cache
/// treats every method as opaque and rethrows its errors verbatim.
#[async_trait]
pub trait ReferenceDataSource: Send + Sync {
    async fn parties(&self, business_id: &str) -> FetchResult<Vec<Party>>;

    async fn offices(&self, business_id: &str) -> FetchResult<Vec<Office>>;

    async fn share_classes(
        &self,
        business_id: &str,
    ) -> FetchResult<Vec<(ShareClass, Vec<ShareSeries>)>>;
}

/// Per-resource caches keyed by business identifier, sharing one staleness
/// policy.
pub struct BusinessQueryService {
    source: Arc<dyn ReferenceDataSource>,
    party_cache: QueryDedupCache<String, Vec<Party>>,
    office_cache: QueryDedupCache<String, Vec<Office>>,
    share_cache: QueryDedupCache<String, Vec<(ShareClass, Vec<ShareSeries>)>>,
}

impl BusinessQueryService {
    pub fn new(source: Arc<dyn ReferenceDataSource>, stale_time: Option<Duration>) -> Self {
        Self {
            source,
            party_cache: QueryDedupCache::new(stale_time),
            office_cache: QueryDedupCache::new(stale_time),
            share_cache: QueryDedupCache::new(stale_time),
        }
    }

    pub async fn parties(&self, business_id: &str, force: bool) -> Result<Vec<Party>, QueryError> {
        let source = self.source.clone();
        let key = business_id.to_string();
        let id = key.clone();
        self.party_cache
            .get_or_fetch(&key, || async move { source.parties(&id).await }, force)
            .await
    }

    pub async fn offices(&self, business_id: &str, force: bool) -> Result<Vec<Office>, QueryError> {
        let source = self.source.clone();
        let key = business_id.to_string();
        let id = key.clone();
        self.office_cache
            .get_or_fetch(&key, || async move { source.offices(&id).await }, force)
            .await
    }

    pub async fn share_classes(
        &self,
        business_id: &str,
        force: bool,
    ) -> Result<Vec<(ShareClass, Vec<ShareSeries>)>, QueryError> {
        let source = self.source.clone();
        let key = business_id.to_string();
        let id = key.clone();
        self.share_cache
            .get_or_fetch(
                &key,
                || async move { source.share_classes(&id).await },
                force,
            )
            .await
    }

    /// Fetch (or serve cached) parties and seed a fresh change table. The
    /// table owns deep copies — edits never leak back into the cache.
    pub async fn party_table(&self, business_id: &str) -> Result<EntityChangeTable<Party>> {
        let mut table = EntityChangeTable::new();
        table.seed(self.parties(business_id, false).await?);
        Ok(table)
    }

    pub async fn office_table(&self, business_id: &str) -> Result<EntityChangeTable<Office>> {
        let mut table = EntityChangeTable::new();
        table.seed(self.offices(business_id, false).await?);
        Ok(table)
    }

    pub async fn share_structure(&self, business_id: &str) -> Result<ShareStructureTable> {
        let mut table = ShareStructureTable::new();
        table.seed(self.share_classes(business_id, false).await?);
        Ok(table)
    }
}
