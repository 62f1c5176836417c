//! In-memory dedup store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{DedupStore, InsertOutcome, Lookup};
use crate::error::StoreError;
use crate::model::SeenRecord;

type Key = (String, String);

/// Process-local ledger keyed by `(url, site)`.
///
/// Expired records are treated as absent on read and replaced on insert, which
/// mirrors a store that sweeps them lazily.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<Key, SeenRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_at(&self, url: &str, site: &str, now: DateTime<Utc>) -> Lookup {
        let records = self.records.read().await;
        match records.get(&(url.to_string(), site.to_string())) {
            Some(rec) if rec.is_live_at(now) => Lookup::Found(rec.clone()),
            _ => Lookup::NotFound,
        }
    }

    pub async fn insert_at(&self, record: &SeenRecord, now: DateTime<Utc>) -> InsertOutcome {
        let mut records = self.records.write().await;
        let key = (record.url.clone(), record.site.clone());
        match records.get(&key) {
            Some(existing) if existing.is_live_at(now) => InsertOutcome::AlreadyExists,
            _ => {
                records.insert(key, record.clone());
                InsertOutcome::Inserted
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// All stored records, including expired ones, sorted by `(site, url)`.
    pub async fn records(&self) -> Vec<SeenRecord> {
        let mut out: Vec<SeenRecord> = self.records.read().await.values().cloned().collect();
        out.sort_by(|a, b| (&a.site, &a.url).cmp(&(&b.site, &b.url)));
        out
    }
}

#[async_trait]
impl DedupStore for MemoryStore {
    async fn get(&self, url: &str, site: &str) -> Result<Lookup, StoreError> {
        Ok(self.get_at(url, site, Utc::now()).await)
    }

    async fn insert(&self, record: &SeenRecord) -> Result<InsertOutcome, StoreError> {
        Ok(self.insert_at(record, Utc::now()).await)
    }
}
