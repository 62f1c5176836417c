//! Dedup store: the delivery ledger keyed by `(url, site)`.
//!
//! - `sqlite`: production store backed by sqlx/SQLite.
//! - `memory`: in-process store with the same expiry semantics.
//!
//! Expired records must be unreachable through [`DedupStore::get`]; physical
//! removal is left to the store and never requested by the pipeline.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::SeenRecord;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(SeenRecord),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

#[async_trait]
pub trait DedupStore: Send + Sync {
    async fn get(&self, url: &str, site: &str) -> Result<Lookup, StoreError>;

    async fn insert(&self, record: &SeenRecord) -> Result<InsertOutcome, StoreError>;
}
