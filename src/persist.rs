//! Record delivered articles in the dedup ledger.
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::model::{NotificationBatch, SeenRecord};
use crate::store::{DedupStore, InsertOutcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistStats {
    pub inserted: usize,
    pub already_present: usize,
}

/// Insert one `SeenRecord` per batch entry, in batch order.
///
/// `AlreadyExists` counts as success. The first other failure stops the loop
/// and is returned; earlier inserts stay in place.
#[instrument(skip_all, fields(articles = batch.article_count()))]
pub async fn persist(
    batch: &NotificationBatch,
    store: &dyn DedupStore,
    now: DateTime<Utc>,
    retention: Duration,
) -> Result<PersistStats, StoreError> {
    let mut stats = PersistStats::default();
    for (site, entry) in batch.iter() {
        let record = SeenRecord::new(site, entry, now, retention);
        match store.insert(&record).await? {
            InsertOutcome::Inserted => stats.inserted += 1,
            InsertOutcome::AlreadyExists => {
                debug!(%site, url = %entry.url, "already recorded by another run");
                stats.already_present += 1;
            }
        }
    }
    Ok(stats)
}
