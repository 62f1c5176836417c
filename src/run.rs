//! One notifier run: fetch, aggregate, notify, persist.
//!
//! The path is linear with no retries. Failure policy per step:
//! - fetch failure aborts before anything is sent or stored;
//! - a failed dedup lookup only suppresses that article;
//! - delivery failure aborts before persistence, so the same articles are
//!   offered again on the next run;
//! - a persistence failure stops at the failing insert and keeps earlier ones.
//!
//! Overlapping runs are not locked against each other. Two runs may both
//! notify the same article; their inserts are idempotent.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, instrument};

use crate::aggregate::{aggregate, SiteFeed};
use crate::digest::{format_batch, DEFAULT_HEADER};
use crate::error::RunError;
use crate::notify::Notifier;
use crate::persist::persist;
use crate::source::SourceAdapter;
use crate::store::DedupStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every fetched article was already delivered (or suppressed).
    NothingNew { fetched: usize },
    /// One digest was sent and its articles recorded.
    Notified {
        sites: usize,
        articles: usize,
        persisted: usize,
        already_present: usize,
    },
}

pub struct Runner {
    sources: Vec<Arc<dyn SourceAdapter>>,
    store: Arc<dyn DedupStore>,
    notifier: Arc<dyn Notifier>,
    header: String,
    retention: Duration,
}

impl Runner {
    pub fn new(
        sources: Vec<Arc<dyn SourceAdapter>>,
        store: Arc<dyn DedupStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            sources,
            store,
            notifier,
            header: DEFAULT_HEADER.to_string(),
            retention: Duration::days(7),
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub async fn run_once(&self) -> Result<RunOutcome, RunError> {
        self.run_once_at(Utc::now()).await
    }

    #[instrument(skip_all, fields(sources = self.sources.len()))]
    pub async fn run_once_at(&self, now: DateTime<Utc>) -> Result<RunOutcome, RunError> {
        let feeds = self.fetch_all().await?;
        let fetched: usize = feeds.iter().map(|f| f.articles.len()).sum();

        let batch = aggregate(&feeds, self.store.as_ref()).await;
        if batch.is_empty() {
            info!(fetched, "no new articles");
            return Ok(RunOutcome::NothingNew { fetched });
        }

        let message = format_batch(&batch, &self.header);
        if let Err(err) = self.notifier.publish(&message).await {
            error!(?err, articles = batch.article_count(), "digest delivery failed");
            return Err(err.into());
        }
        info!(
            sites = batch.sites().len(),
            articles = batch.article_count(),
            "digest delivered"
        );

        let stats = persist(&batch, self.store.as_ref(), now, self.retention)
            .await
            .map_err(|err| {
                error!(?err, "recording delivered articles failed");
                RunError::Persist(err)
            })?;
        info!(
            inserted = stats.inserted,
            already_present = stats.already_present,
            "delivered articles recorded"
        );

        Ok(RunOutcome::Notified {
            sites: batch.sites().len(),
            articles: batch.article_count(),
            persisted: stats.inserted,
            already_present: stats.already_present,
        })
    }

    async fn fetch_all(&self) -> Result<Vec<SiteFeed>, RunError> {
        let mut feeds = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let site = source.site().to_string();
            let articles = source.fetch().await.map_err(|err| {
                error!(?err, %site, "fetch failed");
                RunError::Fetch {
                    site: site.clone(),
                    source: err,
                }
            })?;
            info!(%site, count = articles.len(), "fetched");
            feeds.push(SiteFeed { site, articles });
        }
        Ok(feeds)
    }
}
