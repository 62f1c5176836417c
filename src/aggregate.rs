//! Partition fetched articles into already-delivered and new.
use tracing::{debug, instrument, warn};

use crate::model::{Article, NotificationBatch};
use crate::store::{DedupStore, Lookup};

/// Articles fetched from one site in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFeed {
    pub site: String,
    pub articles: Vec<Article>,
}

/// Build the batch of articles the ledger has not seen yet.
///
/// A failed lookup counts as seen: a possibly missed notification is preferred
/// over a possibly duplicated one. Sites without new articles are left out.
#[instrument(skip_all, fields(sites = feeds.len()))]
pub async fn aggregate(feeds: &[SiteFeed], store: &dyn DedupStore) -> NotificationBatch {
    let mut batch = NotificationBatch::new();
    for feed in feeds {
        for article in &feed.articles {
            if batch.contains(&feed.site, &article.url) {
                // Repeated within this fetch: refresh the title, skip the lookup.
                batch.insert(&feed.site, &article.url, &article.title);
                continue;
            }
            match store.get(&article.url, &feed.site).await {
                Ok(Lookup::Found(_)) => {
                    debug!(site = %feed.site, url = %article.url, "already delivered");
                }
                Ok(Lookup::NotFound) => {
                    batch.insert(&feed.site, &article.url, &article.title);
                }
                Err(err) => {
                    warn!(
                        ?err,
                        site = %feed.site,
                        url = %article.url,
                        "dedup lookup failed; treating article as delivered"
                    );
                }
            }
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BatchEntry, SeenRecord};
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};

    fn feed(site: &str, items: &[(&str, &str)]) -> SiteFeed {
        SiteFeed {
            site: site.into(),
            articles: items
                .iter()
                .map(|(url, title)| Article::new(site, *url, *title))
                .collect(),
        }
    }

    async fn mark_seen(store: &MemoryStore, site: &str, url: &str) {
        let entry = BatchEntry {
            url: url.into(),
            title: "old".into(),
        };
        let now = Utc::now();
        store
            .insert_at(&SeenRecord::new(site, &entry, now, Duration::days(7)), now)
            .await;
    }

    #[tokio::test]
    async fn only_unseen_articles_are_batched() {
        let store = MemoryStore::new();
        mark_seen(&store, "a", "A").await;

        let batch = aggregate(&[feed("a", &[("A", "old"), ("B", "new")])], &store).await;
        assert_eq!(batch.article_count(), 1);
        assert!(batch.contains("a", "B"));
        assert!(!batch.contains("a", "A"));
    }

    #[tokio::test]
    async fn sites_without_new_articles_are_omitted() {
        let store = MemoryStore::new();
        mark_seen(&store, "a", "A").await;

        let batch = aggregate(
            &[feed("a", &[("A", "t")]), feed("b", &[("B", "t")])],
            &store,
        )
        .await;
        assert!(batch.site("a").is_none());
        assert_eq!(
            batch.site("b").unwrap().entries,
            vec![BatchEntry {
                url: "B".into(),
                title: "t".into()
            }]
        );
    }

    #[tokio::test]
    async fn duplicate_within_fetch_appears_once() {
        let store = MemoryStore::new();
        let batch = aggregate(&[feed("a", &[("u1", "t1"), ("u1", "t1")])], &store).await;
        assert_eq!(batch.article_count(), 1);
    }
}
