use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One article as produced by a source adapter for a single run.
///
/// Identity is `(url, site)`; `title` is display metadata only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub site: String,
}

impl Article {
    pub fn new(site: impl Into<String>, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            site: site.into(),
        }
    }
}

/// Persisted marker that an article has already been notified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeenRecord {
    pub url: String,
    pub site: String,
    pub title: String,
    pub delivered_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SeenRecord {
    pub fn new(
        site: &str,
        entry: &BatchEntry,
        delivered_at: DateTime<Utc>,
        retention: Duration,
    ) -> Self {
        Self {
            url: entry.url.clone(),
            site: site.to_string(),
            title: entry.title.clone(),
            delivered_at,
            expires_at: delivered_at + retention,
        }
    }

    /// A record stops being reachable once `expires_at` has passed.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub url: String,
    pub title: String,
}

/// Unseen articles of one site, in the order the source returned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteArticles {
    pub site: String,
    pub entries: Vec<BatchEntry>,
}

/// Articles judged new in the current run, grouped by site.
///
/// Sites keep first-insertion order and urls are unique within a site; a
/// repeated url keeps its original position and takes the later title. A site
/// only appears once it has at least one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationBatch {
    sites: Vec<SiteArticles>,
}

impl NotificationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, site: &str, url: &str, title: &str) {
        let idx = match self.sites.iter().position(|s| s.site == site) {
            Some(idx) => idx,
            None => {
                self.sites.push(SiteArticles {
                    site: site.to_string(),
                    entries: Vec::new(),
                });
                self.sites.len() - 1
            }
        };
        let group = &mut self.sites[idx];
        match group.entries.iter_mut().find(|e| e.url == url) {
            Some(existing) => existing.title = title.to_string(),
            None => group.entries.push(BatchEntry {
                url: url.to_string(),
                title: title.to_string(),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn sites(&self) -> &[SiteArticles] {
        &self.sites
    }

    pub fn site(&self, site: &str) -> Option<&SiteArticles> {
        self.sites.iter().find(|s| s.site == site)
    }

    pub fn contains(&self, site: &str, url: &str) -> bool {
        self.site(site)
            .map(|s| s.entries.iter().any(|e| e.url == url))
            .unwrap_or(false)
    }

    pub fn article_count(&self) -> usize {
        self.sites.iter().map(|s| s.entries.len()).sum()
    }

    /// Flattened `(site, entry)` pairs in batch order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BatchEntry)> {
        self.sites
            .iter()
            .flat_map(|s| s.entries.iter().map(move |e| (s.site.as_str(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_url_keeps_position_and_takes_later_title() {
        let mut batch = NotificationBatch::new();
        batch.insert("site", "u1", "first");
        batch.insert("site", "u2", "second");
        batch.insert("site", "u1", "updated");

        let entries = &batch.site("site").unwrap().entries;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "u1");
        assert_eq!(entries[0].title, "updated");
        assert_eq!(entries[1].url, "u2");
    }

    #[test]
    fn sites_keep_insertion_order() {
        let mut batch = NotificationBatch::new();
        batch.insert("b", "u1", "t1");
        batch.insert("a", "u2", "t2");
        batch.insert("b", "u3", "t3");

        let names: Vec<_> = batch.sites().iter().map(|s| s.site.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(batch.article_count(), 3);
        assert!(batch.contains("a", "u2"));
        assert!(!batch.contains("a", "u1"));
    }

    #[test]
    fn same_url_on_two_sites_is_two_articles() {
        let mut batch = NotificationBatch::new();
        batch.insert("a", "u", "t");
        batch.insert("b", "u", "t");
        assert_eq!(batch.article_count(), 2);
    }

    #[test]
    fn seen_record_expiry() {
        let now = Utc::now();
        let entry = BatchEntry {
            url: "u".into(),
            title: "t".into(),
        };
        let rec = SeenRecord::new("site", &entry, now, Duration::days(7));
        assert_eq!(rec.expires_at - rec.delivered_at, Duration::days(7));
        assert!(rec.is_live_at(now + Duration::days(6)));
        assert!(!rec.is_live_at(now + Duration::days(7)));
    }
}
