#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use news_notifier::error::{DeliveryError, FetchError, StoreError};
use news_notifier::model::{Article, SeenRecord};
use news_notifier::notify::Notifier;
use news_notifier::source::SourceAdapter;
use news_notifier::store::{DedupStore, InsertOutcome, Lookup, MemoryStore};

/// Source returning a fixed list of articles, or a scripted failure.
#[derive(Clone)]
pub struct StaticSource {
    site: String,
    articles: Arc<Mutex<Vec<Article>>>,
    fail: Arc<Mutex<bool>>,
    pub fetches: Arc<AtomicUsize>,
}

impl StaticSource {
    pub fn new(site: &str, items: &[(&str, &str)]) -> Self {
        Self {
            site: site.to_string(),
            articles: Arc::new(Mutex::new(
                items
                    .iter()
                    .map(|(url, title)| Article::new(site, *url, *title))
                    .collect(),
            )),
            fail: Arc::new(Mutex::new(false)),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn set_failing(&self, fail: bool) {
        *self.fail.lock().await = fail;
    }
}

#[async_trait]
impl SourceAdapter for StaticSource {
    fn site(&self) -> &str {
        &self.site
    }

    async fn fetch(&self) -> Result<Vec<Article>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if *self.fail.lock().await {
            return Err(FetchError::Parse("scripted failure".into()));
        }
        Ok(self.articles.lock().await.clone())
    }
}

/// Notifier recording every message; scripted responses are consumed first.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    responses: Arc<Mutex<VecDeque<Result<(), DeliveryError>>>>,
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn with_responses(responses: Vec<Result<(), DeliveryError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Default::default()
        }
    }

    pub async fn messages(&self) -> Vec<String> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, message: &str) -> Result<(), DeliveryError> {
        self.messages.lock().await.push(message.to_string());
        self.responses.lock().await.pop_front().unwrap_or(Ok(()))
    }
}

/// Memory store with injectable lookup and insert failures.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing_gets: Arc<Mutex<HashSet<String>>>,
    failing_inserts: Arc<Mutex<HashSet<String>>>,
    pub gets: Arc<AtomicUsize>,
    pub inserts: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub async fn fail_get_for(&self, url: &str) {
        self.failing_gets.lock().await.insert(url.to_string());
    }

    pub async fn fail_insert_for(&self, url: &str) {
        self.failing_inserts.lock().await.insert(url.to_string());
    }

    pub async fn heal(&self) {
        self.failing_gets.lock().await.clear();
        self.failing_inserts.lock().await.clear();
    }
}

#[async_trait]
impl DedupStore for FlakyStore {
    async fn get(&self, url: &str, site: &str) -> Result<Lookup, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.failing_gets.lock().await.contains(url) {
            return Err(StoreError::Unavailable(format!("lookup of {url} timed out")));
        }
        self.inner.get(url, site).await
    }

    async fn insert(&self, record: &SeenRecord) -> Result<InsertOutcome, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.failing_inserts.lock().await.contains(&record.url) {
            return Err(StoreError::Unavailable(format!(
                "insert of {} throttled",
                record.url
            )));
        }
        self.inner.insert(record).await
    }
}
