//! Source adapters: each turns one news site into a list of articles.
use async_trait::async_trait;

use crate::error::FetchError;
use crate::model::Article;

pub mod natalie;

pub use natalie::NatalieSource;

/// Produces the current articles of one site.
///
/// Returned articles carry `site()` as their site. Duplicate urls within one
/// call are tolerated; the aggregator keeps one entry per url.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn site(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<Article>, FetchError>;
}

/// Config keys of the adapters this build knows about.
pub const KNOWN_SITES: &[&str] = &[natalie::KEY];

pub fn is_known(key: &str) -> bool {
    KNOWN_SITES.contains(&key)
}

/// Build one adapter per configured site key, preserving config order.
pub fn build_sources(keys: &[String]) -> Result<Vec<Box<dyn SourceAdapter>>, FetchError> {
    keys.iter()
        .map(|key| match key.as_str() {
            natalie::KEY => Ok(Box::new(NatalieSource::new()?) as Box<dyn SourceAdapter>),
            other => Err(FetchError::UnknownSite(other.to_string())),
        })
        .collect()
}
