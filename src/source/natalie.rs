//! Natalie (natalie.mu) news index.
//!
//! The index page lists articles as cards inside a single `NA_section` block.
//! A card contains the headline and several links; tag links are mixed in, so
//! the article link is the first one whose href mentions `news`.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, Url};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};

use super::SourceAdapter;
use crate::error::FetchError;
use crate::model::Article;

/// Config key for this adapter.
pub const KEY: &str = "natalie";
/// Site name recorded in the ledger and shown in the digest.
pub const SITE_NAME: &str = "ナタリー";
pub const INDEX_URL: &str = "https://natalie.mu/news/";

static SECTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.NA_section").expect("valid section selector"));
static CARD: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.NA_card").expect("valid card selector"));
static CARD_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.NA_card_title").expect("valid title selector"));
static LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid link selector"));

#[derive(Debug, Clone)]
pub struct NatalieSource {
    http: Client,
    index_url: Url,
}

impl NatalieSource {
    pub fn new() -> Result<Self, FetchError> {
        let index_url = Url::parse(INDEX_URL).expect("valid natalie index URL");
        Self::with_index_url(index_url)
    }

    pub fn with_index_url(index_url: Url) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(concat!("news-notifier/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, index_url })
    }
}

#[async_trait]
impl SourceAdapter for NatalieSource {
    fn site(&self) -> &str {
        SITE_NAME
    }

    #[instrument(skip_all, fields(url = %self.index_url))]
    async fn fetch(&self) -> Result<Vec<Article>, FetchError> {
        let res = self.http.get(self.index_url.clone()).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.index_url.to_string(),
            });
        }
        let html = res.text().await?;
        let articles = parse_news_page(&html, &self.index_url)?;
        info!(count = articles.len(), site = SITE_NAME, "indexed articles");
        Ok(articles)
    }
}

/// Extract `(url, title)` pairs from the news index markup.
pub fn parse_news_page(html: &str, base: &Url) -> Result<Vec<Article>, FetchError> {
    let document = Html::parse_document(html);
    let section = document
        .select(&SECTION)
        .next()
        .ok_or_else(|| FetchError::Parse("NA_section block not found".into()))?;

    let mut articles = Vec::new();
    for card in section.select(&CARD) {
        let Some(title) = card_title(card) else {
            debug!("card without title skipped");
            continue;
        };
        let Some(url) = article_link(card, base) else {
            debug!(%title, "card without article link skipped");
            continue;
        };
        articles.push(Article::new(SITE_NAME, url, title));
    }
    Ok(articles)
}

fn card_title(card: ElementRef<'_>) -> Option<String> {
    let text: String = card.select(&CARD_TITLE).next()?.text().collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn article_link(card: ElementRef<'_>, base: &Url) -> Option<String> {
    card.select(&LINK)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains("news"))
        .and_then(|href| base.join(href).ok())
        .map(|url| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse(INDEX_URL).unwrap()
    }

    const PAGE: &str = r#"
<html><body>
  <div class="NA_header"><a href="https://natalie.mu/news/0">not a card</a></div>
  <div class="NA_section">
    <div class="NA_card">
      <a href="https://natalie.mu/music/tag/42">tag</a>
      <a href="https://natalie.mu/music/news/1001">
        <p class="NA_card_title">First headline</p>
      </a>
    </div>
    <div class="NA_card">
      <a href="/comic/news/1002"><p class="NA_card_title"> Second headline </p></a>
    </div>
    <div class="NA_card">
      <p class="NA_card_title">No article link</p>
      <a href="https://natalie.mu/eiga/artist/7">artist</a>
    </div>
  </div>
</body></html>
"#;

    #[test]
    fn extracts_article_links_and_titles() {
        let articles = parse_news_page(PAGE, &base()).unwrap();
        assert_eq!(
            articles,
            vec![
                Article::new(SITE_NAME, "https://natalie.mu/music/news/1001", "First headline"),
                Article::new(SITE_NAME, "https://natalie.mu/comic/news/1002", "Second headline"),
            ]
        );
    }

    #[test]
    fn missing_section_is_a_parse_error() {
        let err = parse_news_page("<html><body><p>maintenance</p></body></html>", &base())
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }
}
