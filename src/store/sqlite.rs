use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, instrument, warn};

use super::{DedupStore, InsertOutcome, Lookup};
use crate::error::StoreError;
use crate::model::SeenRecord;

pub type Pool = SqlitePool;

/// SQLite-backed delivery ledger.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool,
}

impl SqliteStore {
    /// Open (or create) the store at `database_url` and apply migrations.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = init_pool(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    #[instrument(skip_all, fields(url = %url, site = %site))]
    pub async fn get_at(
        &self,
        url: &str,
        site: &str,
        now: DateTime<Utc>,
    ) -> Result<Lookup, StoreError> {
        let row = sqlx::query(
            "SELECT url, site, title, delivered_at, expires_at FROM seen_articles \
             WHERE url = ? AND site = ? AND expires_at > ?",
        )
        .bind(url)
        .bind(site)
        .bind(now.timestamp())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Lookup::Found(record_from_row(&row)?)),
            None => Ok(Lookup::NotFound),
        }
    }

    /// Store-side expiry sweep. Returns the number of rows removed.
    #[instrument(skip_all)]
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let res = sqlx::query("DELETE FROM seen_articles WHERE expires_at <= ?")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    /// Maintenance sweep that never fails the caller; errors are logged.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Option<u64> {
        match self.purge_expired(now).await {
            Ok(purged) => {
                info!(purged, "expired seen records swept");
                Some(purged)
            }
            Err(err) => {
                warn!(?err, "expired record sweep failed; continuing");
                None
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seen_articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl DedupStore for SqliteStore {
    async fn get(&self, url: &str, site: &str) -> Result<Lookup, StoreError> {
        self.get_at(url, site, Utc::now()).await
    }

    /// Inserts the record, replacing a row for the same key only if that row
    /// had already expired at `record.delivered_at`.
    #[instrument(skip_all, fields(url = %record.url, site = %record.site))]
    async fn insert(&self, record: &SeenRecord) -> Result<InsertOutcome, StoreError> {
        let res = sqlx::query(
            "INSERT INTO seen_articles (url, site, title, delivered_at, expires_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (url, site) DO UPDATE SET \
                 title = excluded.title, \
                 delivered_at = excluded.delivered_at, \
                 expires_at = excluded.expires_at \
             WHERE seen_articles.expires_at <= excluded.delivered_at",
        )
        .bind(&record.url)
        .bind(&record.site)
        .bind(&record.title)
        .bind(record.delivered_at.timestamp())
        .bind(record.expires_at.timestamp())
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            debug!("seen record already present");
            return Ok(InsertOutcome::AlreadyExists);
        }
        Ok(InsertOutcome::Inserted)
    }
}

fn record_from_row(row: &SqliteRow) -> Result<SeenRecord, StoreError> {
    let url: String = row.try_get("url")?;
    let site: String = row.try_get("site")?;
    let title: String = row.try_get("title")?;
    let delivered_at = epoch_to_utc(row.try_get("delivered_at")?);
    let expires_at = epoch_to_utc(row.try_get("expires_at")?);

    match (delivered_at, expires_at) {
        (Some(delivered_at), Some(expires_at)) => Ok(SeenRecord {
            url,
            site,
            title,
            delivered_at,
            expires_at,
        }),
        _ => Err(StoreError::Corrupt {
            url,
            site,
            reason: "timestamp out of range".into(),
        }),
    }
}

fn epoch_to_utc(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

pub async fn init_pool(database_url: &str) -> Result<Pool, StoreError> {
    let normalized = prepare_sqlite_url(database_url);
    // An in-memory database only lives as long as its one connection.
    let options = if normalized.starts_with("sqlite::memory") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(4)
    };
    let pool = options.connect(&normalized).await?;
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/`, ensure the parent
/// directory exists and ask SQLite to create the file. In-memory URLs are left
/// untouched.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };

    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let query = match query_part {
        Some(q) if q.contains("mode=") => q.to_string(),
        Some(q) => format!("{}&mode=rwc", q),
        None => "mode=rwc".to_string(),
    };
    format!("sqlite://{}?{}", expanded_path, query)
}

pub async fn run_migrations(pool: &Pool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
