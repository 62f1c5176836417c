//! Error taxonomy for a single notifier run.
use thiserror::Error;

/// Source unreachable or unparseable. Fatal to the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("failed to parse page: {0}")]
    Parse(String),
    #[error("unknown source site {0:?}")]
    UnknownSite(String),
}

/// Dedup store failure (unreachable, malformed row, migration failure).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("corrupt record for {url} ({site}): {reason}")]
    Corrupt {
        url: String,
        site: String,
        reason: String,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Notification transport failure. Fatal to the run; nothing is persisted.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("delivery rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid notify target: {0}")]
    Target(String),
}

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("fetching {site} failed: {source}")]
    Fetch {
        site: String,
        #[source]
        source: FetchError,
    },
    #[error("notification failed: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("persisting seen articles failed: {0}")]
    Persist(#[source] StoreError),
}
