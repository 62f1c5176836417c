//! Scheduled news notifier.
//!
//! Each run fetches the configured news sites, sends one digest for articles
//! the dedup ledger has not seen, then records them with an expiry so later
//! runs skip them.

pub mod aggregate;
pub mod config;
pub mod digest;
pub mod error;
pub mod model;
pub mod notify;
pub mod persist;
pub mod run;
pub mod source;
pub mod store;
