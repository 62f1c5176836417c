use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use news_notifier::config;
use news_notifier::notify;
use news_notifier::run::{RunOutcome, Runner};
use news_notifier::source::{self, SourceAdapter};
use news_notifier::store::SqliteStore;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Poll news sites once and send a digest of articles not delivered before"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print an example config file and exit
    #[arg(long)]
    print_example_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if args.print_example_config {
        print!("{}", config::example());
        return Ok(());
    }

    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    cfg.ensure_dirs()?;

    let store = SqliteStore::connect(&cfg.store_location())
        .await
        .context("failed to open dedup store")?;
    store.sweep(Utc::now()).await;

    let sources: Vec<Arc<dyn SourceAdapter>> = source::build_sources(&cfg.sources.sites)?
        .into_iter()
        .map(Arc::from)
        .collect();
    let notifier = notify::build_notifier(&cfg.notify)?;

    let mut runner = Runner::new(sources, Arc::new(store), Arc::from(notifier))
        .with_retention(cfg.retention());
    if let Some(header) = &cfg.notify.header {
        runner = runner.with_header(header.clone());
    }

    match runner.run_once().await {
        Ok(RunOutcome::NothingNew { fetched }) => {
            info!(fetched, "run finished; nothing to send");
            Ok(())
        }
        Ok(RunOutcome::Notified {
            sites,
            articles,
            persisted,
            already_present,
        }) => {
            info!(sites, articles, persisted, already_present, "run finished");
            Ok(())
        }
        Err(err) => {
            error!(%err, "run aborted");
            Err(err.into())
        }
    }
}
