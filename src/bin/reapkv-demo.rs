//! reapkv Demo Binary
//!
//! Creates a session, updates and reads it back, then optionally waits for
//! the reaper to evict it.

use std::time::Duration;

use clap::Parser;
use reapkv::{Payload, SessionStore, StoreConfig};
use serde_json::json;
use tokio::time::{sleep, Instant};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// reapkv - In-memory session store with TTL eviction
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Session TTL in seconds
    #[arg(long, default_value_t = 5)]
    ttl_secs: u64,

    /// Reaper tick period in milliseconds
    #[arg(long, default_value_t = 1000)]
    tick_millis: u64,

    /// Wait until the session has been evicted
    #[arg(long, default_value_t = false)]
    watch: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("reapkv=info".parse()?))
        .init();

    let args = Args::parse();

    let config = StoreConfig::default()
        .with_ttl(Duration::from_secs(args.ttl_secs))
        .with_tick(Duration::from_millis(args.tick_millis));
    let (store, reaper) = SessionStore::start(config)?;

    let id = store.create()?;
    info!(session = %id, "Created new session");

    let mut data = Payload::new();
    data.insert("website".to_string(), json!("longhoang.de"));
    store.update(&id, data)?;
    info!("Updated session data, set website to longhoang.de");

    let current = store.read(&id)?;
    info!(data = ?current, "Got session data");

    if args.watch {
        let (_, latest) = config.eviction_window();
        let touched = Instant::now();
        while store.contains(&id) {
            if touched.elapsed() > latest.saturating_add(config.tick) {
                anyhow::bail!("session {id} outlived its eviction window");
            }
            sleep(config.tick / 2).await;
        }
        info!(after = ?touched.elapsed(), "Session evicted");
    }

    reaper.stop().await;
    info!("{}", store.metrics().summary());

    Ok(())
}
