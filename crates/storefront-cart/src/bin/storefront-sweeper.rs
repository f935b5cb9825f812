//! # Storefront Sweeper
//!
//! Long-running maintenance process: keeps expired sessions and orphaned
//! cart rows out of the stock ledger.
//!
//! ## Usage
//! ```bash
//! cargo run -p storefront-cart --bin storefront-sweeper
//!
//! # Explicit config file
//! cargo run -p storefront-cart --bin storefront-sweeper -- --config ./store.toml
//!
//! # More logging
//! RUST_LOG=debug cargo run -p storefront-cart --bin storefront-sweeper
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use storefront_cart::{spawn_sweeper, sqlite, CartService, StoreConfig};
use storefront_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,storefront=debug,sqlx=warn")),
        )
        .with_target(true)
        .init();

    let config_path = parse_config_arg();
    let config = StoreConfig::load(config_path).context("loading store configuration")?;
    info!(
        db = %config.database.path.display(),
        ttl_secs = config.session.ttl_secs,
        sweep_interval_secs = config.session.sweep_interval_secs,
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(&config.database.path).max_connections(config.database.max_connections),
    )
    .await
    .context("opening storefront database")?;
    if !db.health_check().await {
        anyhow::bail!("storefront database is not answering queries");
    }

    let interval = config.sweep_interval();
    let ports = sqlite::ports(db.clone(), config.session_ttl());
    let service = Arc::new(CartService::new(config, ports));

    let sweeper = spawn_sweeper(service, interval);

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutdown signal received");

    sweeper.abort();
    db.close().await;
    Ok(())
}

fn parse_config_arg() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
