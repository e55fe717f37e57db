use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use uorigin::config::Config;
use uorigin::fetch::HttpFetcher;
use uorigin::init::{init_stores, setup_logging};
use uorigin::scheduler::spawn_refresh_loop;
use uorigin::sync::SyncService;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load Config
    let config_path = std::env::args().nth(1).unwrap_or("config.toml".to_string());
    let config_exists = std::path::Path::new(&config_path).exists();
    let config = if config_exists {
        Config::load(&config_path).await?
    } else {
        Config::default()
    };

    // 2. Setup Logging
    setup_logging(&config);
    info!("Starting uorigin...");
    if !config_exists {
        info!("Config file not found, using defaults.");
    }

    // 3. Init Stores & Transport
    let (rules, states) = init_stores(&config).context("Failed to initialize stores")?;
    let fetcher =
        Arc::new(HttpFetcher::new(&config.updates).context("Failed to build HTTP client")?);
    let service = Arc::new(SyncService::new(&config, fetcher, rules, states));

    // 4. Install: initialize state and run the first sync
    service.get_state().await?;
    match service.refresh().await {
        Ok(outcome) => info!("Initial sync committed {} rules", outcome.committed_rules),
        Err(e) => error!("Initial sync failed: {}", e),
    }

    // 5. Spawn Periodic Updater
    let interval = Duration::from_secs(config.updates.interval_hours.saturating_mul(3600));
    let (refresh_trigger, _updater) = spawn_refresh_loop(service.clone(), interval);

    // 6. Start API Server
    let addr: SocketAddr = format!("{}:{}", config.api.host, config.api.port)
        .parse()
        .context("Invalid API listen address")?;
    let api_service = service.clone();
    let api = tokio::spawn(async move {
        if let Err(e) = uorigin::api::start_api_server(api_service, refresh_trigger, addr).await {
            error!("API server failed: {}", e);
        }
    });

    // 7. Graceful Shutdown
    tokio::select! {
        _ = api => {},
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received.");
        }
    }

    Ok(())
}
