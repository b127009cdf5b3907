//! insta-relay — binary entrypoint.
//! Reads configuration from the environment (and `.env`), wires the Instagram
//! source, Telegram notifier and state file into the monitor, then runs forever.

use std::sync::Arc;

use insta_relay::notify::telegram::TelegramNotifier;
use insta_relay::source::instagram::InstagramClient;
use insta_relay::{FileWatermarkStore, Monitor, MonitorSettings, RelayConfig};

#[tokio::main]
async fn main() {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();

    insta_relay::init_tracing();

    let cfg = match RelayConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            eprintln!("insta-relay: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cfg).await {
        tracing::error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cfg: RelayConfig) -> anyhow::Result<()> {
    if let Some(addr) = cfg.metrics_addr {
        insta_relay::metrics::install_prometheus(addr)?;
    }

    let source = Arc::new(InstagramClient::new()?);
    let notifier = Arc::new(TelegramNotifier::new(cfg.telegram_token.clone()));
    let store = Arc::new(FileWatermarkStore::new(cfg.state_path.clone()));

    let monitor = Monitor::load(MonitorSettings::from(&cfg), source, notifier, store).await;

    match &cfg.credentials {
        Some(creds) => {
            monitor.login(creds).await;
        }
        None => tracing::info!("no Instagram credentials, fetching anonymously"),
    }

    monitor.run().await;
    Ok(())
}
