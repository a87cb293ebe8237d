use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use session_vault::config::{load_config, ConfigWatcher, VaultConfig};
use session_vault::lifecycle::{bootstrap, wait_for_signal, Shutdown};
use session_vault::observability::{logging, metrics};
use session_vault::HttpServer;

#[derive(Parser)]
#[command(name = "session-vault")]
#[command(about = "Encrypted clinical session notes service", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => VaultConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "session-vault starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let services = bootstrap(&config).await?;
    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let sweeper = config.rate_limit.enabled.then(|| {
        services.limiter.spawn_sweeper(
            Duration::from_secs(config.rate_limit.sweep_interval_secs),
            shutdown.subscribe(),
        )
    });

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match &args.config {
        Some(path) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let state = services.state.clone();
            let key = services.key.clone();
            tokio::spawn(async move {
                while let Some(new_config) = updates.recv().await {
                    state.guard.sessions().replace(&new_config.accounts);
                    key.replace_inline(new_config.encryption.key_hex.clone());
                    tracing::info!("Configuration reloaded");
                }
            });
            match watcher.run() {
                Ok(w) => Some(w),
                Err(e) => {
                    tracing::error!(error = %e, "Config watcher failed to start, hot reload disabled");
                    None
                }
            }
        }
        None => None,
    };

    let server = HttpServer::new(services.state, config.clone());
    if config.listener.tls.is_some() {
        server.run_tls(shutdown.clone()).await?;
    } else {
        let listener = TcpListener::bind(&config.listener.bind_address).await?;
        server.run(listener, shutdown.clone()).await?;
    }

    shutdown.trigger();
    if let Some(handle) = sweeper {
        let _ = handle.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
