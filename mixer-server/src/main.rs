use std::sync::Arc;

use clap::Parser;
use mixer_core::{MixerConfig, N8nClient, PlatformCredentials, WorkflowPlatform};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "zyndmixer.toml")]
    config: String,

    /// Check that the workflow platform is reachable with the configured key, then exit
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets may come from a local .env during development
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match MixerConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging: RUST_LOG wins, otherwise the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    let platform = match N8nClient::new(&config.platform, PlatformCredentials::from_env()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to create platform client: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        // A missing workflow is still an authenticated round trip.
        match platform.fetch_workflow("health-probe").await {
            Ok(_) => println!("✅ Platform reachable: {}", platform.base_url()),
            Err(e) if e.http_status() == 404 => {
                println!("✅ Platform reachable: {}", platform.base_url())
            }
            Err(e) => {
                println!("❌ Platform check failed: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    tracing::info!(platform = %config.platform.base_url, "Starting zyndmixer server");
    let platform: Arc<dyn WorkflowPlatform> = Arc::new(platform);
    mixer_server::http::start_http_server(config, platform, tx.subscribe()).await?;

    Ok(())
}
