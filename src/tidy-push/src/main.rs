//! TidyPush — push-notification campaign engine for the Tidy device cleaner.
//!
//! Main entry point that wires the store, transport, campaign runner, and
//! HTTP trigger API together and starts the server.

use clap::Parser;
use std::sync::Arc;
use std::time::Instant;
use tidypush_api::handlers::AppState;
use tidypush_api::ApiServer;
use tidypush_campaigns::CampaignRunner;
use tidypush_core::config::AppConfig;
use tidypush_delivery::{ExpoTransport, TokenRegistry};
use tidypush_platform::RateGovernor;
use tidypush_store::{InMemoryStore, RecipientStore};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tidy-push")]
#[command(about = "Push-notification campaign engine for the Tidy app")]
#[command(version)]
struct Cli {
    /// HTTP port (overrides config)
    #[arg(long, env = "TIDY_PUSH__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Trigger secret (overrides config)
    #[arg(long, env = "TIDY_PUSH__TRIGGER__CRON_SECRET")]
    cron_secret: Option<String>,

    /// Seed the in-memory store with demo recipients
    #[arg(long, default_value_t = false)]
    demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tidy_push=info,tidypush_api=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("TidyPush starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(secret) = cli.cron_secret {
        config.trigger.cron_secret = secret;
    }

    info!(
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        max_batch_size = config.push.max_batch_size,
        demo = cli.demo,
        "Configuration loaded"
    );

    // Recipient store. Development runs on the in-memory store; production
    // deployments swap in a database-backed implementation here.
    let store: Arc<dyn RecipientStore> = if cli.demo {
        Arc::new(InMemoryStore::with_demo_data())
    } else {
        Arc::new(InMemoryStore::new())
    };

    // Push transport and campaign pipeline.
    let transport = Arc::new(ExpoTransport::new(&config.push)?);
    let runner = Arc::new(CampaignRunner::new(
        store.clone(),
        transport,
        &config.push,
    ));
    let registry = Arc::new(TokenRegistry::new(store));
    let governor = Arc::new(RateGovernor::new());

    let state = AppState {
        runner,
        registry,
        governor,
        trigger: config.trigger.clone(),
        start_time: Instant::now(),
    };

    let server = ApiServer::new(config, state);
    server.start_metrics().await?;
    server.start_http().await?;

    Ok(())
}
