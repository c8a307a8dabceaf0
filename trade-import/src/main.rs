//! trade-import - Trade data import microservice
//!
//! Loads the `year/<YYYY>/<CC>/<tradeflow>/*.csv` tree into the trade
//! tables on request and reports job progress over HTTP and SSE.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trade_common::config::{
    default_config_path, load_toml_config, resolve_data_root, resolve_database_url, TomlConfig,
};
use trade_common::events::EventBus;

use trade_import::config::ImportSettings;
use trade_import::db::SqliteTradeStore;
use trade_import::services::{table_mapper, FileLocator};
use trade_import::AppState;

/// Command-line arguments for trade-import
#[derive(Parser, Debug)]
#[command(name = "trade-import")]
#[command(about = "Trade data CSV import microservice")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5780", env = "TRADE_IMPORT_PORT")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Root of the CSV tree (falls back to TRADE_DATA_REPO_PATH, then config.toml)
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// sqlx connection string (falls back to TRADE_DATABASE_URL, then config.toml)
    #[arg(long)]
    database_url: Option<String>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rows per insert batch
    #[arg(long, default_value_t = 1000)]
    batch_size: usize,

    /// Deadline for one batch write, in seconds
    #[arg(long, default_value_t = 30)]
    batch_timeout_secs: u64,

    /// Import jobs allowed to run at once
    #[arg(long, default_value_t = 2)]
    max_concurrent_jobs: usize,

    /// How long finished jobs stay queryable, in seconds
    #[arg(long, default_value_t = 3600)]
    job_ttl_secs: u64,
}

impl Args {
    fn settings(&self) -> ImportSettings {
        ImportSettings {
            batch_size: self.batch_size,
            batch_timeout: Duration::from_secs(self.batch_timeout_secs),
            max_concurrent_jobs: self.max_concurrent_jobs,
            job_ttl: Duration::from_secs(self.job_ttl_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = match args.config.clone().or_else(default_config_path) {
        Some(path) => load_toml_config(&path)?,
        None => TomlConfig::default(),
    };

    // Initialize tracing
    let default_filter = toml_config
        .log_filter
        .clone()
        .unwrap_or_else(|| "trade_import=info,tower_http=info".to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting trade-import microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    table_mapper::validate_registry()
        .map_err(|e| anyhow::anyhow!("Invalid table registry: {}", e))?;

    let data_root = resolve_data_root(args.data_root.as_deref(), &toml_config)?;
    let locator = FileLocator::new(data_root)?;
    info!("Data root: {}", locator.root().display());

    let database_url = resolve_database_url(args.database_url.as_deref(), &toml_config);
    let pool = trade_import::db::init_database_pool(&database_url)
        .await
        .context("Failed to initialize database")?;
    info!("Database connection established");

    let settings = args.settings();
    info!(
        batch_size = settings.batch_size,
        batch_timeout_secs = settings.batch_timeout.as_secs(),
        max_concurrent_jobs = settings.max_concurrent_jobs,
        job_ttl_secs = settings.job_ttl.as_secs(),
        "Import settings"
    );

    let event_bus = EventBus::new(100);
    let state = AppState::new(
        Arc::new(SqliteTradeStore::new(pool)),
        locator,
        event_bus,
        settings,
    );
    let _sweeper = state.jobs.spawn_sweeper(state.settings.sweep_interval());

    let app = trade_import::build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port)
        .parse()
        .with_context(|| format!("Invalid bind address: {}:{}", args.bind, args.port))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
