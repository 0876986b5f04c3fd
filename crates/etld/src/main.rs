mod single_instance;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use etl_config::Settings;
use etl_orchestrator::Orchestrator;
use etl_state::RedisCheckpointStore;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "etld")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Replicates films, genres and persons into a denormalized search index", long_about = None)]
struct Cli {
    /// Path to the bindings TOML file
    #[arg(short, long, default_value = "etl.toml")]
    config: PathBuf,

    /// Run one full pass over every binding, then exit
    #[arg(long)]
    once: bool,

    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    telemetry::init_tracing(cli.json, level);

    if !single_instance::ensure_single_instance() {
        bail!("another etld process is already running");
    }

    let settings = Settings::load(&cli.config).context("failed to load configuration")?;
    let config_dir = cli.config.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    let redis_url = format!(
        "redis://{}{}:{}/{}",
        settings
            .redis
            .password
            .as_deref()
            .map(|p| format!(":{p}@"))
            .unwrap_or_default(),
        settings.redis.host,
        settings.redis.port,
        settings.redis.db,
    );
    let state = RedisCheckpointStore::connect(&redis_url)
        .await
        .context("failed to connect to the checkpoint store")?;

    info!(bindings = settings.etl.bindings_elastic_to_sql.len(), once = cli.once, "etld starting");

    let orchestrator = Orchestrator::new(settings, config_dir, Arc::new(state));
    orchestrator.run(cli.once).await.context("orchestrator loop failed")?;

    Ok(())
}
