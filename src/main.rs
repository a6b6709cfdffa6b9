use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use jobqueue_core::client_ledger::{ClientLedgerStore, ClientUpsertParams, SqliteClientLedger};
use jobqueue_core::config::{AppConfig, CliConfig, FileConfig, DEFAULT_HEARTBEAT_INTERVAL_SECS};
use jobqueue_core::heartbeat::{ClientHeartbeat, HeartbeatSettings};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir().context("Error resolving current directory")?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
#[clap(about = "Registers this process in the client ledger and keeps it alive")]
struct CliArgs {
    /// Path to the SQLite job database file.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Client id to heartbeat as. Defaults to the hostname plus a random suffix.
    #[clap(long)]
    pub client_id: Option<String>,

    /// Path to a TOML config file. Values in it override command line flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Seconds between heartbeats.
    #[clap(long, default_value_t = DEFAULT_HEARTBEAT_INTERVAL_SECS)]
    pub heartbeat_interval_secs: u64,

    /// How long to wait on a locked database before giving up, in milliseconds.
    #[clap(long, default_value_t = 5000)]
    pub busy_timeout_ms: u64,

    /// Pause the client and exit.
    #[clap(long, conflicts_with_all = ["resume", "list"])]
    pub pause: bool,

    /// Resume the client and exit.
    #[clap(long, conflicts_with = "list")]
    pub resume: bool,

    /// Print every ledger row as JSON and exit.
    #[clap(long)]
    pub list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };

    let explicit_client_id = cli_args.client_id.is_some()
        || file_config
            .as_ref()
            .is_some_and(|file| file.client_id.is_some());
    if (cli_args.pause || cli_args.resume) && !explicit_client_id {
        bail!("--pause and --resume need a client id via --client-id or the config file");
    }

    let cli_config = CliConfig {
        db_path: cli_args.db_path.clone(),
        client_id: cli_args.client_id.clone(),
        heartbeat_interval_secs: cli_args.heartbeat_interval_secs,
        busy_timeout_ms: cli_args.busy_timeout_ms,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let ledger = Arc::new(SqliteClientLedger::with_busy_timeout(
        &config.db_path,
        config.busy_timeout,
    )?);

    if cli_args.list {
        let records = ledger.list()?;
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if cli_args.pause || cli_args.resume {
        let params = ClientUpsertParams::new(config.client_id.clone());
        let params = if cli_args.pause {
            params.pause_at(Utc::now())
        } else {
            params.unpause()
        };
        let record = ledger.upsert(params)?;
        info!(
            "Client '{}' is now {}",
            record.id,
            if record.is_paused() { "paused" } else { "running" }
        );
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let heartbeat = ClientHeartbeat::spawn(
        ledger,
        HeartbeatSettings {
            client_id: config.client_id.clone(),
            interval: config.heartbeat_interval,
            metadata: config.metadata.clone(),
        },
        shutdown.clone(),
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown requested, stopping heartbeat...");
    heartbeat.shutdown().await;

    Ok(())
}
