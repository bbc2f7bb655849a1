// crates/stakehub-indexer/src/main.rs

use {
    anyhow::{anyhow, Context, Result},
    clap::Parser,
    stakehub_common::{
        types::Address,
        utils::{format_amount, parse_amount},
        IndexerConfig, PostgresConfig, StorageType,
    },
    stakehub_indexer::{execute_script, load_script, metrics, EventIndexer, LocalLedger},
    stakehub_staking::StakeHub,
    stakehub_store::{StakeHubStorageFactory, StorageFactory},
    std::{path::PathBuf, sync::Arc, time::Duration},
    tokio::sync::{mpsc, RwLock},
    tracing::{error, info, warn},
    tracing_subscriber::{fmt::format::FmtSpan, EnvFilter},
};

#[derive(Parser, Debug)]
#[clap(
    version,
    about = "StakeHub ledger indexer",
    long_about = "Executes a transaction script against an in-process StakeHub ledger and mirrors its events into storage"
)]
struct Args {
    /// JSON transaction script
    #[clap(short, long)]
    script: PathBuf,

    /// JSON indexer configuration
    #[clap(short, long, env = "STAKEHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Ledger owner, used when no configuration file is given
    #[clap(long)]
    owner: Option<String>,

    /// Storage backend: memory or postgres
    #[clap(long)]
    storage: Option<String>,

    #[clap(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[clap(long)]
    log_level: Option<String>,

    #[clap(long)]
    metrics_interval_seconds: Option<u64>,

    /// Minimum stake as a token amount, e.g. "0.5"
    #[clap(long)]
    min_stake: Option<String>,
}

fn build_config(args: &Args) -> Result<IndexerConfig> {
    let mut config = match &args.config {
        Some(path) => IndexerConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            let owner = match &args.owner {
                Some(owner) => owner.parse::<Address>()?,
                None => Address::ZERO,
            };
            IndexerConfig::new(owner)
        }
    };

    if let Some(storage) = &args.storage {
        config.storage.storage_type = match storage.to_ascii_lowercase().as_str() {
            "memory" => StorageType::Memory,
            "postgres" => StorageType::Postgres,
            other => return Err(anyhow!("Unknown storage backend: {}", other)),
        };
    }
    if let Some(url) = &args.database_url {
        match config.storage.postgres.as_mut() {
            Some(postgres) => postgres.connection_string = url.clone(),
            None => config.storage.postgres = Some(PostgresConfig::new(url.clone())),
        }
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Some(seconds) = args.metrics_interval_seconds {
        config.metrics_interval_seconds = seconds;
    }
    if let Some(amount) = &args.min_stake {
        config.staking.min_stake =
            parse_amount(amount).with_context(|| format!("Invalid --min-stake {}", amount))?;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = build_config(&args)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .init();

    info!("🔧 Ledger owner: {}", config.owner);
    info!("💾 Initializing {:?} storage", config.storage.storage_type);
    let storage = StakeHubStorageFactory::new(config.storage.clone())
        .create_storage()
        .await
        .context("Failed to create storage")?;

    let transactions = load_script(&args.script)?;
    info!("📜 Loaded {} transactions", transactions.len());

    let hub = Arc::new(RwLock::new(StakeHub::new(config.staking.clone(), config.owner)));
    let ledger = Arc::new(LocalLedger::new(hub.clone()));

    let indexer = EventIndexer::new(storage.clone(), ledger).await?;
    let reporter = metrics::spawn_reporter(
        indexer.metrics(),
        Duration::from_secs(config.metrics_interval_seconds.max(1)),
    );
    let indexing_metrics = indexer.metrics();

    let (event_tx, event_rx) = mpsc::channel(config.channel_capacity);
    let indexer_handle = tokio::spawn(indexer.run(event_rx));
    let script_handle = tokio::spawn(execute_script(hub.clone(), transactions, event_tx));

    let finished = async {
        let report = script_handle.await??;
        indexer_handle.await??;
        Ok::<_, anyhow::Error>(report)
    };

    tokio::select! {
        result = finished => {
            match result {
                Ok(report) => info!(
                    "✅ Script complete: {} applied, {} rejected, {} events indexed",
                    report.applied, report.rejected, report.events
                ),
                Err(e) => error!("Indexing failed: {:#}", e),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
        }
    }

    reporter.abort();
    if let Ok(mut m) = indexing_metrics.lock() {
        m.update_rates();
        m.log_metrics();
    }

    {
        let hub = hub.read().await;
        match hub.audit() {
            Ok(()) => info!(
                "Ledger: {} validators, {} total staked, {} rewards paid",
                hub.get_validator_count(),
                format_amount(hub.get_total_staked()),
                format_amount(hub.rewards_paid()),
            ),
            Err(e) => warn!("Ledger audit failed: {}", e),
        }
    }

    storage.close().await?;
    info!("✅ Indexer shutdown complete");
    Ok(())
}
