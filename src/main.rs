use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use newsbot::{
    BotHandler, Config, Database, NewsbotError, Pipeline, Scheduler, SubscriptionService,
    TelegramClient, UpdateRunner,
};

#[tokio::main]
async fn main() -> ExitCode {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    // Load configuration
    let mut loaded_from_file = true;
    let mut config = match Config::load(&path) {
        Ok(config) => config,
        Err(NewsbotError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            eprintln!("{path} not found, using default configuration.");
            loaded_from_file = false;
            Config::default()
        }
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = newsbot::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        newsbot::logging::init_console_only(&config.logging.level);
    }

    if !loaded_from_file {
        warn!("Config file {} not found, running with defaults", path);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> newsbot::Result<()> {
    info!("newsbot {} starting", env!("CARGO_PKG_VERSION"));

    let db = Arc::new(Database::open(&config.database.path).await?);
    info!("Database opened at {}", config.database.path);
    SubscriptionService::new(&db, &config)
        .seed_default_sources()
        .await?;

    let config = Arc::new(config);
    let client = Arc::new(TelegramClient::new(&config.telegram)?);

    let pipeline = Arc::new(Pipeline::new(db.clone(), client.clone(), &config)?);
    let scheduler = Arc::new(Scheduler::new(pipeline, &config.scheduler));
    let handler = Arc::new(BotHandler::new(db.clone(), config.clone(), client.clone()));
    let runner = UpdateRunner::new(client, handler);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler_task = {
        let scheduler = scheduler.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { scheduler.run(shutdown).await })
    };
    let runner_task = tokio::spawn(async move { runner.run(shutdown_rx).await });

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
    let _ = shutdown_tx.send(true);

    if let Err(e) = scheduler_task.await {
        error!("Scheduler task failed: {}", e);
    }
    if let Err(e) = runner_task.await {
        error!("Update loop task failed: {}", e);
    }

    info!("newsbot stopped");
    Ok(())
}
