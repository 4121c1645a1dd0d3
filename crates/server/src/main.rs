use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use docshelf_classify::{Classifier, ClassifierConfig, HttpClassifier};
use docshelf_ingest::{ChangeIntake, IngestState, Poller, SubscriptionConfig, SubscriptionManager};
use docshelf_pipeline::{Organizer, PipelineConfig};
use docshelf_server::api::{self, AppState};
use docshelf_server::config::DocshelfConfig;
use docshelf_server::{telemetry, worker};
use docshelf_storage::{HttpStorage, StorageConfig, StorageProvider};

/// Docshelf file organizer.
#[derive(Parser, Debug)]
#[command(name = "docshelf", about = "LLM-backed organizer for remote file storage")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "docshelf.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sweep the watched folder once, organizing every eligible file.
    Batch {
        /// Override the watched folder id.
        #[arg(long)]
        root: Option<String>,

        /// Classify and log routing decisions without moving anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// Serve the webhook endpoint and keep the folder organized continuously.
    Watch {
        /// Override the watched folder id.
        #[arg(long)]
        root: Option<String>,

        /// Override the bind host.
        #[arg(long)]
        host: Option<String>,

        /// Override the bind port.
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Backlog of change-fed files waiting for the organize worker.
const QUEUE_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let mut config: DocshelfConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        toml::from_str("")?
    };
    config.apply_env();

    telemetry::init();

    if !Path::new(&cli.config).exists() {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    config.validate()?;

    let storage: Arc<dyn StorageProvider> = Arc::new(HttpStorage::new(
        StorageConfig::new(&config.storage.base_url, &config.storage.token)
            .with_timeout(config.storage.timeout_seconds),
    )?);

    let classifier: Arc<dyn Classifier> =
        Arc::new(HttpClassifier::new(classifier_config(&config))?);

    let pipeline_config = PipelineConfig {
        confidence_threshold: config.pipeline.confidence_threshold,
        content_cap: config.pipeline.content_cap,
        batch_delay_ms: config.pipeline.batch_delay_ms,
        download_timeout_seconds: config.pipeline.download_timeout_seconds,
    };

    match cli.command {
        Commands::Batch { root, dry_run } => {
            let root = root.unwrap_or_else(|| config.storage.root.clone());
            let organizer = Organizer::new(storage, classifier, root, pipeline_config);
            run_batch(organizer, dry_run).await
        }
        Commands::Watch { root, host, port } => {
            let root = root.unwrap_or_else(|| config.storage.root.clone());
            let organizer = Arc::new(Organizer::new(
                Arc::clone(&storage),
                classifier,
                root.clone(),
                pipeline_config,
            ));
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            run_watch(storage, organizer, &config, root, &host, port).await
        }
    }
}

/// Build the classifier config from TOML values.
fn classifier_config(config: &DocshelfConfig) -> ClassifierConfig {
    let mut classifier =
        ClassifierConfig::new(&config.llm.endpoint, &config.llm.model, &config.llm.api_key);
    if let Some(timeout) = config.llm.timeout_seconds {
        classifier = classifier.with_timeout(timeout);
    }
    if let Some(retries) = config.llm.max_retries {
        classifier = classifier.with_max_retries(retries);
    }
    if let Some(temperature) = config.llm.temperature {
        classifier.temperature = temperature;
    }
    if let Some(max_tokens) = config.llm.max_tokens {
        classifier.max_tokens = max_tokens;
    }
    classifier
}

/// Run one sweep over the watched folder and report the counts.
async fn run_batch(organizer: Organizer, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    let summary = organizer.run_batch(dry_run, &cancel).await?;

    info!(
        organized = summary.organized,
        skipped = summary.skipped,
        errors = summary.errors,
        dry_run,
        "batch complete"
    );
    Ok(())
}

/// Serve notifications and keep organizing until shutdown.
async fn run_watch(
    storage: Arc<dyn StorageProvider>,
    organizer: Arc<Organizer>,
    config: &DocshelfConfig,
    root: String,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let (queue_tx, queue_rx) = mpsc::channel(QUEUE_CAPACITY);
    let ingest = IngestState::shared();
    let intake = Arc::new(ChangeIntake::new(
        Arc::clone(&storage),
        Arc::clone(&ingest),
        queue_tx,
        root.clone(),
    ));

    let worker_handle = tokio::spawn(worker::organize_queue(organizer, queue_rx, cancel.clone()));

    let poller = Poller::new(
        Arc::clone(&intake),
        Duration::from_secs(config.subscription.poll_interval_seconds),
    );
    let poller_handle = tokio::spawn(poller.run(cancel.clone()));

    // Register the push channel unless no public address is configured, in
    // which case the poller carries ingestion alone.
    let manager_handle = if config.subscription.address.is_empty() {
        warn!("no subscription address configured, relying on polling only");
        None
    } else {
        let mut subscription = SubscriptionConfig::new(&config.subscription.address);
        subscription.lease_seconds = config.subscription.lease_seconds;
        subscription.renewal_margin_seconds = config.subscription.renewal_margin_seconds;

        let manager = SubscriptionManager::new(
            Arc::clone(&storage),
            Arc::clone(&ingest),
            subscription,
            root.clone(),
        );
        if let Err(e) = manager.establish().await {
            warn!(error = %e, "initial channel registration failed, polling until retry succeeds");
        }
        Some(tokio::spawn(manager.run(cancel.clone())))
    };

    let state = AppState { intake, ingest };
    let app = api::router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, root = %root, "docshelf listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the background tasks and give them a bounded window to wind down.
    cancel.cancel();
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let drain = async {
        let _ = worker_handle.await;
        let _ = poller_handle.await;
        if let Some(handle) = manager_handle {
            let _ = handle.await;
        }
    };
    let drained = tokio::time::timeout(shutdown_timeout, drain).await;
    if drained.is_err() {
        warn!(
            timeout_secs = config.server.shutdown_timeout_seconds,
            "shutdown timeout exceeded, background tasks may not have stopped cleanly"
        );
    }

    info!("docshelf shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
