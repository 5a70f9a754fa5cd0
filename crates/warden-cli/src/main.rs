use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use warden_core::config::{ConnectivityConfig, NotifyConfig, UploaderConfig};
use warden_core::impls::{
    AlwaysOnline, FsArtifactSource, HttpProbe, HttpUploader, JsonFileStore, LogChannel,
    SimulatedUploader, StaticContactDirectory, WebhookChannel,
};
use warden_core::ports::{CloudUploader, ConnectivityOracle, NotificationChannel};
use warden_core::{
    ArtifactId, ArtifactRef, GeoLocation, Processor, RecordId, Scheduler, UploadStatus,
    WardenConfig,
};

/// warden - durable upload queue for security photos
#[derive(Parser)]
#[command(name = "warden")]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON config file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Queue document path; overrides `queue.store_path` from the config.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue a captured photo for upload
    Enqueue {
        /// Source handle, relative to `source.root`
        handle: String,

        /// Artifact id (default: the handle's file stem)
        #[arg(long)]
        id: Option<String>,

        #[arg(long, default_value = "manual")]
        reason: String,

        /// RFC 3339 capture time (default: now)
        #[arg(long)]
        captured_at: Option<String>,

        #[arg(long, requires = "lon")]
        lat: Option<f64>,

        #[arg(long, requires = "lat")]
        lon: Option<f64>,

        /// Location accuracy in meters
        #[arg(long, default_value_t = 0.0)]
        accuracy: f64,

        /// Run a processing pass right after enqueueing
        #[arg(long)]
        now: bool,
    },

    /// Run one processing pass
    Process,

    /// List queue records
    List {
        /// pending, in_progress, completed, failed or cancelled
        #[arg(long)]
        status: Option<String>,
    },

    /// Show per-status counts
    Counts,

    /// Reset a failed record and attempt it immediately
    Retry { id: String },

    /// Withdraw a record from processing
    Cancel { id: String },

    /// Remove completed or failed records
    Clear { which: ClearTarget },

    /// Process periodically until Ctrl-C
    Run {
        /// Overrides `queue.process_interval_secs`
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ClearTarget {
    Completed,
    Failed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut config = match &cli.config {
        Some(path) => WardenConfig::from_file(path)?,
        None => WardenConfig::default(),
    };
    if let Some(store) = cli.store {
        config.queue.store_path = store;
    }

    let processor = Arc::new(build_processor(&config).await?);

    match cli.command {
        Commands::Enqueue {
            handle,
            id,
            reason,
            captured_at,
            lat,
            lon,
            accuracy,
            now,
        } => {
            let captured_at = match captured_at {
                Some(raw) => DateTime::parse_from_rfc3339(&raw)
                    .with_context(|| format!("invalid --captured-at: {raw}"))?
                    .with_timezone(&Utc),
                None => Utc::now(),
            };
            let id = id.unwrap_or_else(|| default_artifact_id(&handle));
            let mut artifact = ArtifactRef::new(ArtifactId::new(id), handle, captured_at, reason);
            if let (Some(latitude), Some(longitude)) = (lat, lon) {
                artifact = artifact.with_location(GeoLocation {
                    latitude,
                    longitude,
                    accuracy,
                    timestamp: captured_at,
                });
            }

            if now {
                let (record, report) = processor.submit(artifact).await?;
                print_json(&json!({ "record": record, "pass": report }))?;
            } else {
                print_json(&processor.enqueue(artifact).await?)?;
            }
        }
        Commands::Process => {
            print_json(&processor.process_once().await)?;
        }
        Commands::List { status } => {
            let records = match status {
                Some(raw) => {
                    let status: UploadStatus = raw.parse()?;
                    processor.list_status(status).await
                }
                None => processor.list_all().await,
            };
            print_json(&records)?;
        }
        Commands::Counts => {
            print_json(&processor.counts().await)?;
        }
        Commands::Retry { id } => {
            print_json(&processor.retry(parse_id(&id)?).await?)?;
        }
        Commands::Cancel { id } => {
            print_json(&processor.cancel(parse_id(&id)?).await?)?;
        }
        Commands::Clear { which } => {
            let removed = match which {
                ClearTarget::Completed => processor.clear_completed().await?,
                ClearTarget::Failed => processor.clear_failed().await?,
            };
            print_json(&json!({ "removed": removed }))?;
        }
        Commands::Run { interval_secs } => {
            let interval = interval_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.queue.process_interval());
            let handle = Scheduler::new(processor.clone(), interval).start();

            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for ctrl-c")?;
            info!("shutdown requested");
            handle.shutdown().await;
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn build_processor(config: &WardenConfig) -> Result<Processor> {
    let uploader: Arc<dyn CloudUploader> = match &config.uploader {
        UploaderConfig::Simulated => Arc::new(SimulatedUploader::default()),
        UploaderConfig::Http { endpoint, token } => {
            Arc::new(HttpUploader::new(endpoint.clone(), token.clone()))
        }
    };

    let connectivity: Arc<dyn ConnectivityOracle> = match &config.connectivity {
        ConnectivityConfig::Always => Arc::new(AlwaysOnline),
        ConnectivityConfig::Probe { url, timeout_secs } => Arc::new(HttpProbe::new(
            url.clone(),
            Duration::from_secs(*timeout_secs),
        )),
    };

    let (primary, fallback) = notification_channels(&config.notify);

    let mut builder = Processor::builder()
        .record_store(Arc::new(JsonFileStore::new(config.queue.store_path.clone())))
        .source(Arc::new(FsArtifactSource::new(config.source.root.clone())))
        .uploader(uploader)
        .contacts(Arc::new(StaticContactDirectory::new(
            config.notify.contact.clone(),
        )))
        .primary_channel(primary)
        .connectivity(connectivity)
        .queue_config(&config.queue);
    if let Some(fallback) = fallback {
        builder = builder.fallback_channel(fallback);
    }
    Ok(builder.build().await?)
}

/// Webhook first with the log as fallback, or the log alone.
fn notification_channels(
    notify: &NotifyConfig,
) -> (
    Arc<dyn NotificationChannel>,
    Option<Arc<dyn NotificationChannel>>,
) {
    match &notify.webhook_url {
        Some(url) => (
            Arc::new(WebhookChannel::new("webhook", url.clone())),
            Some(Arc::new(LogChannel)),
        ),
        None => (Arc::new(LogChannel), None),
    }
}

fn parse_id(raw: &str) -> Result<RecordId> {
    raw.parse()
        .with_context(|| format!("invalid record id: {raw}"))
}

fn default_artifact_id(handle: &str) -> String {
    Path::new(handle)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(handle)
        .to_string()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
