mod assembler;
mod backend;
mod config;
mod error;
mod events;
mod history;
mod poller;
mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::unbounded_channel;
use tracing::{info, warn};

use sy_core::{AudioSample, Blob};

use crate::backend::BackendClient;
use crate::config::AppConfig;
use crate::events::PollEvent;
use crate::history::HistoryStore;
use crate::poller::JobPoller;
use crate::sync::SyncBridge;
use crate::sync::remote::HttpRemoteHistory;

#[derive(Parser)]
#[command(
    name = "synesthesia",
    about = "Generate AI audio sample packs from images",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit an image, wait for the pack and store it in history
    Generate {
        image: PathBuf,
        /// Also write the generated samples to this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Inspect the local history cache
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Exchange history with the remote store
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },
    /// Write the serialized history document to a file
    Export { file: PathBuf },
    /// Load a serialized history document from a file
    Import {
        file: PathBuf,
        /// Drop local entries before importing
        #[arg(long)]
        replace: bool,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    List,
    Show {
        id: String,
        /// Write the entry's binaries out as playable temp files
        #[arg(long)]
        materialize: bool,
    },
    Delete {
        id: String,
    },
    Clear,
}

#[derive(Subcommand)]
enum SyncAction {
    Push,
    Pull {
        /// Drop local entries before importing the remote document
        #[arg(long)]
        replace: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    let store = HistoryStore::open(config.data_dir.clone()).await?;
    let bridge = config.remote_url.as_ref().map(|url| {
        SyncBridge::new(
            store.clone(),
            Arc::new(HttpRemoteHistory::new(url.clone())),
        )
    });

    match cli.command {
        Command::Generate { image, out } => {
            generate(&config, &store, bridge.as_ref(), &image, out.as_deref()).await
        }
        Command::History { action } => history_command(&store, bridge.as_ref(), action).await,
        Command::Sync { action } => {
            let bridge = bridge.ok_or_else(|| anyhow!("SY_REMOTE_URL is not configured"))?;
            match action {
                SyncAction::Push => {
                    bridge.push_to_remote().await?;
                    info!("history pushed to remote");
                }
                SyncAction::Pull { replace } => {
                    let imported = bridge.pull_from_remote(replace).await?;
                    info!(imported, "history pulled from remote");
                }
            }
            Ok(())
        }
        Command::Export { file } => {
            let document = sync::export(&store).await?;
            tokio::fs::write(&file, document)
                .await
                .with_context(|| format!("write {}", file.display()))?;
            info!(file = %file.display(), "history exported");
            Ok(())
        }
        Command::Import { file, replace } => {
            let document = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("read {}", file.display()))?;
            let imported = sync::import(&store, &document, replace).await?;
            info!(imported, "history imported");
            Ok(())
        }
    }
}

async fn generate(
    config: &AppConfig,
    store: &HistoryStore,
    bridge: Option<&SyncBridge>,
    image_path: &Path,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let data = tokio::fs::read(image_path)
        .await
        .with_context(|| format!("read {}", image_path.display()))?;
    let mime = Blob::image_mime_for_extension(
        image_path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(""),
    );
    let image = Blob::new(data, mime);

    let client = BackendClient::new(config.backend_url.clone());
    let job_id = client.submit(&image).await?;
    info!(job_id = %job_id, "job submitted");

    let (tx, mut rx) = unbounded_channel();
    let reporter = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                PollEvent::Progress { percent, step } => {
                    info!(percent, step = %step, "generating")
                }
                PollEvent::Downloading => info!("downloading result archive"),
                PollEvent::Done { sample_count } => info!(sample_count, "pack assembled"),
                PollEvent::Failed { error } => warn!(error = %error, "generation failed"),
            }
        }
    });

    let poller = JobPoller::new(client, config.poll_interval);
    let samples = poller.run(&job_id, &tx).await?;
    drop(tx);
    let _ = reporter.await;

    if let Some(dir) = out {
        write_samples(dir, &samples).await?;
    }

    let entry_id = match bridge {
        Some(bridge) => bridge.save_with_sync(image, samples).await?,
        None => store.create(image, samples).await?,
    };
    info!(entry_id = %entry_id, "stored history entry");

    Ok(())
}

async fn write_samples(dir: &Path, samples: &[AudioSample]) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("create {}", dir.display()))?;
    for sample in samples {
        let path = dir.join(&sample.filename);
        tokio::fs::write(&path, &sample.data)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        info!(file = %path.display(), description = %sample.description, "wrote sample");
    }
    Ok(())
}

async fn history_command(
    store: &HistoryStore,
    bridge: Option<&SyncBridge>,
    action: HistoryAction,
) -> anyhow::Result<()> {
    match action {
        HistoryAction::List => {
            // Bring remote entries in before listing; failure only warns.
            if let Some(bridge) = bridge {
                if let Err(err) = bridge.pull_from_remote(false).await {
                    warn!(error = %err, "remote pull failed, listing local entries only");
                }
            }
            let entries = store.list_all().await?;
            if entries.is_empty() {
                println!("history is empty");
            }
            for summary in entries {
                let created: DateTime<Utc> = summary.created_at.clone().into();
                println!(
                    "{}  {}  ({} byte thumbnail)",
                    summary.entry_id,
                    created.to_rfc3339(),
                    summary.thumbnail.len()
                );
            }
        }
        HistoryAction::Show { id, materialize } => {
            let record = store.get(&id).await?;
            let created: DateTime<Utc> = record.created_at.clone().into();
            println!("entry {}", record.entry_id);
            println!("created {}", created.to_rfc3339());
            println!("image {} ({} bytes)", record.image_mime, record.image.len());
            for sample in &record.samples {
                println!(
                    "  {}  {} bytes  {}",
                    sample.filename,
                    sample.data.len(),
                    sample.description
                );
            }
            if materialize {
                let display = store.to_display_format(&record)?;
                println!("{}  {}", display.image.path().display(), display.image.mime);
                for handle in &display.samples {
                    println!(
                        "{}  {}  {}",
                        handle.path().display(),
                        handle.mime,
                        handle.description.as_deref().unwrap_or("")
                    );
                }
                // Files stay on disk for playback; delete them when done.
            }
        }
        HistoryAction::Delete { id } => {
            match bridge {
                Some(bridge) => bridge.delete_with_sync(&id).await?,
                None => store.delete(&id).await?,
            }
            info!(id = %id, "history entry deleted");
        }
        HistoryAction::Clear => {
            match bridge {
                Some(bridge) => bridge.clear_with_sync().await?,
                None => store.clear().await?,
            }
            info!("history cleared");
        }
    }
    Ok(())
}
