//! Subcommand execution.

use anyhow::Context;
use panxfer_api::Client;
use panxfer_engine::{Downloader, TransferEvent, Uploader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::{Cli, Command, DownloadArgs, UploadArgs};
use crate::config::{Config, TOKEN_ENV};

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let token = config
        .resolve_token(std::env::var(TOKEN_ENV).ok())
        .with_context(|| format!("no access token: set {TOKEN_ENV} or access_token in the config file"))?;
    let client = Client::new(&token).context("failed to build API client")?;

    match cli.command {
        Command::Download(args) => download(client, &config, args).await,
        Command::Upload(args) => upload(client, &config, args).await,
    }
}

async fn download(client: Client, config: &Config, args: DownloadArgs) -> anyhow::Result<()> {
    let source = args.source().context("no download source given")?;
    let mut downloader = Downloader::with_client(client, args.apply(config.transfer_config()));

    let logger = downloader.take_events().map(spawn_event_logger);
    let interrupt = cancel_on_interrupt(downloader.cancel_token());

    let result = downloader.download(&source, &args.out).await;
    interrupt.abort();
    drop(downloader);
    if let Some(logger) = logger {
        let _ = logger.await;
    }

    let outcome = result.with_context(|| format!("download to {} failed", args.out.display()))?;
    info!(
        path = %outcome.path.display(),
        bytes = outcome.bytes,
        parts = outcome.parts,
        "download complete"
    );
    Ok(())
}

async fn upload(client: Client, config: &Config, args: UploadArgs) -> anyhow::Result<()> {
    let mut uploader = Uploader::with_client(client, args.tuning.apply(config.transfer_config()));

    let logger = uploader.take_events().map(spawn_event_logger);
    let interrupt = cancel_on_interrupt(uploader.cancel_token());

    let result = uploader.upload(&args.file, &args.to).await;
    interrupt.abort();
    drop(uploader);
    if let Some(logger) = logger {
        let _ = logger.await;
    }

    let outcome = result.with_context(|| format!("upload of {} failed", args.file.display()))?;
    info!(
        path = %outcome.info.path,
        fs_id = outcome.info.fs_id,
        size = outcome.info.size,
        md5 = %outcome.info.md5,
        deduplicated = outcome.deduplicated,
        "upload complete"
    );
    Ok(())
}

/// Cancels `token` on Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling transfer");
            token.cancel();
        }
    })
}

fn spawn_event_logger(mut rx: mpsc::Receiver<TransferEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            log_event(&event);
        }
    })
}

fn log_event(event: &TransferEvent) {
    match event {
        TransferEvent::Probed {
            total_size,
            supports_ranges,
        } => info!(total_size, supports_ranges, "probed"),
        TransferEvent::Planned { parts, part_size } => {
            info!(parts, part_size, "downloading in parts")
        }
        TransferEvent::PartFetched { index, bytes } => debug!(index, bytes, "part fetched"),
        TransferEvent::Downloaded { bytes } => debug!(bytes, "downloaded"),
        TransferEvent::Sliced {
            size,
            chunks,
            chunk_size,
        } => info!(size, chunks, chunk_size, "file sliced"),
        TransferEvent::DedupHit { path } => info!(%path, "content already stored, skipping upload"),
        TransferEvent::ChunkUploaded { sequence, bytes } => {
            debug!(sequence, bytes, "chunk uploaded")
        }
        TransferEvent::ChunkFailed {
            sequence,
            code,
            message,
        } => warn!(sequence, code, %message, "chunk failed"),
        TransferEvent::Committed { path, fs_id } => debug!(%path, fs_id, "committed"),
        TransferEvent::Failed { error } => debug!(%error, "transfer failed"),
    }
}
