//! Download orchestrator.
//!
//! Resolves the link, probes it, plans byte-range parts and either fetches
//! the object in one request or fans parts out to the parallel fetcher
//! before merging them in order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use panxfer_protocol::AccountTier;
use panxfer_transfer::{PartFiles, merge_parts, part_size_for_tier, plan_parts};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::TransferConfig;
use crate::error::EngineError;
use crate::fetcher::fetch_parts;
use crate::source::{AccountInfo, FileMetaLookup, RangeSource};
use crate::types::{DownloadOutcome, DownloadSource, TransferEvent, emit};

/// Orchestrates parallel range downloads.
pub struct Downloader {
    source: Arc<dyn RangeSource>,
    links: Arc<dyn FileMetaLookup>,
    account: Arc<dyn AccountInfo>,
    config: TransferConfig,
    events_tx: mpsc::Sender<TransferEvent>,
    events_rx: Option<mpsc::Receiver<TransferEvent>>,
    cancel: CancellationToken,
}

impl Downloader {
    /// Creates a new downloader.
    pub fn new(
        source: Arc<dyn RangeSource>,
        links: Arc<dyn FileMetaLookup>,
        account: Arc<dyn AccountInfo>,
        config: TransferConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            source,
            links,
            account,
            config,
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<TransferEvent>> {
        self.events_rx.take()
    }

    /// Returns a cancellation token for this downloader's transfers.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Downloads `source` into `dest`.
    ///
    /// `dest` only ever appears complete: bytes are assembled beside it and
    /// renamed into place once their length matches the probed size.
    pub async fn download(
        &self,
        source: &DownloadSource,
        dest: &Path,
    ) -> Result<DownloadOutcome, EngineError> {
        match self.run(source, dest).await {
            Ok(outcome) => {
                info!(
                    dest = %outcome.path.display(),
                    bytes = outcome.bytes,
                    parts = outcome.parts,
                    "download completed"
                );
                Ok(outcome)
            }
            Err(e) => {
                error!(dest = %dest.display(), error = %e, "download failed");
                emit(
                    &self.events_tx,
                    TransferEvent::Failed {
                        error: e.to_string(),
                    },
                );
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        source: &DownloadSource,
        dest: &Path,
    ) -> Result<DownloadOutcome, EngineError> {
        self.config.validate()?;
        if dest.is_dir() {
            return Err(EngineError::InvalidArgument(format!(
                "destination is a directory: {}",
                dest.display()
            )));
        }
        self.check_cancelled()?;

        // 1. Resolve
        let url = self.resolve(source).await?;

        // 2. Probe
        self.check_cancelled()?;
        let probe = self.source.probe(&url).await.map_err(|e| match e {
            EngineError::Probe(_) => e,
            other => EngineError::Probe(other.to_string()),
        })?;
        let total = probe.content_length;
        emit(
            &self.events_tx,
            TransferEvent::Probed {
                total_size: total,
                supports_ranges: probe.accepts_ranges,
            },
        );

        // 3. Plan
        let tier = if probe.accepts_ranges {
            self.account_tier().await
        } else {
            AccountTier::Normal
        };
        let part_size = part_size_for_tier(tier, self.config.part_size);
        let plan = plan_parts(total, part_size, self.config.max_parts, probe.accepts_ranges)?;
        debug!(
            total,
            part_size,
            parts = plan.part_count(),
            ranged = !plan.is_whole_file(),
            "download planned"
        );

        // 4. Fetch
        self.check_cancelled()?;
        if plan.is_whole_file() {
            let bytes = self.fetch_whole(&url, total, dest).await?;
            emit(&self.events_tx, TransferEvent::Downloaded { bytes });
            return Ok(DownloadOutcome {
                path: dest.to_path_buf(),
                bytes,
                parts: 0,
            });
        }

        emit(
            &self.events_tx,
            TransferEvent::Planned {
                parts: plan.part_count(),
                part_size,
            },
        );

        let files = PartFiles::new(&self.part_dir(dest), &part_stem(dest), plan.part_count());
        let fetched = fetch_parts(
            Arc::clone(&self.source),
            &url,
            &plan,
            &files,
            &self.config,
            &self.cancel,
            &self.events_tx,
        )
        .await;

        // 5. Merge
        let merged = match fetched {
            Ok(results) => merge_parts(&results, total, dest)
                .await
                .map_err(EngineError::from),
            Err(e) => Err(e),
        };
        files.cleanup().await;

        let bytes = merged?;
        emit(&self.events_tx, TransferEvent::Downloaded { bytes });
        Ok(DownloadOutcome {
            path: dest.to_path_buf(),
            bytes,
            parts: plan.part_count(),
        })
    }

    async fn resolve(&self, source: &DownloadSource) -> Result<String, EngineError> {
        match source {
            DownloadSource::Link(url) => self.links.authorize(url),
            DownloadSource::FsId(fs_id) => self.links.download_link(*fs_id).await,
            DownloadSource::Path(path) => self.links.path_link(path),
        }
    }

    async fn account_tier(&self) -> AccountTier {
        match self.account.account_tier().await {
            Ok(tier) => tier,
            Err(e) => {
                warn!(error = %e, "account tier lookup failed, using defaults");
                AccountTier::Normal
            }
        }
    }

    /// Streams the object to a staging file and renames it over `dest`.
    async fn fetch_whole(&self, url: &str, total: u64, dest: &Path) -> Result<u64, EngineError> {
        let staging = staging_path(dest);
        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(EngineError::Cancelled),
            r = self.source.fetch_whole(url, &staging) => r,
        };
        let result = match fetched {
            Ok(bytes) if bytes == total => Ok(bytes),
            Ok(bytes) => Err(EngineError::IncompleteTransfer {
                expected: total,
                actual: bytes,
            }),
            Err(e) => Err(e),
        };

        match result {
            Ok(bytes) => {
                tokio::fs::rename(&staging, dest).await?;
                Ok(bytes)
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&staging).await
                    && rm.kind() != std::io::ErrorKind::NotFound
                {
                    warn!(path = %staging.display(), error = %rm, "failed to remove staging file");
                }
                Err(e)
            }
        }
    }

    fn part_dir(&self, dest: &Path) -> PathBuf {
        match (&self.config.part_dir, dest.parent()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(parent)) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn check_cancelled(&self) -> Result<(), EngineError> {
        if self.cancel.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

fn part_stem(dest: &Path) -> String {
    dest.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string())
}

fn staging_path(dest: &Path) -> PathBuf {
    dest.with_file_name(format!("{}.{}.download", part_stem(dest), std::process::id()))
}
