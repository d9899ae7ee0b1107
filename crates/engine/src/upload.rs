//! Upload orchestrator.
//!
//! Slices the local file, runs the precreate handshake, uploads chunks in
//! parallel and commits the session. A dedup hit at precreate ends the
//! upload without sending any bytes.

use std::path::Path;
use std::sync::Arc;

use panxfer_protocol::{AccountTier, CommitRequest, FileInfo, PrecreateRequest, PrecreateResponse};
use panxfer_transfer::{
    BlockDigest, chunk_size_for_tier, sanitize_remote_path, slice_file, validate_remote_path,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::chunks::upload_chunks;
use crate::config::TransferConfig;
use crate::error::EngineError;
use crate::source::{AccountInfo, UploadEndpoint};
use crate::types::{TransferEvent, UploadOutcome, UploadSession, emit};

/// Orchestrates chunked, deduplicating uploads.
pub struct Uploader {
    endpoint: Arc<dyn UploadEndpoint>,
    account: Arc<dyn AccountInfo>,
    config: TransferConfig,
    events_tx: mpsc::Sender<TransferEvent>,
    events_rx: Option<mpsc::Receiver<TransferEvent>>,
    cancel: CancellationToken,
}

impl Uploader {
    /// Creates a new uploader.
    pub fn new(
        endpoint: Arc<dyn UploadEndpoint>,
        account: Arc<dyn AccountInfo>,
        config: TransferConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            endpoint,
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

    /// Returns a cancellation token for this uploader's transfers.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Uploads `local` to the remote path `remote`.
    ///
    /// Characters the service cannot store are stripped from `remote`
    /// first; the stored path is reported in the returned [`FileInfo`].
    pub async fn upload(&self, local: &Path, remote: &str) -> Result<UploadOutcome, EngineError> {
        match self.run(local, remote).await {
            Ok(outcome) => {
                info!(
                    path = %outcome.info.path,
                    fs_id = outcome.info.fs_id,
                    size = outcome.info.size,
                    deduplicated = outcome.deduplicated,
                    "upload completed"
                );
                Ok(outcome)
            }
            Err(e) => {
                error!(local = %local.display(), error = %e, "upload failed");
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

    async fn run(&self, local: &Path, remote: &str) -> Result<UploadOutcome, EngineError> {
        self.config.validate()?;
        let remote = sanitize_remote_path(remote);
        validate_remote_path(&remote)?;

        let meta = tokio::fs::metadata(local).await?;
        if !meta.is_file() {
            return Err(EngineError::InvalidArgument(format!(
                "not a regular file: {}",
                local.display()
            )));
        }
        self.check_cancelled()?;

        // 1. Slice
        let chunk_size = chunk_size_for_tier(self.account_tier().await);
        let digest = {
            let path = local.to_path_buf();
            tokio::task::spawn_blocking(move || slice_file(&path, chunk_size)).await??
        };
        emit(
            &self.events_tx,
            TransferEvent::Sliced {
                size: digest.size(),
                chunks: digest.block_list.len(),
                chunk_size: digest.layout.chunk_size(),
            },
        );

        // 2. Precreate
        self.check_cancelled()?;
        let precreate = self.precreate(&remote, &digest).await?;
        if precreate.is_dedup_hit() {
            let info = dedup_info(precreate, &remote, &digest);
            debug!(path = %info.path, fs_id = info.fs_id, "content already stored");
            emit(
                &self.events_tx,
                TransferEvent::DedupHit {
                    path: info.path.clone(),
                },
            );
            return Ok(UploadOutcome {
                info,
                deduplicated: true,
            });
        }
        if precreate.upload_id.is_empty() {
            return Err(EngineError::RemoteApi {
                code: 0,
                message: "precreate returned no upload id".into(),
            });
        }

        let session = UploadSession {
            upload_id: precreate.upload_id,
            block_list: digest.block_list.clone(),
            path: remote,
            size: digest.size(),
        };
        debug!(
            upload_id = %session.upload_id,
            chunks = session.chunk_count(),
            pending = precreate.block_list.len(),
            "upload session opened"
        );

        // 3. Upload
        self.check_cancelled()?;
        let block_list = upload_chunks(
            Arc::clone(&self.endpoint),
            local,
            &session,
            digest.layout,
            &self.config,
            &self.cancel,
            &self.events_tx,
        )
        .await?;

        // 4. Commit
        self.check_cancelled()?;
        let req = CommitRequest {
            path: session.path.clone(),
            upload_id: session.upload_id.clone(),
            block_list,
            size: session.size,
        };
        let info = self.endpoint.commit(&req).await?;
        emit(
            &self.events_tx,
            TransferEvent::Committed {
                path: info.path.clone(),
                fs_id: info.fs_id,
            },
        );

        Ok(UploadOutcome {
            info,
            deduplicated: false,
        })
    }

    async fn precreate(
        &self,
        remote: &str,
        digest: &BlockDigest,
    ) -> Result<PrecreateResponse, EngineError> {
        let req = PrecreateRequest {
            path: remote.to_string(),
            size: digest.size(),
            block_list: digest.block_list.clone(),
            content_md5: digest.content_md5.clone(),
            slice_md5: digest.slice_md5.clone(),
        };
        self.endpoint.precreate(&req).await
    }

    async fn account_tier(&self) -> AccountTier {
        match self.account.account_tier().await {
            Ok(tier) => tier,
            Err(e) => {
                warn!(error = %e, "account tier lookup failed, using default chunk size");
                AccountTier::Normal
            }
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

/// Stored file metadata for a dedup hit, carrying the precreate envelope.
fn dedup_info(resp: PrecreateResponse, remote: &str, digest: &BlockDigest) -> FileInfo {
    let mut info = resp.info.unwrap_or_else(|| FileInfo {
        path: remote.to_string(),
        size: digest.size(),
        md5: digest.content_md5.clone(),
        ..Default::default()
    });
    info.status = resp.status;
    info
}
