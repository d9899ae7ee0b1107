//! Parallel chunk uploader.
//!
//! One task per chunk; a shared semaphore bounds how many are in flight,
//! and a task only reads its chunk from disk once it holds a permit.

use std::path::Path;
use std::sync::Arc;

use panxfer_protocol::ResponseStatus;
use panxfer_transfer::{BlockLayout, read_chunk_at};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{FailurePolicy, TransferConfig};
use crate::error::EngineError;
use crate::source::UploadEndpoint;
use crate::types::{ChunkAck, TransferEvent, UploadSession, emit};

/// Uploads every chunk of `local` into `session`.
///
/// Returns the commit block list (acknowledged checksums in sequence
/// order). Any failed chunk turns the whole call into
/// [`EngineError::PartialUploadFailure`] carrying the first failure's
/// remote code and message.
pub(crate) async fn upload_chunks(
    endpoint: Arc<dyn UploadEndpoint>,
    local: &Path,
    session: &UploadSession,
    layout: BlockLayout,
    config: &TransferConfig,
    cancel: &CancellationToken,
    events_tx: &mpsc::Sender<TransferEvent>,
) -> Result<Vec<String>, EngineError> {
    let total = layout.chunk_count();
    let gate = Arc::new(Semaphore::new(config.concurrency));
    let abort = cancel.child_token();
    let local: Arc<Path> = Arc::from(local);
    let remote: Arc<str> = Arc::from(session.path.as_str());
    let upload_id: Arc<str> = Arc::from(session.upload_id.as_str());

    let mut tasks = JoinSet::new();
    for seq in 0..total {
        let (offset, len) = layout.chunk_span(seq);
        let worker = ChunkWorker {
            endpoint: Arc::clone(&endpoint),
            local: Arc::clone(&local),
            remote: Arc::clone(&remote),
            upload_id: Arc::clone(&upload_id),
            seq: seq as u32,
            offset,
            len,
        };
        let gate = Arc::clone(&gate);
        let abort = abort.clone();

        tasks.spawn(async move {
            let result = tokio::select! {
                biased;
                _ = abort.cancelled() => Err(EngineError::Cancelled),
                r = worker.run(gate) => r,
            };
            (seq, len, result)
        });
    }

    let mut acks: Vec<Option<ChunkAck>> = vec![None; total];
    let mut first_failure: Option<EngineError> = None;

    while let Some(joined) = tasks.join_next().await {
        let failure = match joined {
            Ok((seq, bytes, Ok(ack))) => {
                emit(
                    events_tx,
                    TransferEvent::ChunkUploaded {
                        sequence: ack.sequence,
                        bytes,
                    },
                );
                acks[seq] = Some(ack);
                continue;
            }
            Ok((seq, _, Err(e))) => {
                if !matches!(e, EngineError::Cancelled) {
                    let (code, message) = failure_detail(&e);
                    warn!(chunk = seq, code, error = %message, "chunk upload failed");
                    emit(
                        events_tx,
                        TransferEvent::ChunkFailed {
                            sequence: seq as u32,
                            code,
                            message,
                        },
                    );
                }
                e
            }
            Err(e) => EngineError::from(e),
        };

        if first_failure.is_none() {
            if config.failure_policy == FailurePolicy::FailFast {
                abort.cancel();
            }
            first_failure = Some(failure);
        }
    }

    if let Some(e) = first_failure {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let acked = acks.iter().filter(|a| a.is_some()).count();
        let (code, message) = failure_detail(&e);
        return Err(EngineError::PartialUploadFailure {
            failed: total - acked,
            total,
            code,
            message,
        });
    }

    acks.into_iter()
        .enumerate()
        .map(|(seq, ack)| ack.map(|a| a.checksum).ok_or(EngineError::MissingPart(seq)))
        .collect()
}

fn failure_detail(e: &EngineError) -> (i64, String) {
    match e.remote_detail() {
        Some((code, message)) => (code, message.to_string()),
        None => (0, e.to_string()),
    }
}

struct ChunkWorker {
    endpoint: Arc<dyn UploadEndpoint>,
    local: Arc<Path>,
    remote: Arc<str>,
    upload_id: Arc<str>,
    seq: u32,
    offset: u64,
    len: u64,
}

impl ChunkWorker {
    async fn run(self, gate: Arc<Semaphore>) -> Result<ChunkAck, EngineError> {
        let _permit = gate
            .acquire_owned()
            .await
            .map_err(|_| EngineError::Cancelled)?;

        let (path, offset, len) = (Arc::clone(&self.local), self.offset, self.len);
        let data = tokio::task::spawn_blocking(move || read_chunk_at(&path, offset, len)).await??;

        let resp = self
            .endpoint
            .upload_chunk(&self.remote, &self.upload_id, self.seq, data)
            .await?;

        let ack = ChunkAck {
            sequence: self.seq,
            checksum: resp.md5.clone(),
            error_code: resp.code(),
            error_msg: resp.message().to_string(),
        };
        if ack.error_code != 0 {
            return Err(EngineError::RemoteApi {
                code: ack.error_code,
                message: ack.error_msg,
            });
        }
        if ack.checksum.is_empty() {
            return Err(EngineError::RemoteApi {
                code: 0,
                message: format!("chunk {} acknowledged without checksum", self.seq),
            });
        }
        if resp.part_seq != self.seq {
            debug!(chunk = self.seq, acked = resp.part_seq, "acknowledged sequence differs");
        }

        debug!(chunk = self.seq, offset, len, "chunk uploaded");
        Ok(ack)
    }
}
