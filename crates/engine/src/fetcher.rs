//! Parallel part fetcher.
//!
//! One task per part; a shared semaphore bounds how many are in flight.
//! Each task owns exactly one slot of the results arena, filled by the
//! orchestrator after the task joins.

use std::path::PathBuf;
use std::sync::Arc;

use panxfer_transfer::{Part, PartFiles, PartResult, TransferPlan};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{FailurePolicy, TransferConfig};
use crate::error::EngineError;
use crate::source::RangeSource;
use crate::types::{TransferEvent, emit};

/// Fetches every part of `plan` into the paths reserved by `files`.
///
/// Returns the filled results arena, or the first failure once all
/// workers have joined. Under [`FailurePolicy::FailFast`] the first
/// failure cancels the remaining workers.
pub(crate) async fn fetch_parts(
    source: Arc<dyn RangeSource>,
    url: &str,
    plan: &TransferPlan,
    files: &PartFiles,
    config: &TransferConfig,
    cancel: &CancellationToken,
    events_tx: &mpsc::Sender<TransferEvent>,
) -> Result<Vec<Option<PartResult>>, EngineError> {
    let gate = Arc::new(Semaphore::new(config.concurrency));
    let abort = cancel.child_token();
    let url: Arc<str> = Arc::from(url);

    let mut tasks = JoinSet::new();
    for part in plan.parts().iter().copied() {
        let worker = PartWorker {
            source: Arc::clone(&source),
            url: Arc::clone(&url),
            part,
            path: files.path(part.index).to_path_buf(),
        };
        let gate = Arc::clone(&gate);
        let abort = abort.clone();

        tasks.spawn(async move {
            let result = tokio::select! {
                biased;
                _ = abort.cancelled() => Err(EngineError::Cancelled),
                r = worker.run(gate) => r,
            };
            (part.index, result)
        });
    }

    let mut results: Vec<Option<PartResult>> = vec![None; plan.part_count()];
    let mut first_failure: Option<EngineError> = None;

    while let Some(joined) = tasks.join_next().await {
        let outcome = match joined {
            Ok((index, Ok(part))) => {
                emit(
                    events_tx,
                    TransferEvent::PartFetched {
                        index,
                        bytes: part.len,
                    },
                );
                results[index] = Some(part);
                continue;
            }
            Ok((index, Err(e))) => {
                if !matches!(e, EngineError::Cancelled) {
                    warn!(part = index, error = %e, "part fetch failed");
                }
                e
            }
            Err(e) => EngineError::from(e),
        };

        if first_failure.is_none() {
            if config.failure_policy == FailurePolicy::FailFast {
                abort.cancel();
            }
            first_failure = Some(outcome);
        }
    }

    match first_failure {
        Some(e) => Err(e),
        None => Ok(results),
    }
}

struct PartWorker {
    source: Arc<dyn RangeSource>,
    url: Arc<str>,
    part: Part,
    path: PathBuf,
}

impl PartWorker {
    async fn run(self, gate: Arc<Semaphore>) -> Result<PartResult, EngineError> {
        let _permit = gate
            .acquire_owned()
            .await
            .map_err(|_| EngineError::Cancelled)?;

        let Part { index, from, to } = self.part;
        let data = self.source.fetch_range(&self.url, from, to).await?;

        let expected = self.part.len();
        let actual = data.len() as u64;
        if actual != expected {
            return Err(EngineError::PartLengthMismatch {
                index,
                expected,
                actual,
            });
        }

        tokio::fs::write(&self.path, &data).await?;
        debug!(part = index, from, to, "part fetched");

        Ok(PartResult {
            index,
            path: self.path,
            len: actual,
        })
    }
}
