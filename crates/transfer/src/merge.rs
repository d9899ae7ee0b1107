//! Temporary part files and their in-order reassembly.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::TransferError;

/// Distinguishes plans created within the same clock tick.
static PLAN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A fetched part persisted to its temporary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartResult {
    pub index: usize,
    pub path: PathBuf,
    pub len: u64,
}

/// Owns the temporary file paths of one download plan.
///
/// Paths are fixed up front so that every file a worker may have created
/// can be removed, including those of workers that were cancelled. Call
/// [`cleanup`](Self::cleanup) on every exit path; dropping the guard
/// without it falls back to synchronous removal.
#[derive(Debug)]
pub struct PartFiles {
    paths: Vec<PathBuf>,
}

impl PartFiles {
    /// Reserves `count` collision-free part paths in `dir`.
    ///
    /// Names have the form `<stem>.<pid>-<nanos>-<seq>.<index>.part`.
    pub fn new(dir: &Path, stem: &str, count: usize) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let seq = PLAN_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tag = format!("{}-{nanos}-{seq}", std::process::id());

        let paths = (0..count)
            .map(|index| dir.join(format!("{stem}.{tag}.{index}.part")))
            .collect();
        Self { paths }
    }

    /// Temporary path reserved for part `index`.
    pub fn path(&self, index: usize) -> &Path {
        &self.paths[index]
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Removes every part file concurrently. Returns how many existed.
    ///
    /// Removal failures are logged, never returned.
    pub async fn cleanup(mut self) -> usize {
        let paths = std::mem::take(&mut self.paths);
        let mut tasks = JoinSet::new();
        for path in paths {
            tasks.spawn(async move {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => true,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to remove part file");
                        false
                    }
                }
            });
        }

        let mut removed = 0;
        while let Some(joined) = tasks.join_next().await {
            if matches!(joined, Ok(true)) {
                removed += 1;
            }
        }
        debug!(removed, "part files cleaned up");
        removed
    }
}

impl Drop for PartFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Concatenates `results` in index order into `dest`.
///
/// Bytes go to a staging file beside `dest` that is renamed over it only
/// once the merged length equals `expected`; on any failure the staging
/// file is removed and `dest` is left untouched.
pub async fn merge_parts(
    results: &[Option<PartResult>],
    expected: u64,
    dest: &Path,
) -> Result<u64, TransferError> {
    let parts = results
        .iter()
        .enumerate()
        .map(|(i, slot)| slot.as_ref().ok_or(TransferError::MissingPart(i)))
        .collect::<Result<Vec<_>, _>>()?;

    let staging = staging_path(dest);
    match write_parts(&parts, &staging).await {
        Ok(actual) if actual == expected => {
            tokio::fs::rename(&staging, dest).await?;
            info!(dest = %dest.display(), bytes = actual, parts = parts.len(), "parts merged");
            Ok(actual)
        }
        Ok(actual) => {
            let _ = tokio::fs::remove_file(&staging).await;
            Err(TransferError::IncompleteTransfer { expected, actual })
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&staging).await;
            Err(e)
        }
    }
}

async fn write_parts(parts: &[&PartResult], staging: &Path) -> Result<u64, TransferError> {
    let mut out = tokio::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(staging)
        .await?;

    let mut total = 0u64;
    for part in parts {
        let data = tokio::fs::read(&part.path).await?;
        out.write_all(&data).await?;
        total += data.len() as u64;
    }
    out.flush().await?;
    out.sync_all().await?;
    Ok(total)
}

fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".merging");
    dest.with_file_name(name)
}
