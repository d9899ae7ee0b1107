//! Data types for the transfer flows.

use std::path::PathBuf;

use panxfer_protocol::FileInfo;
use tokio::sync::mpsc;
use tracing::trace;

/// Where a download's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSource {
    /// A download link, used as-is.
    Link(String),
    /// A stored file id, resolved through the file-metas lookup.
    FsId(u64),
    /// A stored file path, fetched through the PCS download endpoint.
    Path(String),
}

/// An open upload session, fixed for one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub upload_id: String,
    /// Locally computed per-chunk MD5s, as sent to precreate.
    pub block_list: Vec<String>,
    pub path: String,
    pub size: u64,
}

impl UploadSession {
    pub fn chunk_count(&self) -> usize {
        self.block_list.len()
    }
}

/// Acknowledgement of one uploaded chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkAck {
    pub sequence: u32,
    /// Checksum reported by the service; it becomes the commit block entry.
    pub checksum: String,
    pub error_code: i64,
    pub error_msg: String,
}

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub bytes: u64,
    /// Number of ranged parts, or 0 for a whole-file download.
    pub parts: usize,
}

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub info: FileInfo,
    /// `true` when the service already held the content and nothing was sent.
    pub deduplicated: bool,
}

/// Progress event emitted during a transfer.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// Download link probed.
    Probed {
        total_size: u64,
        supports_ranges: bool,
    },
    /// Download split into ranged parts.
    Planned { parts: usize, part_size: u64 },
    /// One download part written to its temporary file.
    PartFetched { index: usize, bytes: u64 },
    /// Download assembled at its destination.
    Downloaded { bytes: u64 },
    /// Local file sliced into upload chunks.
    Sliced {
        size: u64,
        chunks: usize,
        chunk_size: u64,
    },
    /// Service already holds identical content.
    DedupHit { path: String },
    /// One chunk acknowledged.
    ChunkUploaded { sequence: u32, bytes: u64 },
    /// One chunk rejected or failed.
    ChunkFailed {
        sequence: u32,
        code: i64,
        message: String,
    },
    /// Upload session committed.
    Committed { path: String, fs_id: u64 },
    /// Transfer failed.
    Failed { error: String },
}

/// Sends `event` without waiting; events are dropped when nobody listens
/// or the channel is full.
pub(crate) fn emit(events_tx: &mpsc::Sender<TransferEvent>, event: TransferEvent) {
    if let Err(e) = events_tx.try_send(event) {
        trace!(error = %e, "transfer event dropped");
    }
}
