//! Byte-range partitioning, content-addressed block slicing and in-order
//! reassembly shared by the download and upload engines.

mod chunked;
mod merge;
mod plan;
mod policy;
mod slicer;
mod validation;

pub use chunked::{Chunk, ChunkReader, checksum_bytes, read_chunk_at};
pub use merge::{PartFiles, PartResult, merge_parts};
pub use plan::{Part, TransferPlan, plan_parts};
pub use policy::{BlockLayout, chunk_size_for_tier, part_size_for_tier};
pub use slicer::{BlockDigest, slice_file};
pub use validation::{sanitize_remote_path, validate_remote_path};

/// Default upload chunk size: 4 MiB.
///
/// Normal accounts are held to exactly this size; higher tiers may use
/// [`VIP_CHUNK_SIZE`] or [`SVIP_CHUNK_SIZE`].
pub const DEFAULT_CHUNK_SIZE: u64 = 4 * 1024 * 1024;

/// Chunk size ceiling for VIP accounts: 16 MiB.
pub const VIP_CHUNK_SIZE: u64 = 16 * 1024 * 1024;

/// Chunk size ceiling for super-VIP accounts: 32 MiB.
pub const SVIP_CHUNK_SIZE: u64 = 32 * 1024 * 1024;

/// Length of the leading window hashed into the slice checksum: 256 KiB.
pub const SLICE_CHECKSUM_LEN: u64 = 256 * 1024;

/// Default target size of a download part: 4 MiB.
pub const DEFAULT_PART_SIZE: u64 = 4 * 1024 * 1024;

/// Download part size used for super-VIP accounts: 50 MiB.
pub const SVIP_PART_SIZE: u64 = 50 * 1024 * 1024;

/// Hard ceiling on the number of parts in a download plan.
pub const DEFAULT_MAX_PARTS: usize = 100;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("part {0} has no result")]
    MissingPart(usize),

    #[error("incomplete transfer: expected {expected} bytes, merged {actual}")]
    IncompleteTransfer { expected: u64, actual: u64 },

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
