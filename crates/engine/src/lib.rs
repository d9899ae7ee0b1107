//! Parallel transfer engine for the cloud-storage service.
//!
//! This crate holds the **orchestration** of both transfer directions. It
//! talks to the service only through the collaborator traits in
//! [`source`]; [`http`] implements them on top of `panxfer_api::Client`,
//! and tests substitute mocks.
//!
//! # Download
//!
//! 1. **Resolve**: direct link, file id (metas lookup) or remote path
//! 2. **Probe**: HEAD for range support and total size
//! 3. **Plan**: split into byte-range parts, or fall back to one request
//! 4. **Fetch**: one task per part behind a counting semaphore
//! 5. **Merge**: concatenate parts in index order, remove part files
//!
//! # Upload
//!
//! 1. **Slice**: whole-file, slice and per-chunk MD5s
//! 2. **Precreate**: open a session, or stop on a dedup hit
//! 3. **Upload**: one task per chunk behind a counting semaphore
//! 4. **Commit**: assemble the block list in order and create the file

mod chunks;
pub mod config;
pub mod download;
pub mod error;
mod fetcher;
pub mod http;
pub mod source;
pub mod types;
pub mod upload;

#[cfg(test)]
mod testing;

// Re-export primary types for convenience.
pub use config::{FailurePolicy, TransferConfig};
pub use download::Downloader;
pub use error::EngineError;
pub use source::{AccountInfo, FileMetaLookup, RangeSource, UploadEndpoint};
pub use types::{
    ChunkAck, DownloadOutcome, DownloadSource, TransferEvent, UploadOutcome, UploadSession,
};
pub use upload::Uploader;
