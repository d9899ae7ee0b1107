//! Wire types for the cloud-storage open API.
//!
//! The service exposes two JSON conventions: the `xpan` endpoints report
//! failures through `errno`/`errmsg`, the PCS data endpoints through
//! `error_code`/`error_msg`. Both are modelled here together with the
//! request/response payloads used by the transfer engine.

pub mod constants;
mod lenient;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use messages::{
    ChunkUploadResponse, CommitRequest, FileMeta, FileMetasResponse, PrecreateRequest,
    PrecreateResponse, UserInfoResponse,
};
pub use types::{AccountTier, ApiStatus, FileInfo, PcsStatus, ResponseStatus};
