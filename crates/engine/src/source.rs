//! Collaborator traits the orchestrators are written against.
//!
//! [`crate::http`] implements them on top of `panxfer_api::Client`. Keeping
//! the engine behind traits decouples it from the transport and lets tests
//! drive every flow with in-memory mocks.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use panxfer_api::RangeProbe;
use panxfer_protocol::{
    AccountTier, ChunkUploadResponse, CommitRequest, FileInfo, PrecreateRequest,
    PrecreateResponse,
};

use crate::error::EngineError;

/// Boxed future returned by collaborator methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Byte source behind a download link.
pub trait RangeSource: Send + Sync {
    /// Reports range support and total size. Every failure is a
    /// [`EngineError::Probe`].
    fn probe<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RangeProbe, EngineError>>;

    /// Returns the bytes of the inclusive range `[from, to]`.
    fn fetch_range<'a>(
        &'a self,
        url: &'a str,
        from: u64,
        to: u64,
    ) -> BoxFuture<'a, Result<Vec<u8>, EngineError>>;

    /// Streams the whole object into `dest`, returning bytes written.
    fn fetch_whole<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
    ) -> BoxFuture<'a, Result<u64, EngineError>>;
}

/// The precreate / chunk upload / commit endpoints.
pub trait UploadEndpoint: Send + Sync {
    fn precreate<'a>(
        &'a self,
        req: &'a PrecreateRequest,
    ) -> BoxFuture<'a, Result<PrecreateResponse, EngineError>>;

    /// Uploads chunk `seq`. A response carrying a non-zero error code may
    /// be returned as `Ok`; callers inspect it.
    fn upload_chunk<'a>(
        &'a self,
        path: &'a str,
        upload_id: &'a str,
        seq: u32,
        data: Vec<u8>,
    ) -> BoxFuture<'a, Result<ChunkUploadResponse, EngineError>>;

    fn commit<'a>(&'a self, req: &'a CommitRequest) -> BoxFuture<'a, Result<FileInfo, EngineError>>;
}

/// Account tier lookup used for chunk and part sizing.
///
/// Failures are never fatal: callers fall back to [`AccountTier::Normal`].
pub trait AccountInfo: Send + Sync {
    fn account_tier(&self) -> BoxFuture<'_, Result<AccountTier, EngineError>>;
}

/// Resolves download links for stored files.
pub trait FileMetaLookup: Send + Sync {
    /// Authorized download link of the file with id `fs_id`.
    fn download_link(&self, fs_id: u64) -> BoxFuture<'_, Result<String, EngineError>>;

    /// Authorized download URL of the file stored at `path`.
    fn path_link(&self, path: &str) -> Result<String, EngineError>;

    /// `link` with the access token attached.
    fn authorize(&self, link: &str) -> Result<String, EngineError>;
}
