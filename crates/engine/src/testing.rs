//! In-memory collaborators for engine tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use panxfer_api::RangeProbe;
use panxfer_protocol::{
    AccountTier, ApiStatus, ChunkUploadResponse, CommitRequest, FileInfo, PcsStatus,
    PrecreateRequest, PrecreateResponse,
};
use panxfer_transfer::checksum_bytes;

use crate::error::EngineError;
use crate::source::{AccountInfo, BoxFuture, FileMetaLookup, RangeSource, UploadEndpoint};

/// Serves ranges out of an in-memory object.
pub(crate) struct MockSource {
    data: Vec<u8>,
    supports_ranges: bool,
    reported_size: Option<u64>,
    whole_len: Option<usize>,
    fail_from: Option<u64>,
    truncate_from: Option<u64>,
    delay: Duration,
    probes: Mutex<Vec<String>>,
    ranges: Mutex<Vec<(u64, u64)>>,
    pub whole_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl MockSource {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            supports_ranges: true,
            reported_size: None,
            whole_len: None,
            fail_from: None,
            truncate_from: None,
            delay: Duration::ZERO,
            probes: Mutex::new(Vec::new()),
            ranges: Mutex::new(Vec::new()),
            whole_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn without_ranges(mut self) -> Self {
        self.supports_ranges = false;
        self
    }

    /// Probe reports `size` instead of the real length.
    pub fn reporting_size(mut self, size: u64) -> Self {
        self.reported_size = Some(size);
        self
    }

    /// Whole-file fetches stop after `len` bytes.
    pub fn whole_truncated_to(mut self, len: usize) -> Self {
        self.whole_len = Some(len);
        self
    }

    /// The part starting at `from` fails with a transport error.
    pub fn failing_at(mut self, from: u64) -> Self {
        self.fail_from = Some(from);
        self
    }

    /// The part starting at `from` comes back one byte short.
    pub fn truncating_at(mut self, from: u64) -> Self {
        self.truncate_from = Some(from);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn range_requests(&self) -> Vec<(u64, u64)> {
        self.ranges.lock().unwrap().clone()
    }

    pub fn probed_urls(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }
}

impl RangeSource for MockSource {
    fn probe<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RangeProbe, EngineError>> {
        Box::pin(async move {
            self.probes.lock().unwrap().push(url.to_string());
            Ok(RangeProbe {
                accepts_ranges: self.supports_ranges,
                content_length: self.reported_size.unwrap_or(self.data.len() as u64),
            })
        })
    }

    fn fetch_range<'a>(
        &'a self,
        _url: &'a str,
        from: u64,
        to: u64,
    ) -> BoxFuture<'a, Result<Vec<u8>, EngineError>> {
        Box::pin(async move {
            self.ranges.lock().unwrap().push((from, to));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_from == Some(from) {
                return Err(EngineError::Transport("injected failure".into()));
            }
            let end = (to as usize + 1).min(self.data.len());
            let mut body = self.data[from as usize..end].to_vec();
            if self.truncate_from == Some(from) {
                body.pop();
            }
            Ok(body)
        })
    }

    fn fetch_whole<'a>(
        &'a self,
        _url: &'a str,
        dest: &'a Path,
    ) -> BoxFuture<'a, Result<u64, EngineError>> {
        Box::pin(async move {
            self.whole_calls.fetch_add(1, Ordering::SeqCst);
            let len = self.whole_len.unwrap_or(self.data.len());
            tokio::fs::write(dest, &self.data[..len]).await?;
            Ok(len as u64)
        })
    }
}

/// Fixed account tier, or a failing lookup.
pub(crate) struct MockAccount(pub Option<AccountTier>);

impl AccountInfo for MockAccount {
    fn account_tier(&self) -> BoxFuture<'_, Result<AccountTier, EngineError>> {
        Box::pin(async move {
            self.0.ok_or_else(|| EngineError::RemoteApi {
                code: -6,
                message: "user info unavailable".into(),
            })
        })
    }
}

/// Link table for file ids; paths map to `mock://path<path>` and direct
/// links get `access_token=mock` appended.
#[derive(Default)]
pub(crate) struct MockLinks {
    pub links: HashMap<u64, String>,
}

impl FileMetaLookup for MockLinks {
    fn download_link(&self, fs_id: u64) -> BoxFuture<'_, Result<String, EngineError>> {
        Box::pin(async move {
            self.links
                .get(&fs_id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound(format!("fs_id {fs_id}")))
        })
    }

    fn path_link(&self, path: &str) -> Result<String, EngineError> {
        Ok(format!("mock://path{path}"))
    }

    fn authorize(&self, link: &str) -> Result<String, EngineError> {
        let sep = if link.contains('?') { '&' } else { '?' };
        Ok(format!("{link}{sep}access_token=mock"))
    }
}

/// Records every upload call and answers from a script.
pub(crate) struct MockEndpoint {
    precreate_response: PrecreateResponse,
    /// Chunk sequence that is rejected, and the error code it carries.
    reject: Option<(u32, i64)>,
    pub precreates: Mutex<Vec<PrecreateRequest>>,
    pub chunks: Mutex<Vec<(u32, Vec<u8>)>>,
    pub commits: Mutex<Vec<CommitRequest>>,
}

impl MockEndpoint {
    pub fn new_session(upload_id: &str) -> Self {
        Self::with_precreate(PrecreateResponse {
            upload_id: upload_id.into(),
            return_type: 1,
            ..Default::default()
        })
    }

    pub fn dedup_hit(info: FileInfo) -> Self {
        Self::with_precreate(PrecreateResponse {
            status: ApiStatus {
                request_id: 42,
                ..Default::default()
            },
            return_type: 2,
            info: Some(info),
            ..Default::default()
        })
    }

    pub fn with_precreate(precreate_response: PrecreateResponse) -> Self {
        Self {
            precreate_response,
            reject: None,
            precreates: Mutex::new(Vec::new()),
            chunks: Mutex::new(Vec::new()),
            commits: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(mut self, seq: u32, code: i64) -> Self {
        self.reject = Some((seq, code));
        self
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.lock().unwrap().len()
    }
}

impl UploadEndpoint for MockEndpoint {
    fn precreate<'a>(
        &'a self,
        req: &'a PrecreateRequest,
    ) -> BoxFuture<'a, Result<PrecreateResponse, EngineError>> {
        Box::pin(async move {
            self.precreates.lock().unwrap().push(req.clone());
            Ok(self.precreate_response.clone())
        })
    }

    fn upload_chunk<'a>(
        &'a self,
        _path: &'a str,
        upload_id: &'a str,
        seq: u32,
        data: Vec<u8>,
    ) -> BoxFuture<'a, Result<ChunkUploadResponse, EngineError>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            let md5 = checksum_bytes(&data);
            self.chunks.lock().unwrap().push((seq, data));

            if let Some((bad, code)) = self.reject
                && bad == seq
            {
                return Ok(ChunkUploadResponse {
                    status: PcsStatus {
                        error_code: code,
                        error_msg: "chunk rejected".into(),
                        request_id: 7,
                    },
                    ..Default::default()
                });
            }
            Ok(ChunkUploadResponse {
                md5,
                upload_id: upload_id.into(),
                part_seq: seq,
                ..Default::default()
            })
        })
    }

    fn commit<'a>(&'a self, req: &'a CommitRequest) -> BoxFuture<'a, Result<FileInfo, EngineError>> {
        Box::pin(async move {
            self.commits.lock().unwrap().push(req.clone());
            Ok(FileInfo {
                path: req.path.clone(),
                size: req.size,
                md5: "committed".into(),
                fs_id: 99,
                ..Default::default()
            })
        })
    }
}
