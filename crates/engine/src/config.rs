//! Transfer tuning knobs.

use std::path::PathBuf;

use panxfer_transfer::{DEFAULT_MAX_PARTS, DEFAULT_PART_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Default number of concurrent part fetches or chunk uploads.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// What the worker pool does once one part or chunk has failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Cancel the remaining workers as soon as one fails.
    #[default]
    FailFast,
    /// Let every in-flight and queued worker run to completion.
    DrainAll,
}

/// Configuration shared by the downloader and the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Worker pool size.
    pub concurrency: usize,
    /// Target download part size; super-VIP accounts override it.
    pub part_size: u64,
    /// Upper bound on the number of download parts.
    pub max_parts: usize,
    pub failure_policy: FailurePolicy,
    /// Directory for temporary part files. Defaults to the destination's
    /// directory.
    pub part_dir: Option<PathBuf>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            part_size: DEFAULT_PART_SIZE,
            max_parts: DEFAULT_MAX_PARTS,
            failure_policy: FailurePolicy::default(),
            part_dir: None,
        }
    }
}

impl TransferConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.concurrency == 0 {
            return Err(EngineError::InvalidArgument(
                "concurrency must be at least 1".into(),
            ));
        }
        if self.max_parts == 0 {
            return Err(EngineError::InvalidArgument(
                "max_parts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
