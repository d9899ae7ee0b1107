//! Engine error types.

use panxfer_transfer::TransferError;

/// Errors produced by a download or upload.
///
/// A transfer reports a single error: the first failure classified, along
/// with the remote error code and message when the service supplied one.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("probe failed: {0}")]
    Probe(String),

    #[error("part {index} length mismatch: expected {expected} bytes, got {actual}")]
    PartLengthMismatch {
        index: usize,
        expected: u64,
        actual: u64,
    },

    #[error("incomplete transfer: expected {expected} bytes, got {actual}")]
    IncompleteTransfer { expected: u64, actual: u64 },

    #[error("remote error {code}: {message}")]
    RemoteApi { code: i64, message: String },

    #[error("{failed} of {total} chunks failed (code {code}: {message})")]
    PartialUploadFailure {
        failed: usize,
        total: usize,
        code: i64,
        message: String,
    },

    #[error("local I/O error: {0}")]
    LocalIo(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("part {0} has no result")]
    MissingPart(usize),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("worker failed: {0}")]
    Worker(String),

    #[error("cancelled")]
    Cancelled,
}

impl EngineError {
    /// Remote error code and message carried by this error, if any.
    pub fn remote_detail(&self) -> Option<(i64, &str)> {
        match self {
            Self::RemoteApi { code, message } | Self::PartialUploadFailure { code, message, .. } => {
                Some((*code, message))
            }
            _ => None,
        }
    }
}

impl From<TransferError> for EngineError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::Io(e) => Self::LocalIo(e),
            TransferError::InvalidPlan(msg) | TransferError::InvalidPath(msg) => {
                Self::InvalidArgument(msg)
            }
            TransferError::MissingPart(index) => Self::MissingPart(index),
            TransferError::IncompleteTransfer { expected, actual } => {
                Self::IncompleteTransfer { expected, actual }
            }
        }
    }
}

impl From<panxfer_api::Error> for EngineError {
    fn from(e: panxfer_api::Error) -> Self {
        use panxfer_api::Error;

        match e {
            Error::Api { code, message, .. } => Self::RemoteApi { code, message },
            Error::Probe(msg) => Self::Probe(msg),
            Error::Io(e) => Self::LocalIo(e),
            Error::NotFound(fs_id) => Self::NotFound(format!("fs_id {fs_id}")),
            Error::InvalidUrl(msg) => Self::InvalidArgument(msg),
            Error::InvalidToken => Self::InvalidArgument("invalid access token".into()),
            other @ (Error::Http(_) | Error::Status { .. } | Error::Json(_)) => {
                Self::Transport(other.to_string())
            }
        }
    }
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Worker(e.to_string())
    }
}
