use std::path::{Component, Path};

use crate::TransferError;

/// Characters the service refuses in stored file names.
const FORBIDDEN_CHARS: &[char] = &[
    '\\', '?', '|', '"', '>', '<', ':', '*', '\t', '\n', '\r', '\0', '\x0B',
];

/// Strips characters the service cannot store from a remote path.
pub fn sanitize_remote_path(path: &str) -> String {
    let sanitized: String = path.chars().filter(|c| !FORBIDDEN_CHARS.contains(c)).collect();
    if sanitized != path {
        tracing::debug!(original = %path, sanitized = %sanitized, "remote path sanitized");
    }
    sanitized
}

/// Validates a (sanitized) remote path.
///
/// Rejects:
/// - Empty paths
/// - Relative paths (remote paths are rooted at `/`)
/// - Parent directory traversal (`..`)
/// - Paths naming a directory (trailing `/`)
pub fn validate_remote_path(path: &str) -> Result<(), TransferError> {
    if path.is_empty() {
        return Err(TransferError::InvalidPath("empty path".into()));
    }
    if !path.starts_with('/') {
        return Err(TransferError::InvalidPath(format!(
            "remote path must be absolute: {path}"
        )));
    }
    if path.ends_with('/') {
        return Err(TransferError::InvalidPath(format!(
            "remote path names a directory: {path}"
        )));
    }

    for component in Path::new(path).components() {
        if component == Component::ParentDir {
            return Err(TransferError::InvalidPath(format!(
                "parent directory traversal not allowed: {path}"
            )));
        }
    }

    Ok(())
}
