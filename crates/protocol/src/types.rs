use serde::{Deserialize, Serialize};

use crate::lenient::u64_from_any;

/// Common accessors over the two error-envelope conventions.
pub trait ResponseStatus {
    /// Numeric error code (0 means success).
    fn code(&self) -> i64;
    /// Human-readable error message (may be empty).
    fn message(&self) -> &str;
    /// Server-side request identifier, for diagnostics.
    fn request_id(&self) -> u64;

    fn is_ok(&self) -> bool {
        self.code() == 0
    }
}

/// Error envelope of the `xpan` endpoints (`errno` / `errmsg`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub errno: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub errmsg: String,
    #[serde(default, deserialize_with = "u64_from_any")]
    pub request_id: u64,
}

impl ResponseStatus for ApiStatus {
    fn code(&self) -> i64 {
        self.errno
    }

    fn message(&self) -> &str {
        &self.errmsg
    }

    fn request_id(&self) -> u64 {
        self.request_id
    }
}

/// Error envelope of the PCS data endpoints (`error_code` / `error_msg`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcsStatus {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_msg: String,
    #[serde(default, deserialize_with = "u64_from_any")]
    pub request_id: u64,
}

impl ResponseStatus for PcsStatus {
    fn code(&self) -> i64 {
        self.error_code
    }

    fn message(&self) -> &str {
        &self.error_msg
    }

    fn request_id(&self) -> u64 {
        self.request_id
    }
}

/// Metadata of a stored file, as returned by commit and by a dedup hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub ctime: i64,
    #[serde(default)]
    pub mtime: i64,
    #[serde(default)]
    pub md5: String,
    #[serde(default)]
    pub fs_id: u64,
    #[serde(default)]
    pub isdir: i32,
}

impl ResponseStatus for FileInfo {
    fn code(&self) -> i64 {
        self.status.errno
    }

    fn message(&self) -> &str {
        &self.status.errmsg
    }

    fn request_id(&self) -> u64 {
        self.status.request_id
    }
}

/// Membership level of the account, which bounds chunk and part sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountTier {
    #[default]
    Normal,
    Vip,
    SuperVip,
}

impl AccountTier {
    /// Maps the `vip_type` field of the user-info response.
    pub fn from_vip_type(vip_type: i32) -> Self {
        match vip_type {
            1 => Self::Vip,
            2 => Self::SuperVip,
            _ => Self::Normal,
        }
    }
}
