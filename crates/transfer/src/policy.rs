//! Account-tier driven sizing of upload chunks and download parts.

use panxfer_protocol::AccountTier;

use crate::{DEFAULT_CHUNK_SIZE, DEFAULT_PART_SIZE, SVIP_CHUNK_SIZE, SVIP_PART_SIZE, VIP_CHUNK_SIZE};

/// Upload chunk size allowed for `tier`.
///
/// Callers that could not resolve the tier pass [`AccountTier::Normal`].
pub fn chunk_size_for_tier(tier: AccountTier) -> u64 {
    match tier {
        AccountTier::Normal => DEFAULT_CHUNK_SIZE,
        AccountTier::Vip => VIP_CHUNK_SIZE,
        AccountTier::SuperVip => SVIP_CHUNK_SIZE,
    }
}

/// Download part size for `tier`, falling back to `configured`.
///
/// Only super-VIP accounts are served large ranged parts.
pub fn part_size_for_tier(tier: AccountTier, configured: u64) -> u64 {
    match tier {
        AccountTier::SuperVip => SVIP_PART_SIZE,
        AccountTier::Normal | AccountTier::Vip => {
            if configured == 0 {
                DEFAULT_PART_SIZE
            } else {
                configured
            }
        }
    }
}

/// How a file of `file_size` bytes is cut into upload chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    file_size: u64,
    chunk_size: u64,
}

impl BlockLayout {
    /// A file no larger than `chunk_size` (including an empty one) is a
    /// single chunk spanning the whole file.
    pub fn new(file_size: u64, chunk_size: u64) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            file_size,
            chunk_size,
        }
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn is_single_chunk(&self) -> bool {
        self.file_size <= self.chunk_size
    }

    pub fn chunk_count(&self) -> usize {
        if self.is_single_chunk() {
            1
        } else {
            self.file_size.div_ceil(self.chunk_size) as usize
        }
    }

    /// Byte offset and length of chunk `seq`; the last chunk absorbs the
    /// remainder.
    pub fn chunk_span(&self, seq: usize) -> (u64, u64) {
        let offset = seq as u64 * self.chunk_size;
        let len = self.chunk_size.min(self.file_size.saturating_sub(offset));
        (offset, len)
    }
}
