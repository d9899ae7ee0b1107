//! Block list computation for the precreate handshake.
//!
//! The service deduplicates on three digests: the whole-file MD5, the MD5
//! of the leading [`SLICE_CHECKSUM_LEN`] bytes, and the ordered list of
//! per-chunk MD5s. Chunk upload sequence numbers are indices into that list,
//! so its order must follow byte order in the file.

use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};
use tracing::debug;

use crate::chunked::{ChunkReader, checksum_bytes};
use crate::policy::BlockLayout;
use crate::{SLICE_CHECKSUM_LEN, TransferError};

/// Digests of a local file as sent to the precreate endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDigest {
    pub layout: BlockLayout,
    /// MD5 of the whole file.
    pub content_md5: String,
    /// MD5 of the leading 256 KiB (or of the whole file if smaller).
    pub slice_md5: String,
    /// Per-chunk MD5s in file order.
    pub block_list: Vec<String>,
}

impl BlockDigest {
    pub fn size(&self) -> u64 {
        self.layout.file_size()
    }
}

/// Computes the digests of `path` for chunks of `chunk_size` bytes.
///
/// Blocking; run it on a blocking thread from async code.
pub fn slice_file(path: &Path, chunk_size: u64) -> Result<BlockDigest, TransferError> {
    let mut reader = ChunkReader::new(path, chunk_size)?;
    let layout = BlockLayout::new(reader.file_size(), chunk_size);

    let mut whole = Md5::new();
    let mut block_list = Vec::with_capacity(layout.chunk_count());
    while let Some(chunk) = reader.next_chunk()? {
        whole.update(&chunk.data);
        block_list.push(chunk.checksum);
    }
    let content_md5 = hex::encode(whole.finalize());

    if layout.is_single_chunk() {
        block_list = vec![content_md5.clone()];
    }

    let slice_md5 = if layout.file_size() <= SLICE_CHECKSUM_LEN {
        content_md5.clone()
    } else {
        leading_slice_checksum(path)?
    };

    debug!(
        path = %path.display(),
        size = layout.file_size(),
        blocks = block_list.len(),
        "sliced file"
    );

    Ok(BlockDigest {
        layout,
        content_md5,
        slice_md5,
        block_list,
    })
}

fn leading_slice_checksum(path: &Path) -> Result<String, TransferError> {
    let file = std::fs::File::open(path)?;
    let mut buf = Vec::with_capacity(SLICE_CHECKSUM_LEN as usize);
    file.take(SLICE_CHECKSUM_LEN).read_to_end(&mut buf)?;
    Ok(checksum_bytes(&buf))
}
