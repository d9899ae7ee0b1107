use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use md5::{Digest, Md5};

use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// A fixed-size window of a local file.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Position of this chunk in the block list.
    pub seq: u32,
    /// Byte offset within the file.
    pub offset: u64,
    /// Raw chunk data.
    pub data: Vec<u8>,
    /// MD5 hex digest of `data`.
    pub checksum: String,
}

// ---------------------------------------------------------------------------
// Checksum helpers
// ---------------------------------------------------------------------------

/// Computes MD5 of `data` and returns the lowercase hex digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Reads exactly `len` bytes at `offset`, or fewer if the file ends first.
pub fn read_chunk_at(path: &Path, offset: u64, len: u64) -> Result<Vec<u8>, TransferError> {
    let mut file = std::fs::File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(len as usize);
    file.take(len).read_to_end(&mut buf)?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// Reads a file sequentially in fixed-size chunks with MD5 checksums.
pub struct ChunkReader {
    file: std::fs::File,
    chunk_size: u64,
    offset: u64,
    next_seq: u32,
    file_size: u64,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] (4 MiB) is used.
    pub fn new(path: &Path, chunk_size: u64) -> Result<Self, TransferError> {
        let file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Ok(Self {
            file,
            chunk_size,
            offset: 0,
            next_seq: 0,
            file_size,
        })
    }

    /// Reads the next chunk. Returns `None` at EOF.
    ///
    /// Every chunk but the last is exactly `chunk_size` bytes long.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(None);
        }

        let read_size = remaining.min(self.chunk_size);
        let mut buf = Vec::with_capacity(read_size as usize);
        (&mut self.file).take(read_size).read_to_end(&mut buf)?;
        if buf.is_empty() {
            return Ok(None);
        }

        let checksum = checksum_bytes(&buf);
        let chunk = Chunk {
            seq: self.next_seq,
            offset: self.offset,
            data: buf,
            checksum,
        };
        self.offset += chunk.data.len() as u64;
        self.next_seq += 1;
        Ok(Some(chunk))
    }

    /// Current byte offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Total file size in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Bytes remaining to read.
    pub fn remaining(&self) -> u64 {
        self.file_size.saturating_sub(self.offset)
    }
}
