//! Binary chunk-completion bitmap persisted beside each target file.
//!
//! Layout: a 24-byte header of three little-endian u64 words — magic,
//! total_chunks, chunk_size — followed by `ceil(total_chunks / 8)` bitmap
//! bytes. Bit `i` (LSB-first within byte `i / 8`) is set once chunk `i` has
//! been hash-verified and durably written, and cleared again if a later
//! re-verification proves the on-disk bytes wrong.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::TransferError;

/// Identifies a valid bitmap side-file.
pub const BITMAP_MAGIC: u64 = 0xB17CCA;

/// Header bytes before the bitmap body: magic, total_chunks, chunk_size.
pub const HEADER_SIZE: u64 = 24;

#[derive(Debug, Clone, Copy)]
struct Header {
    total_chunks: u64,
    chunk_size: u64,
}

/// Per-chunk completion tracking over a binary side-file.
///
/// Every read-modify-write on the side-file serializes through this
/// instance's mutex, so concurrent chunk completions never clobber each
/// other's bits. Two instances pointing at the same path (from this or
/// another process) are *not* mutually exclusive; a side-file must have a
/// single owning instance. The [`TransferStore`](crate::TransferStore)
/// registry enforces that within one process.
#[derive(Debug)]
pub struct ChunkBitmap {
    path: PathBuf,
    /// Cached header, `None` until `initialize` runs or an existing
    /// side-file is loaded. Doubles as the bit-level I/O lock.
    header: Mutex<Option<Header>>,
}

impl ChunkBitmap {
    /// Creates a store for `path`, loading and validating the header if the
    /// side-file already exists.
    ///
    /// Fails with [`TransferError::CorruptMap`] when the file exists but
    /// does not carry the magic constant or a sane header.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, TransferError> {
        let path = path.into();
        let header = if path.exists() {
            Some(read_header(&path)?)
        } else {
            None
        };
        Ok(Self {
            path,
            header: Mutex::new(header),
        })
    }

    /// Writes a fresh header and an all-zero bitmap body.
    ///
    /// A no-op (not an error) when the store already holds a valid header
    /// and `reinitialize` is false, so resumed sessions keep their progress.
    pub fn initialize(
        &self,
        total_size: u64,
        chunk_size: u64,
        reinitialize: bool,
    ) -> Result<(), TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::Config("chunk size must be positive".into()));
        }

        let mut header = self.header.lock().unwrap();
        if header.is_some() && !reinitialize {
            return Ok(());
        }

        let total_chunks = total_size.div_ceil(chunk_size);
        let body_len = total_chunks.div_ceil(8);

        let mut file = File::create(&self.path)?;
        file.write_all(&BITMAP_MAGIC.to_le_bytes())?;
        file.write_all(&total_chunks.to_le_bytes())?;
        file.write_all(&chunk_size.to_le_bytes())?;
        file.write_all(&vec![0u8; body_len as usize])?;
        file.flush()?;

        *header = Some(Header {
            total_chunks,
            chunk_size,
        });
        Ok(())
    }

    /// True once `initialize` has run or a valid side-file was loaded.
    pub fn is_initialized(&self) -> bool {
        self.header.lock().unwrap().is_some()
    }

    /// Bytes per chunk, as recorded in the header.
    pub fn chunk_size(&self) -> Result<u64, TransferError> {
        let header = self.header.lock().unwrap();
        Ok((*header).ok_or(TransferError::Uninitialized)?.chunk_size)
    }

    /// Number of chunks tracked by the bitmap.
    pub fn total_chunks(&self) -> Result<u64, TransferError> {
        let header = self.header.lock().unwrap();
        Ok((*header).ok_or(TransferError::Uninitialized)?.total_chunks)
    }

    /// Sets (`complete = true`) or clears the completion bit for one chunk.
    ///
    /// Read-modify-write of exactly the one byte holding the bit, under the
    /// instance lock. The rest of the bitmap is never rewritten.
    pub fn mark(&self, chunk_index: u64, complete: bool) -> Result<(), TransferError> {
        let guard = self.header.lock().unwrap();
        let header = (*guard).ok_or(TransferError::Uninitialized)?;
        check_index(chunk_index, header.total_chunks)?;

        let byte_index = chunk_index / 8;
        let bit_index = chunk_index % 8;

        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(HEADER_SIZE + byte_index))?;
        let mut byte = [0u8; 1];
        file.read_exact(&mut byte)?;

        if complete {
            byte[0] |= 1 << bit_index;
        } else {
            byte[0] &= !(1 << bit_index);
        }

        file.seek(SeekFrom::Start(HEADER_SIZE + byte_index))?;
        file.write_all(&byte)?;
        file.flush()?;
        Ok(())
    }

    /// Returns the completion bit for one chunk.
    pub fn status(&self, chunk_index: u64) -> Result<bool, TransferError> {
        let guard = self.header.lock().unwrap();
        let header = (*guard).ok_or(TransferError::Uninitialized)?;
        check_index(chunk_index, header.total_chunks)?;

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(HEADER_SIZE + chunk_index / 8))?;
        let mut byte = [0u8; 1];
        file.read_exact(&mut byte)?;
        Ok(byte[0] >> (chunk_index % 8) & 1 == 1)
    }

    /// Byte offsets of every chunk not yet marked complete, ascending.
    ///
    /// Reads the bitmap body once: the result is a snapshot, and concurrent
    /// marks may have flipped individual bits by the time the caller acts on
    /// it. Callers needing precision re-check single chunks via [`status`].
    ///
    /// [`status`]: Self::status
    pub fn incomplete_chunks(&self) -> Result<Vec<u64>, TransferError> {
        let guard = self.header.lock().unwrap();
        let header = (*guard).ok_or(TransferError::Uninitialized)?;

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        let mut body = vec![0u8; header.total_chunks.div_ceil(8) as usize];
        file.read_exact(&mut body)?;

        let mut incomplete = Vec::new();
        for i in 0..header.total_chunks {
            if body[(i / 8) as usize] >> (i % 8) & 1 == 0 {
                incomplete.push(i * header.chunk_size);
            }
        }
        Ok(incomplete)
    }

    /// True when every chunk is marked complete.
    ///
    /// A store that was never initialized reports `false` without error:
    /// "not started" and "done" differ only in the boolean.
    pub fn is_complete(&self) -> Result<bool, TransferError> {
        match self.incomplete_chunks() {
            Ok(offsets) => Ok(offsets.is_empty()),
            Err(TransferError::Uninitialized) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Path of the side-file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn check_index(index: u64, total: u64) -> Result<(), TransferError> {
    if index >= total {
        return Err(TransferError::ChunkIndexOutOfRange { index, total });
    }
    Ok(())
}

fn read_header(path: &Path) -> Result<Header, TransferError> {
    let mut file = File::open(path)?;
    let magic = read_word(&mut file, path)?;
    if magic != BITMAP_MAGIC {
        return Err(TransferError::CorruptMap(path.to_path_buf()));
    }
    let total_chunks = read_word(&mut file, path)?;
    let chunk_size = read_word(&mut file, path)?;
    if chunk_size == 0 {
        return Err(TransferError::CorruptMap(path.to_path_buf()));
    }
    Ok(Header {
        total_chunks,
        chunk_size,
    })
}

/// Reads one little-endian u64; a truncated header counts as corrupt.
fn read_word(file: &mut File, path: &Path) -> Result<u64, TransferError> {
    let mut word = [0u8; 8];
    file.read_exact(&mut word).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            TransferError::CorruptMap(path.to_path_buf())
        } else {
            TransferError::Io(e)
        }
    })?;
    Ok(u64::from_le_bytes(word))
}
