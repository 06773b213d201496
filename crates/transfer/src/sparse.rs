//! Sparse target-file allocation and positional chunk I/O.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::TransferError;

/// Creates a file of exactly `size` bytes without writing its content.
///
/// Seeks to `size - 1` and writes a single zero byte, which leaves a hole on
/// filesystems with sparse-file support and lets chunks land out of order
/// without pre-zeroing. An existing file at `path` is truncated first; a
/// `size` of zero yields an empty file.
pub fn allocate(path: &Path, size: u64) -> Result<(), TransferError> {
    let mut file = File::create(path)?;
    if size > 0 {
        file.seek(SeekFrom::Start(size - 1))?;
        file.write_all(&[0])?;
    }
    file.flush()?;
    Ok(())
}

/// Writes `data` at `offset` in a previously allocated file.
///
/// The file is opened read/write and never created here: a missing path is
/// an I/O error. Writes that would extend past the allocated size are
/// rejected before any byte lands. Re-writing a region with identical bytes
/// is safe and idempotent. The write is flushed to the handle before
/// returning.
pub fn write_at(path: &Path, offset: u64, data: &[u8]) -> Result<(), TransferError> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let size = file.metadata()?.len();
    check_range(offset, data.len() as u64, size)?;

    file.seek(SeekFrom::Start(offset))?;
    file.write_all(data)?;
    file.flush()?;
    Ok(())
}

/// Reads up to `len` bytes starting at `offset`, short at end of file.
///
/// An offset past the end of the file is rejected; an offset exactly at the
/// end returns an empty buffer.
pub fn read_at(path: &Path, offset: u64, len: u64) -> Result<Vec<u8>, TransferError> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    if offset > size {
        return Err(TransferError::RangeOutOfBounds { offset, len, size });
    }

    let take = len.min(size - offset);
    let mut buf = vec![0u8; take as usize];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut buf)?;
    Ok(buf)
}

fn check_range(offset: u64, len: u64, size: u64) -> Result<(), TransferError> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(TransferError::RangeOutOfBounds { offset, len, size }),
    }
}
