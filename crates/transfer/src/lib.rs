//! Resumable, content-addressed chunked file transfer engine.
//!
//! A file is identified by the hash of its complete bytes. Uploads write
//! fixed-size chunks at arbitrary offsets into a sparse preallocated target
//! file while a binary bitmap side-file records which chunks have been
//! hash-verified and written, so an interrupted transfer resumes with only
//! the missing chunks. Downloads serve chunk-level reads from the same
//! target file once it verifies complete.
//!
//! The storage layer is synchronous and blocking; callers layer their own
//! threads or async executor on top and treat each operation as one atomic
//! unit of work.

mod bitmap;
mod hasher;
mod session;
mod sparse;
mod validation;

pub use bitmap::{BITMAP_MAGIC, ChunkBitmap, HEADER_SIZE};
pub use hasher::{HashAlgorithm, Hasher};
pub use session::TransferStore;
pub use sparse::{allocate, read_at, write_at};
pub use validation::validate_content_key;

/// Default chunk size: 32 MiB.
///
/// Large chunks keep per-chunk overhead (hashing, round trips, bitmap
/// updates) low; the server advertises the actual size via
/// `UploadInitResponse.chunk_size`.
pub const DEFAULT_CHUNK_SIZE: u64 = 32 * 1024 * 1024;

/// Errors produced by the transfer engine.
///
/// Integrity mismatches (a bad chunk hash, a bad whole-file hash) are not
/// errors: they surface as `chunk_failed`/`bad_file` protocol statuses and
/// are the caller's signal to retry that unit of work.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("bitmap not initialized")]
    Uninitialized,

    #[error("corrupt or foreign bitmap file: {}", .0.display())]
    CorruptMap(std::path::PathBuf),

    #[error("byte range {offset}+{len} exceeds allocated size {size}")]
    RangeOutOfBounds { offset: u64, len: u64, size: u64 },

    #[error("chunk index {index} out of range (total {total})")]
    ChunkIndexOutOfRange { index: u64, total: u64 },

    #[error("invalid content key: {0}")]
    InvalidKey(String),
}
