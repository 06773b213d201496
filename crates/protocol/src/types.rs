use serde::{Deserialize, Serialize};

/// Overall state of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    /// Every chunk is written and the whole-file hash matches.
    #[serde(rename = "completed")]
    Completed,
    /// At least one chunk is still missing.
    #[serde(rename = "incomplete")]
    Incomplete,
    /// The bitmap reports full coverage but the whole-file hash disagrees.
    #[serde(rename = "bad_file")]
    BadFile,
}

/// Outcome of a single chunk write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkWriteStatus {
    /// The upload was already complete; the chunk was not written.
    #[serde(rename = "completed")]
    Completed,
    /// The chunk was verified, written, and marked done.
    #[serde(rename = "chunk_completed")]
    ChunkCompleted,
    /// The chunk hash did not match; nothing was written.
    #[serde(rename = "chunk_failed")]
    ChunkFailed,
}

/// Readiness of a file for chunked download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadStatus {
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "error")]
    Error,
}

/// Outcome of a single chunk read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkReadStatus {
    #[serde(rename = "chunk_ready")]
    ChunkReady,
    #[serde(rename = "error")]
    Error,
}

/// Outcome of a chunk hash query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashQueryStatus {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "error")]
    Error,
}
