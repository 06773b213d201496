//! Wire payload types for the chunkvault transfer protocol.
//!
//! Pure data, no I/O: the request and response shapes exchanged between the
//! transfer engine and whatever transport fronts it (HTTP, WebSocket, ...)
//! live here so servers and clients share one source of truth for field
//! names and status strings.

pub mod messages;
pub mod types;

pub use messages::{
    ChunkHashesResponse, DownloadChunkResponse, DownloadInitResponse, UploadChunkResponse,
    UploadInitResponse, UploadStatusResponse, VerifyChunksRequest, VerifyChunksResponse,
};
pub use types::{ChunkReadStatus, ChunkWriteStatus, DownloadStatus, HashQueryStatus, UploadStatus};
