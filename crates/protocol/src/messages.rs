use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{
    ChunkReadStatus, ChunkWriteStatus, DownloadStatus, HashQueryStatus, UploadStatus,
};

// ---------------------------------------------------------------------------
// Upload payloads
// ---------------------------------------------------------------------------

/// Response to `upload/init`.
///
/// `chunk_size`, `hash_algorithm` and `chunks` are present only when the
/// upload is incomplete; a completed upload carries no chunk map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadInitResponse {
    pub status: UploadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<u64>>,
}

impl UploadInitResponse {
    /// The file already exists with a matching hash.
    pub fn completed() -> Self {
        Self {
            status: UploadStatus::Completed,
            chunk_size: None,
            hash_algorithm: None,
            chunks: None,
        }
    }

    /// Chunks remain to upload; `chunks` holds their byte offsets.
    pub fn incomplete(chunk_size: u64, hash_algorithm: impl Into<String>, chunks: Vec<u64>) -> Self {
        Self {
            status: UploadStatus::Incomplete,
            chunk_size: Some(chunk_size),
            hash_algorithm: Some(hash_algorithm.into()),
            chunks: Some(chunks),
        }
    }
}

/// Response to `upload/chunk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadChunkResponse {
    pub status: ChunkWriteStatus,
}

impl UploadChunkResponse {
    pub fn completed() -> Self {
        Self {
            status: ChunkWriteStatus::Completed,
        }
    }

    pub fn chunk_completed() -> Self {
        Self {
            status: ChunkWriteStatus::ChunkCompleted,
        }
    }

    pub fn chunk_failed() -> Self {
        Self {
            status: ChunkWriteStatus::ChunkFailed,
        }
    }
}

/// Response to `upload/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadStatusResponse {
    pub status: UploadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<u64>>,
}

impl UploadStatusResponse {
    pub fn completed() -> Self {
        Self {
            status: UploadStatus::Completed,
            chunk_size: None,
            chunks: None,
        }
    }

    pub fn incomplete(chunk_size: u64, chunks: Vec<u64>) -> Self {
        Self {
            status: UploadStatus::Incomplete,
            chunk_size: Some(chunk_size),
            chunks: Some(chunks),
        }
    }

    pub fn bad_file() -> Self {
        Self {
            status: UploadStatus::BadFile,
            chunk_size: None,
            chunks: None,
        }
    }
}

/// Request body for `upload/verify_chunks`: expected hash per chunk offset.
///
/// JSON object keys are stringified byte offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyChunksRequest {
    pub chunk_hashes: BTreeMap<u64, String>,
}

/// Response to `upload/verify_chunks`.
///
/// Always reports `incomplete`: the offsets whose bits were cleared (plus any
/// that were never written) come back in `incomplete_chunks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyChunksResponse {
    pub status: UploadStatus,
    pub incomplete_chunks: Vec<u64>,
    pub chunk_size: u64,
}

impl VerifyChunksResponse {
    pub fn incomplete(incomplete_chunks: Vec<u64>, chunk_size: u64) -> Self {
        Self {
            status: UploadStatus::Incomplete,
            incomplete_chunks,
            chunk_size,
        }
    }
}

// ---------------------------------------------------------------------------
// Download payloads
// ---------------------------------------------------------------------------

/// Response to `download/init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadInitResponse {
    pub status: DownloadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<u64>>,
}

impl DownloadInitResponse {
    pub fn ready(file_size: u64, chunk_size: u64, total_chunks: u64, chunks: Vec<u64>) -> Self {
        Self {
            status: DownloadStatus::Ready,
            file_size: Some(file_size),
            chunk_size: Some(chunk_size),
            total_chunks: Some(total_chunks),
            chunks: Some(chunks),
        }
    }

    pub fn error() -> Self {
        Self {
            status: DownloadStatus::Error,
            file_size: None,
            chunk_size: None,
            total_chunks: None,
            chunks: None,
        }
    }
}

/// Response to `download/chunk`.
///
/// The `data` field is base64-encoded in JSON; binary transports may carry
/// the bytes out of band and leave it empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadChunkResponse {
    pub status: ChunkReadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl DownloadChunkResponse {
    pub fn chunk_ready(chunk_hash: impl Into<String>, offset: u64, data: Vec<u8>) -> Self {
        Self {
            status: ChunkReadStatus::ChunkReady,
            chunk_hash: Some(chunk_hash.into()),
            offset: Some(offset),
            size: Some(data.len() as u64),
            data,
        }
    }

    pub fn error() -> Self {
        Self {
            status: ChunkReadStatus::Error,
            chunk_hash: None,
            offset: None,
            size: None,
            data: Vec::new(),
        }
    }
}

/// Response to `download/chunk_hashes`.
///
/// JSON object keys are stringified byte offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkHashesResponse {
    pub status: HashQueryStatus,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub chunk_hashes: BTreeMap<u64, String>,
}

impl ChunkHashesResponse {
    pub fn success(chunk_hashes: BTreeMap<u64, String>) -> Self {
        Self {
            status: HashQueryStatus::Success,
            chunk_hashes,
        }
    }

    pub fn error() -> Self {
        Self {
            status: HashQueryStatus::Error,
            chunk_hashes: BTreeMap::new(),
        }
    }
}

/// Custom base64 serde module for raw chunk bytes in JSON payloads.
mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(data).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
