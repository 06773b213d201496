//! Transfer session orchestration: upload init/resume, chunk writes,
//! status and verification queries, and chunk-level download reads.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use chunkvault_protocol::{
    ChunkHashesResponse, DownloadChunkResponse, DownloadInitResponse, UploadChunkResponse,
    UploadInitResponse, UploadStatusResponse, VerifyChunksResponse,
};

use crate::bitmap::ChunkBitmap;
use crate::hasher::Hasher;
use crate::validation::validate_content_key;
use crate::{TransferError, sparse};

/// Extension of the bitmap side-file kept beside each target file.
const MAP_EXTENSION: &str = "bmap";

/// Orchestrates resumable transfers for one content-addressed storage root.
///
/// Every file is keyed by its content hash: the target lives at
/// `<root>/<hash>` and its bitmap at `<root>/<hash>.bmap`. The store owns
/// the lifecycle of both files; callers never create or delete them
/// directly.
#[derive(Debug)]
pub struct TransferStore {
    root: PathBuf,
    chunk_size: u64,
    hasher: Hasher,
    /// One shared bitmap store per content key, so concurrent chunk writes
    /// for the same file serialize through a single per-instance lock.
    bitmaps: Mutex<HashMap<String, Arc<ChunkBitmap>>>,
}

impl TransferStore {
    /// Creates a store rooted at `root`, creating the directory if needed.
    ///
    /// `chunk_size` is fixed for every transfer this store initializes; zero
    /// is a configuration error.
    pub fn new(
        root: impl Into<PathBuf>,
        chunk_size: u64,
        hasher: Hasher,
    ) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::Config("chunk size must be positive".into()));
        }
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            chunk_size,
            hasher,
            bitmaps: Mutex::new(HashMap::new()),
        })
    }

    /// Chunk size this store initializes new transfers with.
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    fn data_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn map_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{MAP_EXTENSION}"))
    }

    /// Returns the shared bitmap store for `key`, creating it on first use.
    fn bitmap(&self, key: &str) -> Result<Arc<ChunkBitmap>, TransferError> {
        let mut bitmaps = self.bitmaps.lock().unwrap();
        if let Some(bitmap) = bitmaps.get(key) {
            return Ok(Arc::clone(bitmap));
        }
        let bitmap = Arc::new(ChunkBitmap::new(self.map_path(key))?);
        bitmaps.insert(key.to_string(), Arc::clone(&bitmap));
        Ok(bitmap)
    }

    // -----------------------------------------------------------------------
    // Upload
    // -----------------------------------------------------------------------

    /// Starts or resumes an upload for the file identified by `file_hash`.
    ///
    /// Returns `completed` when a file with a matching hash already exists
    /// (dedup), `incomplete` with the remaining offsets when a prior bitmap
    /// resumes cleanly, and `incomplete` with every offset after allocating
    /// a fresh sparse file and bitmap otherwise. A corrupt bitmap side-file
    /// makes the session unresumable: it is discarded and the upload starts
    /// fresh.
    pub fn init_upload(
        &self,
        file_size: u64,
        file_hash: &str,
    ) -> Result<UploadInitResponse, TransferError> {
        validate_content_key(file_hash)?;
        let data_path = self.data_path(file_hash);

        if data_path.is_file() && self.hasher.hash_file(&data_path)? == file_hash {
            info!(key = %file_hash, "file already stored, upload complete");
            return Ok(UploadInitResponse::completed());
        }

        let bitmap = match self.bitmap(file_hash) {
            Ok(bitmap) => bitmap,
            Err(TransferError::CorruptMap(path)) => {
                warn!(key = %file_hash, "discarding corrupt bitmap side-file");
                fs::remove_file(&path)?;
                self.bitmap(file_hash)?
            }
            Err(e) => return Err(e),
        };

        if bitmap.is_initialized() {
            // Resume: the header must agree with the declared file geometry.
            let expected_chunks = file_size.div_ceil(self.chunk_size);
            if bitmap.chunk_size()? != self.chunk_size
                || bitmap.total_chunks()? != expected_chunks
            {
                return Err(TransferError::CorruptMap(bitmap.path().to_path_buf()));
            }
            if !data_path.is_file() {
                sparse::allocate(&data_path, file_size)?;
            }
            let chunks = bitmap.incomplete_chunks()?;
            info!(key = %file_hash, remaining = chunks.len(), "resuming upload");
            return Ok(UploadInitResponse::incomplete(
                self.chunk_size,
                self.hasher.algorithm().as_str(),
                chunks,
            ));
        }

        sparse::allocate(&data_path, file_size)?;
        bitmap.initialize(file_size, self.chunk_size, true)?;
        let chunks = bitmap.incomplete_chunks()?;
        info!(key = %file_hash, file_size, chunks = chunks.len(), "upload initialized");
        Ok(UploadInitResponse::incomplete(
            self.chunk_size,
            self.hasher.algorithm().as_str(),
            chunks,
        ))
    }

    /// Verifies and writes one chunk at `offset`, then marks its bit.
    ///
    /// Short-circuits with `completed` when the bitmap already reports full
    /// coverage. A hash mismatch returns `chunk_failed` without writing a
    /// byte or touching the bitmap; the caller retries that chunk.
    pub fn put_chunk(
        &self,
        file_hash: &str,
        chunk_hash: &str,
        offset: u64,
        data: &[u8],
    ) -> Result<UploadChunkResponse, TransferError> {
        validate_content_key(file_hash)?;
        let bitmap = self.bitmap(file_hash)?;

        if bitmap.is_complete()? {
            return Ok(UploadChunkResponse::completed());
        }
        let chunk_size = bitmap.chunk_size()?;

        if self.hasher.hash_bytes(data) != chunk_hash {
            debug!(key = %file_hash, offset, "chunk hash mismatch, rejecting");
            return Ok(UploadChunkResponse::chunk_failed());
        }

        sparse::write_at(&self.data_path(file_hash), offset, data)?;
        bitmap.mark(offset / chunk_size, true)?;
        debug!(key = %file_hash, offset, len = data.len(), "chunk written");
        Ok(UploadChunkResponse::chunk_completed())
    }

    /// Reports upload progress for `file_hash`.
    ///
    /// An incomplete bitmap returns the remaining offsets. A complete bitmap
    /// triggers a whole-file re-hash: a match is `completed`, a mismatch is
    /// `bad_file` — silent corruption that slipped past chunk-level checks.
    pub fn upload_status(&self, file_hash: &str) -> Result<UploadStatusResponse, TransferError> {
        validate_content_key(file_hash)?;
        let bitmap = self.bitmap(file_hash)?;

        if !bitmap.is_complete()? {
            let chunks = bitmap.incomplete_chunks()?;
            return Ok(UploadStatusResponse::incomplete(
                bitmap.chunk_size()?,
                chunks,
            ));
        }

        if self.hasher.hash_file(&self.data_path(file_hash))? == file_hash {
            Ok(UploadStatusResponse::completed())
        } else {
            warn!(key = %file_hash, "complete bitmap but whole-file hash mismatch");
            Ok(UploadStatusResponse::bad_file())
        }
    }

    /// Re-verifies previously written chunks against caller-supplied hashes.
    ///
    /// Each named region is re-read and re-hashed; a disagreement clears
    /// that chunk's bit, demoting it back to incomplete (the recovery path
    /// for truncated writes or bitrot discovered after the fact). Returns
    /// the resulting incomplete offsets.
    pub fn verify_chunks(
        &self,
        file_hash: &str,
        chunk_hashes: &BTreeMap<u64, String>,
    ) -> Result<VerifyChunksResponse, TransferError> {
        validate_content_key(file_hash)?;
        let bitmap = self.bitmap(file_hash)?;
        let chunk_size = bitmap.chunk_size()?;
        let data_path = self.data_path(file_hash);

        for (&offset, expected) in chunk_hashes {
            let data = sparse::read_at(&data_path, offset, chunk_size)?;
            if self.hasher.hash_bytes(&data) != *expected {
                warn!(key = %file_hash, offset, "chunk re-verification failed, demoting");
                bitmap.mark(offset / chunk_size, false)?;
            }
        }

        Ok(VerifyChunksResponse::incomplete(
            bitmap.incomplete_chunks()?,
            chunk_size,
        ))
    }

    // -----------------------------------------------------------------------
    // Download
    // -----------------------------------------------------------------------

    /// Prepares a chunked download of a stored file.
    ///
    /// `ready` requires the file to exist, any bitmap to report full
    /// coverage, and the whole-file hash to match its content address;
    /// anything else is an `error` response.
    pub fn init_download(&self, file_hash: &str) -> Result<DownloadInitResponse, TransferError> {
        validate_content_key(file_hash)?;
        let data_path = self.data_path(file_hash);

        if !data_path.is_file() {
            return Ok(DownloadInitResponse::error());
        }
        let bitmap = self.bitmap(file_hash)?;
        if bitmap.is_initialized() && !bitmap.is_complete()? {
            debug!(key = %file_hash, "download refused, upload incomplete");
            return Ok(DownloadInitResponse::error());
        }
        if self.hasher.hash_file(&data_path)? != file_hash {
            warn!(key = %file_hash, "download refused, stored file fails hash check");
            return Ok(DownloadInitResponse::error());
        }

        let chunk_size = self.effective_chunk_size(&bitmap)?;
        let file_size = fs::metadata(&data_path)?.len();
        let total_chunks = file_size.div_ceil(chunk_size);
        let chunks = (0..total_chunks).map(|i| i * chunk_size).collect();
        info!(key = %file_hash, file_size, total_chunks, "download ready");
        Ok(DownloadInitResponse::ready(
            file_size,
            chunk_size,
            total_chunks,
            chunks,
        ))
    }

    /// Reads one chunk for download: the bytes at an aligned `offset` plus
    /// their hash for client-side verification. The final chunk may be
    /// short.
    pub fn read_chunk(
        &self,
        file_hash: &str,
        offset: u64,
    ) -> Result<DownloadChunkResponse, TransferError> {
        validate_content_key(file_hash)?;
        let data_path = self.data_path(file_hash);

        if !data_path.is_file() {
            return Ok(DownloadChunkResponse::error());
        }
        let bitmap = self.bitmap(file_hash)?;
        if bitmap.is_initialized() && !bitmap.is_complete()? {
            return Ok(DownloadChunkResponse::error());
        }

        let chunk_size = self.effective_chunk_size(&bitmap)?;
        let file_size = fs::metadata(&data_path)?.len();
        if offset >= file_size || offset % chunk_size != 0 {
            return Ok(DownloadChunkResponse::error());
        }

        let data = sparse::read_at(&data_path, offset, chunk_size)?;
        let chunk_hash = self.hasher.hash_bytes(&data);
        debug!(key = %file_hash, offset, len = data.len(), "chunk served");
        Ok(DownloadChunkResponse::chunk_ready(chunk_hash, offset, data))
    }

    /// Computes hashes for the chunks at `offsets`, so a parallel
    /// downloader can verify regions without pulling their bytes again.
    /// Refused while an initialized bitmap still reports missing chunks:
    /// hashes over unwritten holes would pass for verification data.
    pub fn chunk_hashes(
        &self,
        file_hash: &str,
        offsets: &[u64],
    ) -> Result<ChunkHashesResponse, TransferError> {
        validate_content_key(file_hash)?;
        let data_path = self.data_path(file_hash);

        if !data_path.is_file() {
            return Ok(ChunkHashesResponse::error());
        }
        let bitmap = self.bitmap(file_hash)?;
        if bitmap.is_initialized() && !bitmap.is_complete()? {
            debug!(key = %file_hash, "chunk hashes refused, upload incomplete");
            return Ok(ChunkHashesResponse::error());
        }
        let chunk_size = self.effective_chunk_size(&bitmap)?;
        let file_size = fs::metadata(&data_path)?.len();

        let mut hashes = BTreeMap::new();
        for &offset in offsets {
            if offset >= file_size {
                return Err(TransferError::RangeOutOfBounds {
                    offset,
                    len: chunk_size,
                    size: file_size,
                });
            }
            let data = sparse::read_at(&data_path, offset, chunk_size)?;
            hashes.insert(offset, self.hasher.hash_bytes(&data));
        }
        Ok(ChunkHashesResponse::success(hashes))
    }

    /// Chunk size governing a stored file: the bitmap's recorded size when
    /// one exists, this store's configured size otherwise.
    fn effective_chunk_size(&self, bitmap: &ChunkBitmap) -> Result<u64, TransferError> {
        if bitmap.is_initialized() {
            bitmap.chunk_size()
        } else {
            Ok(self.chunk_size)
        }
    }
}
