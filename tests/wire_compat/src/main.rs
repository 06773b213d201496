fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use chunkvault_protocol::{
        ChunkHashesResponse, DownloadChunkResponse, DownloadInitResponse, UploadChunkResponse,
        UploadInitResponse, UploadStatusResponse, VerifyChunksRequest, VerifyChunksResponse,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and
    /// compares the JSON values (order-independent comparison). A mismatch
    /// means the Rust types drifted from the documented wire shape.
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize fixture {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize fixture {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "wire shape drifted for fixture {name}"
        );
    }

    #[test]
    fn upload_init_incomplete() {
        roundtrip_test::<UploadInitResponse>("upload_init_incomplete.json");
    }

    #[test]
    fn upload_init_completed() {
        roundtrip_test::<UploadInitResponse>("upload_init_completed.json");
    }

    #[test]
    fn upload_chunk_completed() {
        roundtrip_test::<UploadChunkResponse>("upload_chunk_completed.json");
    }

    #[test]
    fn upload_chunk_failed() {
        roundtrip_test::<UploadChunkResponse>("upload_chunk_failed.json");
    }

    #[test]
    fn upload_status_incomplete() {
        roundtrip_test::<UploadStatusResponse>("upload_status_incomplete.json");
    }

    #[test]
    fn upload_status_bad_file() {
        roundtrip_test::<UploadStatusResponse>("upload_status_bad_file.json");
    }

    #[test]
    fn verify_chunks_request() {
        roundtrip_test::<VerifyChunksRequest>("verify_chunks_request.json");
    }

    #[test]
    fn verify_chunks_response() {
        roundtrip_test::<VerifyChunksResponse>("verify_chunks_response.json");
    }

    #[test]
    fn download_init_ready() {
        roundtrip_test::<DownloadInitResponse>("download_init_ready.json");
    }

    #[test]
    fn download_init_error() {
        roundtrip_test::<DownloadInitResponse>("download_init_error.json");
    }

    #[test]
    fn download_chunk_ready() {
        roundtrip_test::<DownloadChunkResponse>("download_chunk_ready.json");
    }

    #[test]
    fn chunk_hashes_success() {
        roundtrip_test::<ChunkHashesResponse>("chunk_hashes_success.json");
    }
}
