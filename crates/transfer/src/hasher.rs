//! Content hashing for file identity and chunk integrity checks.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use sha2::{Digest, Sha256, Sha512};

use crate::TransferError;

/// Read buffer for streaming digests. Bounds memory use regardless of
/// input size.
const HASH_BUF_SIZE: usize = 8192;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Wire name of the algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = TransferError;

    /// Parses a wire name. Unknown names are a configuration error, never a
    /// silent fallback.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            other => Err(TransferError::Config(format!(
                "unsupported hash algorithm: {other}"
            ))),
        }
    }
}

/// Computes lowercase-hex digests over buffers, readers, and whole files.
///
/// Pure: no side effects, no state beyond the chosen algorithm. Constructed
/// once and passed to the [`TransferStore`](crate::TransferStore).
#[derive(Debug, Clone, Copy, Default)]
pub struct Hasher {
    algorithm: HashAlgorithm,
}

impl Hasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest of an in-memory buffer.
    pub fn hash_bytes(&self, data: &[u8]) -> String {
        match self.algorithm {
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
            HashAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
        }
    }

    /// Digest of a readable stream, consumed to EOF in fixed-size buffers.
    pub fn hash_reader<R: Read>(&self, reader: R) -> Result<String, TransferError> {
        match self.algorithm {
            HashAlgorithm::Sha256 => digest_reader::<Sha256, R>(reader),
            HashAlgorithm::Sha512 => digest_reader::<Sha512, R>(reader),
        }
    }

    /// Digest of an entire file, streamed.
    pub fn hash_file(&self, path: &Path) -> Result<String, TransferError> {
        let file = File::open(path)?;
        self.hash_reader(file)
    }
}

fn digest_reader<D: Digest, R: Read>(mut reader: R) -> Result<String, TransferError> {
    let mut hasher = D::new();
    let mut buf = [0u8; HASH_BUF_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
