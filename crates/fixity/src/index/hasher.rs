use crate::error::{FixityError, Result};
use md5::Md5;
use serde::Serialize;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;

/// Read size for streaming a file through the hasher.
pub const BUFFER_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512,
    Blake3,
    Md5,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::Md5 => "md5",
        }
    }

    /// Length of the lowercase hex digest this algorithm produces.
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 | HashAlgorithm::Blake3 => 64,
            HashAlgorithm::Sha512 => 128,
            HashAlgorithm::Md5 => 32,
        }
    }

    /// Checks that `digest` looks like output of this algorithm.
    pub fn is_valid_digest(&self, digest: &str) -> bool {
        digest.len() == self.hex_len()
            && digest
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = FixityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "blake3" => Ok(HashAlgorithm::Blake3),
            "md5" => Ok(HashAlgorithm::Md5),
            _ => Err(FixityError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

enum Hasher {
    Sha256(Sha256),
    Sha512(Sha512),
    Blake3(Box<blake3::Hasher>),
    Md5(Md5),
}

impl Hasher {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            HashAlgorithm::Sha512 => Hasher::Sha512(Sha512::new()),
            HashAlgorithm::Blake3 => Hasher::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Md5 => Hasher::Md5(Md5::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha512(h) => h.update(data),
            Hasher::Blake3(h) => {
                h.update(data);
            }
            Hasher::Md5(h) => h.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Hasher::Sha256(h) => format!("{:x}", h.finalize()),
            Hasher::Sha512(h) => format!("{:x}", h.finalize()),
            Hasher::Blake3(h) => h.finalize().to_hex().to_string(),
            Hasher::Md5(h) => format!("{:x}", h.finalize()),
        }
    }
}

fn stream<R: Read>(
    mut reader: R,
    algorithm: HashAlgorithm,
    mut on_chunk: impl FnMut(u64),
) -> std::io::Result<String> {
    let mut hasher = Hasher::new(algorithm);
    let mut buffer = [0u8; BUFFER_SIZE];
    let mut bytes_processed = 0u64;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
        bytes_processed += bytes_read as u64;
        on_chunk(bytes_processed);
    }

    Ok(hasher.finalize_hex())
}

/// Hashes everything `reader` yields.
pub fn hash_reader<R: Read>(reader: R, algorithm: HashAlgorithm) -> std::io::Result<String> {
    stream(reader, algorithm, |_| {})
}

/// Computes the digest of a file's contents
///
/// The file is read in 4KB chunks, so memory use does not grow with file
/// size. Either the complete digest is returned or an error; a read that
/// fails halfway never produces a digest.
pub fn hash_file<P: AsRef<Path>>(path: P, algorithm: HashAlgorithm) -> Result<String> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| FixityError::io(path, e))?;
    hash_reader(file, algorithm).map_err(|e| FixityError::io(path, e))
}

/// Progress callback for hash operations
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send>;

/// Computes a file digest with progress reporting
///
/// The progress callback receives (bytes_processed, total_bytes)
pub fn hash_file_with_progress<P: AsRef<Path>>(
    path: P,
    algorithm: HashAlgorithm,
    progress: ProgressCallback,
) -> Result<String> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| FixityError::io(path, e))?;
    let total_size = file.metadata().map_err(|e| FixityError::io(path, e))?.len();

    stream(file, algorithm, |done| progress(done, total_size))
        .map_err(|e| FixityError::io(path, e))
}
