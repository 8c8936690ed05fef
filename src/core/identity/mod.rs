//! # Identity Module
//!
//! SHA-256 over the raw bytes of a file. Two files with the same identity
//! hash are byte-for-byte identical; nothing about the content is
//! interpreted, so this works for any file type.

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::HashError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Length of a hex-encoded SHA-256 digest
pub const IDENTITY_HASH_LEN: usize = 64;

/// Digest of one file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileDigest {
    /// Lowercase hex SHA-256
    pub sha256: String,
    /// Number of bytes that went into the digest
    pub size: u64,
}

/// Chunked SHA-256 hasher
#[derive(Debug, Clone, Copy)]
pub struct IdentityHasher {
    chunk_size: usize,
}

impl IdentityHasher {
    /// Create a hasher reading `chunk_size` bytes at a time (minimum 1)
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// The read size in bytes
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Hash a file.
    ///
    /// The handle is opened and closed within this call. Missing files,
    /// permission problems and read errors all become
    /// [`HashError::UnreadableFile`].
    pub fn hash_file(&self, path: &Path) -> Result<FileDigest, HashError> {
        let unreadable = |source| HashError::UnreadableFile {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(unreadable)?;
        self.hash_reader(file).map_err(unreadable)
    }

    /// Hash everything a reader yields, in order, exactly once.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> std::io::Result<FileDigest> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; self.chunk_size];
        let mut size = 0u64;

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..bytes_read]);
            size += bytes_read as u64;
        }

        Ok(FileDigest {
            sha256: format!("{:x}", hasher.finalize()),
            size,
        })
    }
}

impl Default for IdentityHasher {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

/// Hex SHA-256 of a file using the default chunk size.
pub fn identity_hash(path: &Path) -> Result<String, HashError> {
    IdentityHasher::default()
        .hash_file(path)
        .map(|digest| digest.sha256)
}
