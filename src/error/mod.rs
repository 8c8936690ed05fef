//! # Error Module
//!
//! Error types for identity hashing, perceptual hashing and similarity
//! queries.
//!
//! ## Design Principles
//! - **Never panic** on file data - return errors instead
//! - **Include context** - the path or hash string that failed
//! - **Per-file errors stay per-file** - the batch driver records them on
//!   the file's result and keeps going

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level library error
#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Invalid hash result: {0}")]
    Result(#[from] InvalidResult),
}

/// Errors produced while hashing a single file
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Cannot read file {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Unsupported image format {format} for {path}: {reason}")]
    UnsupportedFormat {
        path: PathBuf,
        format: String,
        reason: String,
    },

    #[error("Image has no pixels: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Invalid hash size {size}: must be an even number between 2 and 64")]
    InvalidHashSize { size: u32 },

    #[error("Hash computation failed: {0}")]
    ComputationFailed(String),
}

impl HashError {
    /// Classify this error for the per-file result record.
    ///
    /// Everything that is not an I/O failure of the identity pass or a
    /// missing codec is a decode failure: the bytes were readable but could
    /// not be turned into a fingerprint.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            HashError::UnreadableFile { .. } => FailureKind::Unreadable,
            HashError::UnsupportedFormat { .. } => FailureKind::UnsupportedFormat,
            HashError::DecodeError { .. }
            | HashError::EmptyImage { .. }
            | HashError::InvalidHashSize { .. }
            | HashError::ComputationFailed(_) => FailureKind::Decode,
        }
    }
}

/// Why a file's hashing pass did not fully succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// The file could not be read; both hashes are empty
    Unreadable,
    /// The bytes are not a decodable image; the identity hash is kept
    Decode,
    /// The image format needs a codec that is not installed (e.g. HEIC)
    UnsupportedFormat,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Unreadable => write!(f, "unreadable"),
            FailureKind::Decode => write!(f, "decode"),
            FailureKind::UnsupportedFormat => write!(f, "unsupported format"),
        }
    }
}

/// A hash result assembled from parts that cannot belong together
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidResult {
    #[error("identity hash must be 64 lowercase hex characters, got {0:?}")]
    IdentityHash(String),

    #[error("perceptual hash must be non-empty lowercase hex, got {0:?}")]
    PerceptualHash(String),

    #[error("a file with an identity hash cannot be unreadable")]
    UnreadableWithIdentity,
}

/// Errors raised by similarity queries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    #[error("Malformed perceptual hash {hash:?}: {reason}")]
    MalformedHash { hash: String, reason: String },

    #[error("Cannot compare a {left}-bit wide hash with a {right}-bit wide hash")]
    BitWidthMismatch { left: u32, right: u32 },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, FingerprintError>;
