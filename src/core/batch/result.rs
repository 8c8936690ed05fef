//! Per-file hashing outcome.

use crate::core::hasher::Fingerprint;
use crate::core::identity::{FileDigest, IDENTITY_HASH_LEN};
use crate::error::{FailureKind, HashError, InvalidResult};
use crate::events::BatchSummary;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Which of the three possible outcomes a [`HashResult`] holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HashStatus {
    /// Both hashes present
    Complete,
    /// Identity hash present, perceptual hash empty
    IdentityOnly,
    /// Nothing could be read
    Unreadable,
}

/// Why a file did not get both hashes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for HashFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of hashing one file.
///
/// The constructors check their inputs, so a result is always complete,
/// identity-only or unreadable. It never carries a hash next to an error
/// that should have emptied it, and a complete result always has both
/// hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashResult {
    identity_hash: String,
    perceptual_hash: String,
    file_size: u64,
    error: Option<HashFailure>,
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn check_identity(identity_hash: &str) -> Result<(), InvalidResult> {
    if identity_hash.len() == IDENTITY_HASH_LEN && is_lower_hex(identity_hash) {
        Ok(())
    } else {
        Err(InvalidResult::IdentityHash(identity_hash.to_string()))
    }
}

impl HashResult {
    /// Both hashes computed
    pub fn complete(
        identity_hash: String,
        perceptual_hash: String,
        file_size: u64,
    ) -> Result<Self, InvalidResult> {
        check_identity(&identity_hash)?;
        if perceptual_hash.is_empty() || !is_lower_hex(&perceptual_hash) {
            return Err(InvalidResult::PerceptualHash(perceptual_hash));
        }
        Ok(Self {
            identity_hash,
            perceptual_hash,
            file_size,
            error: None,
        })
    }

    /// The bytes were hashed but the image could not be fingerprinted.
    ///
    /// `kind` cannot be [`FailureKind::Unreadable`]: a file that was read
    /// has an identity hash. Use [`HashResult::unreadable`] instead.
    pub fn identity_only(
        identity_hash: String,
        file_size: u64,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Result<Self, InvalidResult> {
        check_identity(&identity_hash)?;
        if kind == FailureKind::Unreadable {
            return Err(InvalidResult::UnreadableWithIdentity);
        }
        Ok(Self::with_failure(identity_hash, file_size, kind, message.into()))
    }

    /// The file could not be read
    pub fn unreadable(message: impl Into<String>) -> Self {
        Self {
            identity_hash: String::new(),
            perceptual_hash: String::new(),
            file_size: 0,
            error: Some(HashFailure {
                kind: FailureKind::Unreadable,
                message: message.into(),
            }),
        }
    }

    /// Complete result from the two hashers' outputs
    pub(crate) fn from_hashes(digest: FileDigest, fingerprint: &Fingerprint) -> Self {
        Self {
            identity_hash: digest.sha256,
            perceptual_hash: fingerprint.to_hex(),
            file_size: digest.size,
            error: None,
        }
    }

    /// Identity-only result from a perceptual-stage error
    pub(crate) fn from_perceptual_error(digest: FileDigest, error: &HashError) -> Self {
        // The file was already read once, so a perceptual failure is never
        // an unreadable one
        let kind = match error.failure_kind() {
            FailureKind::Unreadable => FailureKind::Decode,
            kind => kind,
        };
        Self::with_failure(digest.sha256, digest.size, kind, error.to_string())
    }

    fn with_failure(
        identity_hash: String,
        file_size: u64,
        kind: FailureKind,
        message: String,
    ) -> Self {
        Self {
            identity_hash,
            perceptual_hash: String::new(),
            file_size,
            error: Some(HashFailure { kind, message }),
        }
    }

    /// 64 lowercase hex chars, or empty if unreadable
    pub fn identity_hash(&self) -> &str {
        &self.identity_hash
    }

    /// `bit_width² / 4` lowercase hex chars, or empty if not fingerprinted
    pub fn perceptual_hash(&self) -> &str {
        &self.perceptual_hash
    }

    /// Bytes hashed; 0 if unreadable
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Failure details, `None` on full success
    pub fn error(&self) -> Option<&HashFailure> {
        self.error.as_ref()
    }

    pub fn status(&self) -> HashStatus {
        match &self.error {
            None => HashStatus::Complete,
            Some(failure) if failure.kind == FailureKind::Unreadable => HashStatus::Unreadable,
            Some(_) => HashStatus::IdentityOnly,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn has_identity(&self) -> bool {
        !self.identity_hash.is_empty()
    }

    pub fn has_perceptual(&self) -> bool {
        !self.perceptual_hash.is_empty()
    }
}

impl BatchSummary {
    /// Count outcomes in a result map
    pub fn from_results(results: &HashMap<PathBuf, HashResult>, elapsed: Duration) -> Self {
        let mut summary = BatchSummary {
            total_files: results.len(),
            duration_ms: elapsed.as_millis() as u64,
            ..Default::default()
        };

        for result in results.values() {
            match result.status() {
                HashStatus::Complete => summary.complete += 1,
                HashStatus::IdentityOnly => summary.identity_only += 1,
                HashStatus::Unreadable => summary.unreadable += 1,
            }
        }

        summary
    }
}
