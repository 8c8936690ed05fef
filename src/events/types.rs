//! Event type definitions for hashing progress and failures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// All events emitted while hashing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Batch-level events
    Batch(BatchEvent),
    /// Per-file events
    Hash(HashEvent),
}

/// Events describing a whole `hash_all` run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BatchEvent {
    /// A batch has started
    Started { total_files: usize, workers: usize },
    /// A batch has finished
    Completed(BatchSummary),
}

/// Events for individual files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HashEvent {
    /// A file finished (successfully or not); `completed` is 1-based
    Progress(HashProgress),
    /// Both hashes were computed for a file
    FileHashed { path: PathBuf },
    /// One hashing stage failed for a file
    Failed {
        path: PathBuf,
        stage: HashStage,
        message: String,
    },
}

/// Progress information during a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashProgress {
    /// Number of files finished so far, including this one
    pub completed: usize,
    /// Total number of files in the batch
    pub total: usize,
    /// The file that just finished
    pub current_path: PathBuf,
}

/// Which pass over the file failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashStage {
    /// SHA-256 over the raw bytes
    Identity,
    /// Decode + dHash
    Perceptual,
}

impl fmt::Display for HashStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashStage::Identity => write!(f, "identity"),
            HashStage::Perceptual => write!(f, "perceptual"),
        }
    }
}

/// Outcome counts of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of distinct files with a result
    pub total_files: usize,
    /// Files with both hashes
    pub complete: usize,
    /// Files with an identity hash but no perceptual hash
    pub identity_only: usize,
    /// Files that could not be read at all
    pub unreadable: usize,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl BatchSummary {
    /// Number of files with any failure
    pub fn failed(&self) -> usize {
        self.identity_only + self.unreadable
    }
}
