//! # Core Module
//!
//! The hashing and comparison engine.
//!
//! ## Modules
//! - `identity` - SHA-256 over raw file bytes
//! - `hasher` - Perceptual fingerprints (dHash)
//! - `comparator` - Hamming distance and similarity queries
//! - `batch` - Hashes many files with per-file failure isolation

pub mod batch;
pub mod comparator;
pub mod hasher;
pub mod identity;

// Re-export commonly used types
pub use batch::{BatchHasher, HashResult, HashStatus, PhotoHasher};
pub use comparator::{
    find_similar, group_identical, hamming_distance, MatchType, SimilarityEngine,
    SimilarityMatch, SimilaritySearch,
};
pub use hasher::{perceptual_hash, Fingerprint, HasherConfig, PerceptualHasher};
pub use identity::{identity_hash, IdentityHasher};
