//! # Comparator Module
//!
//! Compares fingerprints by Hamming distance.
//!
//! ## Queries
//! - [`hamming_distance`] - distance between two hex fingerprints
//! - [`find_similar`] - ranked candidates within a threshold of a target
//! - [`find_similar_pairs`] - every pair within a threshold
//! - [`group_identical`] - byte-identical files by identity hash
//!
//! ## Distance Bands
//! | Distance | Classification |
//! |----------|----------------|
//! | 0        | Identical      |
//! | 1-5      | Very similar   |
//! | 6-15     | Similar        |
//! | 16+      | Different      |
//!
//! The bands are informative; only the strategy threshold filters results.
//!
//! ## Malformed candidates
//! A candidate whose hash does not parse at the configured width is left out
//! of the matches and listed in [`SimilaritySearch::skipped`]; the rest of
//! the query is unaffected. A malformed target fails the whole query.

mod traits;

pub use traits::{ComparisonStrategy, ThresholdStrategy};

use crate::config::HashingConfig;
use crate::core::batch::HashResult;
use crate::core::hasher::Fingerprint;
use crate::error::CompareError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

/// Classification of a distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchType {
    /// Distance = 0, identical visual content
    Identical,
    /// Distance 1-5, likely the same photo re-saved
    VerySimilar,
    /// Distance 6-15, possibly cropped or edited
    Similar,
    /// Distance 16+, different images
    Different,
}

impl MatchType {
    /// Classify based on Hamming distance
    pub fn from_distance(distance: u32) -> Self {
        match distance {
            0 => MatchType::Identical,
            1..=5 => MatchType::VerySimilar,
            6..=15 => MatchType::Similar,
            _ => MatchType::Different,
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::Identical => write!(f, "Identical"),
            MatchType::VerySimilar => write!(f, "Very Similar"),
            MatchType::Similar => write!(f, "Similar"),
            MatchType::Different => write!(f, "Different"),
        }
    }
}

/// A candidate within the threshold of a query target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityMatch<K> {
    /// Caller's identifier for the candidate
    pub id: K,
    /// Hamming distance to the target
    pub distance: u32,
    /// Band of the distance
    pub match_type: MatchType,
}

/// A candidate left out of a query because its hash did not parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCandidate<K> {
    pub id: K,
    pub error: CompareError,
}

/// Output of [`find_similar`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilaritySearch<K> {
    /// Matches, ascending by distance; ties keep candidate order
    pub matches: Vec<SimilarityMatch<K>>,
    /// Candidates with malformed hashes
    pub skipped: Vec<SkippedCandidate<K>>,
}

impl<K> SimilaritySearch<K> {
    /// Whether every candidate parsed
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// `(id, distance)` pairs in rank order
    pub fn into_pairs(self) -> Vec<(K, u32)> {
        self.matches
            .into_iter()
            .map(|m| (m.id, m.distance))
            .collect()
    }
}

/// Two records within the threshold of each other
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarPair<K> {
    pub first: K,
    pub second: K,
    pub distance: u32,
    pub match_type: MatchType,
}

/// Files whose bytes are identical
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdenticalGroup {
    /// Shared SHA-256
    pub identity_hash: String,
    /// Shared size in bytes
    pub file_size: u64,
    /// Member paths, sorted
    pub paths: Vec<PathBuf>,
}

/// Hamming distance between two hex fingerprints of `bit_width`.
///
/// Either string failing to parse at that width is `MalformedHash`.
pub fn hamming_distance(a: &str, b: &str, bit_width: u32) -> Result<u32, CompareError> {
    let a = Fingerprint::from_hex(a, bit_width)?;
    let b = Fingerprint::from_hex(b, bit_width)?;
    a.distance(&b)
}

/// Every candidate within the strategy threshold of `target`, nearest first.
pub fn find_similar<K, S, I>(
    target: &str,
    candidates: I,
    bit_width: u32,
    strategy: &dyn ComparisonStrategy,
) -> Result<SimilaritySearch<K>, CompareError>
where
    I: IntoIterator<Item = (K, S)>,
    S: AsRef<str>,
    K: fmt::Debug,
{
    let target = Fingerprint::from_hex(target, bit_width)?;

    let mut matches = Vec::new();
    let mut skipped = Vec::new();

    for (id, hash) in candidates {
        let distance = match Fingerprint::from_hex(hash.as_ref(), bit_width)
            .and_then(|candidate| target.distance(&candidate))
        {
            Ok(distance) => distance,
            Err(error) => {
                warn!(candidate = ?id, error = %error, "skipping malformed candidate hash");
                skipped.push(SkippedCandidate { id, error });
                continue;
            }
        };

        if strategy.is_match(distance) {
            matches.push(SimilarityMatch {
                id,
                distance,
                match_type: strategy.classify(distance),
            });
        }
    }

    // Stable, so equal distances stay in candidate order
    matches.sort_by_key(|m| m.distance);

    Ok(SimilaritySearch { matches, skipped })
}

/// Find all pairs of records within the strategy threshold.
///
/// Pairs are ordered by distance, then by position of the first record.
pub fn find_similar_pairs<K: Clone>(
    records: &[(K, Fingerprint)],
    strategy: &dyn ComparisonStrategy,
) -> Result<Vec<SimilarPair<K>>, CompareError> {
    let mut pairs = Vec::new();

    for i in 0..records.len() {
        for j in (i + 1)..records.len() {
            let (id_a, hash_a) = &records[i];
            let (id_b, hash_b) = &records[j];

            let distance = hash_a.distance(hash_b)?;

            if strategy.is_match(distance) {
                pairs.push(SimilarPair {
                    first: id_a.clone(),
                    second: id_b.clone(),
                    distance,
                    match_type: strategy.classify(distance),
                });
            }
        }
    }

    pairs.sort_by_key(|p| p.distance);
    Ok(pairs)
}

/// Group byte-identical files.
///
/// Unreadable results are ignored. Only groups of two or more are returned,
/// ordered by their first path.
pub fn group_identical(results: &HashMap<PathBuf, HashResult>) -> Vec<IdenticalGroup> {
    let mut by_hash: BTreeMap<&str, (u64, Vec<PathBuf>)> = BTreeMap::new();

    for (path, result) in results {
        if !result.has_identity() {
            continue;
        }
        by_hash
            .entry(result.identity_hash())
            .or_insert_with(|| (result.file_size(), Vec::new()))
            .1
            .push(path.clone());
    }

    let mut groups: Vec<IdenticalGroup> = by_hash
        .into_iter()
        .filter(|(_, (_, paths))| paths.len() > 1)
        .map(|(hash, (file_size, mut paths))| {
            paths.sort();
            IdenticalGroup {
                identity_hash: hash.to_string(),
                file_size,
                paths,
            }
        })
        .collect();

    groups.sort_by(|a, b| a.paths.cmp(&b.paths));
    groups
}

/// Similarity queries bound to one fingerprint width and threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimilarityEngine {
    bit_width: u32,
    strategy: ThresholdStrategy,
}

impl SimilarityEngine {
    /// Create an engine for fingerprints of `bit_width` and a match threshold
    pub fn new(bit_width: u32, threshold: u32) -> Self {
        Self {
            bit_width,
            strategy: ThresholdStrategy::new(threshold),
        }
    }

    /// Create an engine from the session configuration
    pub fn from_config(config: &HashingConfig) -> Self {
        Self::new(config.bit_width, config.threshold)
    }

    /// Fingerprint width this engine parses
    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }

    /// Default match threshold
    pub fn threshold(&self) -> u32 {
        self.strategy.threshold()
    }

    /// Hamming distance between two hex fingerprints
    pub fn distance(&self, a: &str, b: &str) -> Result<u32, CompareError> {
        hamming_distance(a, b, self.bit_width)
    }

    /// Candidates within the configured threshold, nearest first
    pub fn find_similar<K, S, I>(
        &self,
        target: &str,
        candidates: I,
    ) -> Result<SimilaritySearch<K>, CompareError>
    where
        I: IntoIterator<Item = (K, S)>,
        S: AsRef<str>,
        K: fmt::Debug,
    {
        find_similar(target, candidates, self.bit_width, &self.strategy)
    }

    /// Same as [`find_similar`](Self::find_similar) with a per-call threshold
    pub fn find_similar_within<K, S, I>(
        &self,
        target: &str,
        candidates: I,
        threshold: u32,
    ) -> Result<SimilaritySearch<K>, CompareError>
    where
        I: IntoIterator<Item = (K, S)>,
        S: AsRef<str>,
        K: fmt::Debug,
    {
        find_similar(
            target,
            candidates,
            self.bit_width,
            &ThresholdStrategy::new(threshold),
        )
    }

    /// Search hashing results, ignoring files without a perceptual hash.
    ///
    /// Candidates are visited in path order so ties are deterministic.
    pub fn find_similar_results(
        &self,
        target: &str,
        results: &HashMap<PathBuf, HashResult>,
    ) -> Result<SimilaritySearch<PathBuf>, CompareError> {
        let mut candidates: Vec<(PathBuf, &str)> = results
            .iter()
            .filter(|(_, result)| result.has_perceptual())
            .map(|(path, result)| (path.clone(), result.perceptual_hash()))
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        self.find_similar(target, candidates)
    }
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::from_config(&HashingConfig::default())
    }
}
