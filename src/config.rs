//! # Configuration
//!
//! Immutable settings shared by the hashers, the batch driver and the
//! similarity engine. Values are passed around by value or reference; there
//! is no process-wide configuration state.
//!
//! ## Sources
//! - [`HashingConfig::default`] - built-in defaults
//! - [`HashingConfig::from_env`] - defaults overridden by environment variables
//! - serde - any format the caller deserializes from (missing fields use defaults)

use crate::error::{FingerprintError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default perceptual hash width (16x16 = 256 bits)
pub const DEFAULT_BIT_WIDTH: u32 = 16;
/// Default maximum Hamming distance for a similarity match
pub const DEFAULT_THRESHOLD: u32 = 5;
/// Default read size for identity hashing
pub const DEFAULT_CHUNK_SIZE: usize = 8192;
/// Default number of hashing threads
pub const DEFAULT_MAX_WORKERS: usize = 4;
/// Default number of paths submitted to the pool at once
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Settings for a hashing and comparison session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingConfig {
    /// Perceptual hash width; the fingerprint is `bit_width * bit_width` bits
    pub bit_width: u32,
    /// Maximum Hamming distance reported by similarity queries
    pub threshold: u32,
    /// Chunk size in bytes for the identity hash read loop
    pub chunk_size: usize,
    /// Worker threads used by the batch driver
    pub max_workers: usize,
    /// Paths handed to the worker pool per submission
    pub batch_size: usize,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            bit_width: DEFAULT_BIT_WIDTH,
            threshold: DEFAULT_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl HashingConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load defaults and override them from the environment.
    ///
    /// Recognised variables: `PHASH_BIT_WIDTH`, `PHASH_THRESHOLD`,
    /// `HASH_CHUNK_SIZE`, `MAX_WORKERS`, `BATCH_SIZE`. Unset variables keep
    /// their defaults; unparsable ones are an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = parse_var(&lookup, "PHASH_BIT_WIDTH")? {
            config.bit_width = value;
        }
        if let Some(value) = parse_var(&lookup, "PHASH_THRESHOLD")? {
            config.threshold = value;
        }
        if let Some(value) = parse_var(&lookup, "HASH_CHUNK_SIZE")? {
            config.chunk_size = value;
        }
        if let Some(value) = parse_var(&lookup, "MAX_WORKERS")? {
            config.max_workers = value;
        }
        if let Some(value) = parse_var(&lookup, "BATCH_SIZE")? {
            config.batch_size = value;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the perceptual hash width
    pub fn bit_width(mut self, bit_width: u32) -> Self {
        self.bit_width = bit_width;
        self
    }

    /// Set the similarity threshold
    pub fn threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the identity hash chunk size
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the number of worker threads
    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Set the submission batch size
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_bit_width(self.bit_width) {
            return Err(FingerprintError::Config(format!(
                "bit_width must be an even number between 2 and 64, got {}",
                self.bit_width
            )));
        }
        if self.chunk_size == 0 {
            return Err(FingerprintError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.max_workers == 0 {
            return Err(FingerprintError::Config(
                "max_workers must be greater than zero".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(FingerprintError::Config(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Widths must be even so that `width * width` bits is a whole number of
/// hex digits.
pub(crate) fn is_valid_bit_width(bit_width: u32) -> bool {
    (2..=64).contains(&bit_width) && bit_width % 2 == 0
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            FingerprintError::Config(format!("{} has invalid value {:?}: {}", key, raw, e))
        }),
    }
}
