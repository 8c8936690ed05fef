//! # Batch Module
//!
//! Hashes files with both hashers and records the outcome per file.
//!
//! ## Failure isolation
//! A file that cannot be read or decoded still gets a [`HashResult`]; its
//! error is recorded there and reported on the event sink. Nothing a single
//! file does can stop the rest of the batch.
//!
//! ## Example
//! ```rust,ignore
//! use photo_fingerprint::core::batch::BatchHasher;
//! use photo_fingerprint::config::HashingConfig;
//!
//! let batch = BatchHasher::new(HashingConfig::from_env()?)?;
//! let results = batch.hash_all_with_progress(&paths, |current, total, path| {
//!     println!("[{}/{}] {}", current, total, path.display());
//! });
//! ```

mod executor;
mod photo;
mod result;

pub use executor::{BatchHasher, BatchHasherBuilder};
pub use photo::PhotoHasher;
pub use result::{HashFailure, HashResult, HashStatus};
