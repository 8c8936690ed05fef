//! # Photo Fingerprint
//!
//! Dual-hash identity for media files.
//!
//! ## Two hashes per file
//! - **Identity** - SHA-256 of the raw bytes. Equal means byte-for-byte equal.
//! - **Perceptual** - dHash of the decoded image. A small Hamming distance
//!   means the pictures look alike, even after re-encoding or metadata edits.
//!
//! ## Architecture
//! - `core` - hashers, similarity engine and batch driver
//! - `config` - immutable session settings
//! - `events` - injected event sinks for progress and failures
//! - `error` - error types
//!
//! Deciding what to do with duplicates is left to the caller.

pub mod config;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use config::HashingConfig;
pub use error::{FingerprintError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. Filtering follows
/// `RUST_LOG`. Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
