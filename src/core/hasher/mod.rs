//! # Hasher Module
//!
//! Computes perceptual fingerprints (dHash) for image files.
//!
//! ## How It Works
//! 1. Decode the file (format sniffed from content, then extension)
//! 2. Convert to 8-bit BT.601 grayscale
//! 3. Resize to `(w+1) x w` with a Lanczos3 convolution
//! 4. Emit one bit per horizontal neighbour pair: `left > right`
//! 5. Pack row-major, MSB first, and print as `w² / 4` hex digits
//!
//! ## Performance Optimizations
//! - Uses `zune-jpeg` for faster JPEG decoding
//! - Uses `fast_image_resize` for SIMD-accelerated resizing
//!
//! ## HEIC/HEIF
//! HEIF support is a capability handed to the builder (see [`HeifDecoder`]).
//! [`PerceptualHasher::supports_heif`] reports whether one is installed.
//!
//! ## Example
//! ```rust,ignore
//! use photo_fingerprint::core::hasher::HasherConfig;
//!
//! let hasher = HasherConfig::new()
//!     .hash_size(16)
//!     .build()?;
//!
//! let fingerprint = hasher.hash_file(&path)?;
//! println!("{}", fingerprint.to_hex());
//! ```

mod algorithms;
pub mod fast_decode;
pub mod fast_resize;
pub mod heif;
mod mmap_decode;
mod traits;

pub use algorithms::DifferenceHasher;
pub use fast_decode::{FastDecoder, SourceFormat};
pub use heif::{is_heif, platform_heif_decoder, HeifDecoder};
pub use traits::{Fingerprint, HashAlgorithm};

#[cfg(feature = "heif")]
pub use heif::LibheifDecoder;
#[cfg(target_os = "macos")]
pub use heif::SipsDecoder;

use crate::config::DEFAULT_BIT_WIDTH;
use crate::error::HashError;
use crate::events::{null_sink, Event, EventSink, HashEvent, HashStage};
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Configuration builder for [`PerceptualHasher`]
#[derive(Clone)]
pub struct HasherConfig {
    /// Side length of the fingerprint matrix
    hash_size: u32,
    /// HEIF capability; `None` means HEIC files are unsupported
    heif_decoder: Option<Arc<dyn HeifDecoder>>,
    /// Where perceptual failures are reported
    events: Arc<dyn EventSink>,
}

impl HasherConfig {
    /// Create a new hasher configuration with defaults.
    ///
    /// Defaults: 16x16 fingerprint, the platform HEIF decoder (if any), no
    /// event sink.
    pub fn new() -> Self {
        Self {
            hash_size: DEFAULT_BIT_WIDTH,
            heif_decoder: platform_heif_decoder(),
            events: null_sink(),
        }
    }

    /// Set the hash size.
    ///
    /// Larger sizes are more discriminating but slower.
    /// - 8: 64 bits, 16 hex chars
    /// - 16: 256 bits, 64 hex chars
    /// - 32: 1024 bits, 256 hex chars
    pub fn hash_size(mut self, size: u32) -> Self {
        self.hash_size = size;
        self
    }

    /// Install (or remove, with `None`) the HEIC/HEIF decoder
    pub fn heif_decoder(mut self, decoder: Option<Arc<dyn HeifDecoder>>) -> Self {
        self.heif_decoder = decoder;
        self
    }

    /// Set the event sink for failure reports
    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Build the hasher
    pub fn build(self) -> Result<PerceptualHasher, HashError> {
        Ok(PerceptualHasher {
            algorithm: DifferenceHasher::new(self.hash_size)?,
            decoder: FastDecoder::new(self.heif_decoder),
            events: self.events,
        })
    }
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes image files and fingerprints them with dHash.
///
/// Cheap to clone and safe to share between worker threads.
#[derive(Clone)]
pub struct PerceptualHasher {
    algorithm: DifferenceHasher,
    decoder: FastDecoder,
    events: Arc<dyn EventSink>,
}

impl PerceptualHasher {
    /// Fingerprint an image file.
    ///
    /// Failures are returned and also reported once on the event sink.
    pub fn hash_file(&self, path: &Path) -> Result<Fingerprint, HashError> {
        let result = self
            .decoder
            .decode(path)
            .and_then(|image| self.hash_decoded(path, &image));

        match &result {
            Ok(fingerprint) => {
                debug!(path = %path.display(), hash = %fingerprint, "perceptual hash computed")
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "perceptual hash failed");
                self.events.emit(Event::Hash(HashEvent::Failed {
                    path: path.to_path_buf(),
                    stage: HashStage::Perceptual,
                    message: e.to_string(),
                }));
            }
        }

        result
    }

    /// Fingerprint an already-decoded image
    pub fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        self.algorithm.hash_image(image)
    }

    /// Whether HEIC/HEIF files can be decoded
    pub fn supports_heif(&self) -> bool {
        self.decoder.supports_heif()
    }

    /// Side length of the fingerprints produced
    pub fn bit_width(&self) -> u32 {
        self.algorithm.bit_width()
    }

    fn hash_decoded(&self, path: &Path, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(HashError::EmptyImage {
                path: path.to_path_buf(),
            });
        }
        self.algorithm.hash_image(image)
    }
}

/// One-shot perceptual hash of a file as lowercase hex.
///
/// Uses the platform HEIF decoder and reports nowhere; build a
/// [`PerceptualHasher`] to hash many files.
pub fn perceptual_hash(path: &Path, bit_width: u32) -> Result<String, HashError> {
    let hasher = HasherConfig::new().hash_size(bit_width).build()?;
    hasher.hash_file(path).map(|fingerprint| fingerprint.to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    fn write_checkerboard(dir: &TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let image = RgbImage::from_fn(90, 80, |x, y| {
            if (x / 10 + y / 10) % 2 == 0 {
                Rgb([230, 230, 230])
            } else {
                Rgb([20, 20, 20])
            }
        });
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn config_defaults_to_sixteen() {
        let hasher = HasherConfig::new().build().unwrap();
        assert_eq!(hasher.bit_width(), 16);
    }

    #[test]
    fn config_rejects_odd_size() {
        assert!(matches!(
            HasherConfig::new().hash_size(9).build(),
            Err(HashError::InvalidHashSize { size: 9 })
        ));
    }

    #[test]
    fn heif_capability_is_queryable() {
        let without = HasherConfig::new().heif_decoder(None).build().unwrap();
        assert!(!without.supports_heif());
    }

    #[test]
    fn hashes_a_png_file() {
        let dir = TempDir::new().unwrap();
        let path = write_checkerboard(&dir, "board.png");

        let hex = perceptual_hash(&path, 16).unwrap();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn same_file_hashes_identically() {
        let dir = TempDir::new().unwrap();
        let path = write_checkerboard(&dir, "board.png");
        let hasher = HasherConfig::new().hash_size(8).build().unwrap();

        let first = hasher.hash_file(&path).unwrap();
        let second = hasher.hash_file(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn failure_is_reported_once_on_sink() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"\x89PNG\r\n\x1a\nbut then nothing useful").unwrap();

        let (sender, receiver) = EventChannel::new();
        let hasher = HasherConfig::new().events(Arc::new(sender)).build().unwrap();

        assert!(matches!(
            hasher.hash_file(&path),
            Err(HashError::DecodeError { .. })
        ));
        drop(hasher);

        let events: Vec<_> = receiver.iter().collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::Hash(HashEvent::Failed { stage, path: failed, .. }) => {
                assert_eq!(*stage, HashStage::Perceptual);
                assert_eq!(failed, &path);
            }
            _ => panic!("Expected Failed event"),
        }
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let hasher = HasherConfig::new().build().unwrap();
        assert!(matches!(
            hasher.hash_file(Path::new("/nonexistent/photo.jpg")),
            Err(HashError::DecodeError { .. })
        ));
    }
}
