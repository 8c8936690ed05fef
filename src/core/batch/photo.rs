//! Both hashes for one file.

use super::HashResult;
use crate::config::HashingConfig;
use crate::core::hasher::{HasherConfig, HeifDecoder, PerceptualHasher};
use crate::core::identity::IdentityHasher;
use crate::error::HashError;
use crate::events::{Event, EventSink, HashEvent, HashStage};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Runs the identity pass and then the perceptual pass over a file.
///
/// Never fails: every outcome is a [`HashResult`]. Identity failures are
/// reported on the sink here; perceptual failures are reported by the
/// [`PerceptualHasher`].
#[derive(Clone)]
pub struct PhotoHasher {
    identity: IdentityHasher,
    perceptual: PerceptualHasher,
    events: Arc<dyn EventSink>,
}

impl PhotoHasher {
    /// Assemble from already-built hashers
    pub fn new(
        identity: IdentityHasher,
        perceptual: PerceptualHasher,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            identity,
            perceptual,
            events,
        }
    }

    /// Build both hashers from a configuration.
    pub fn from_config(
        config: &HashingConfig,
        heif_decoder: Option<Arc<dyn HeifDecoder>>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, HashError> {
        let perceptual = HasherConfig::new()
            .hash_size(config.bit_width)
            .heif_decoder(heif_decoder)
            .events(Arc::clone(&events))
            .build()?;

        Ok(Self::new(
            IdentityHasher::new(config.chunk_size),
            perceptual,
            events,
        ))
    }

    /// Hash one file.
    pub fn hash(&self, path: &Path) -> HashResult {
        let digest = match self.identity.hash_file(path) {
            Ok(digest) => digest,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "identity hash failed");
                self.events.emit(Event::Hash(HashEvent::Failed {
                    path: path.to_path_buf(),
                    stage: HashStage::Identity,
                    message: e.to_string(),
                }));
                return HashResult::unreadable(e.to_string());
            }
        };

        match self.perceptual.hash_file(path) {
            Ok(fingerprint) => {
                self.events.emit(Event::Hash(HashEvent::FileHashed {
                    path: path.to_path_buf(),
                }));
                HashResult::from_hashes(digest, &fingerprint)
            }
            Err(e) => HashResult::from_perceptual_error(digest, &e),
        }
    }

    /// Whether HEIC/HEIF files will get a perceptual hash
    pub fn supports_heif(&self) -> bool {
        self.perceptual.supports_heif()
    }

    /// Perceptual hash width
    pub fn bit_width(&self) -> u32 {
        self.perceptual.bit_width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::batch::HashStatus;
    use crate::error::FailureKind;
    use crate::events::EventChannel;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    fn hasher_with_channel() -> (PhotoHasher, crate::events::EventReceiver) {
        let (sender, receiver) = EventChannel::new();
        let hasher =
            PhotoHasher::from_config(&HashingConfig::default(), None, Arc::new(sender)).unwrap();
        (hasher, receiver)
    }

    #[test]
    fn image_gets_both_hashes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stripes.png");
        let stripes = RgbImage::from_fn(64, 64, |x, _| {
            if x % 16 < 8 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        stripes.save(&path).unwrap();

        let hasher =
            PhotoHasher::from_config(&HashingConfig::default(), None, crate::events::null_sink())
                .unwrap();
        let result = hasher.hash(&path);

        assert_eq!(result.status(), HashStatus::Complete);
        assert_eq!(result.identity_hash().len(), 64);
        assert_eq!(result.perceptual_hash().len(), 64);
        assert_eq!(result.file_size(), fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn non_image_keeps_identity_hash() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"abc").unwrap();

        let (hasher, receiver) = hasher_with_channel();
        let result = hasher.hash(&path);
        drop(hasher);

        assert_eq!(result.status(), HashStatus::IdentityOnly);
        assert_eq!(
            result.identity_hash(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(result.file_size(), 3);
        assert_eq!(result.error().unwrap().kind, FailureKind::Decode);

        let stages: Vec<_> = receiver
            .iter()
            .filter_map(|event| match event {
                Event::Hash(HashEvent::Failed { stage, .. }) => Some(stage),
                _ => None,
            })
            .collect();
        assert_eq!(stages, vec![HashStage::Perceptual]);
    }

    #[test]
    fn missing_file_is_unreadable_and_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vanished.jpg");

        let (hasher, receiver) = hasher_with_channel();
        let result = hasher.hash(&path);
        drop(hasher);

        assert_eq!(result.status(), HashStatus::Unreadable);
        assert!(result.identity_hash().is_empty());
        assert_eq!(result.file_size(), 0);

        let events: Vec<_> = receiver.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::Hash(HashEvent::Failed {
                stage: HashStage::Identity,
                ..
            })
        ));
    }
}
