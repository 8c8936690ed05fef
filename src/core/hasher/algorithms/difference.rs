//! Difference Hash (dHash) implementation.
//!
//! dHash works by:
//! 1. Converting the image to grayscale
//! 2. Resizing it to (hash_size+1) x hash_size
//! 3. Comparing each pixel to the one to its right
//! 4. If the left pixel is brighter, the bit is 1, else 0
//!
//! Bits are emitted row-major. Because only the sign of each horizontal
//! gradient is kept, re-encoding and small brightness shifts leave most
//! bits untouched.

use super::super::fast_resize::{to_grayscale, FastResizer};
use super::super::traits::{Fingerprint, HashAlgorithm};
use crate::config::is_valid_bit_width;
use crate::error::HashError;
use image::DynamicImage;

/// Difference Hash (dHash) implementation
#[derive(Debug, Clone, Copy)]
pub struct DifferenceHasher {
    /// Side length of the comparison grid
    hash_size: u32,
}

impl DifferenceHasher {
    /// Create a new dHash hasher.
    ///
    /// `hash_size` must be even and between 2 and 64.
    pub fn new(hash_size: u32) -> Result<Self, HashError> {
        if !is_valid_bit_width(hash_size) {
            return Err(HashError::InvalidHashSize { size: hash_size });
        }
        Ok(Self { hash_size })
    }
}

impl HashAlgorithm for DifferenceHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        // One extra column for the last comparison in each row
        let gray = to_grayscale(image);
        let small = FastResizer::new().resize(&gray, self.hash_size + 1, self.hash_size)?;

        let size = self.hash_size;
        let grid = &small;
        let bits = (0..size).flat_map(move |y| {
            (0..size).map(move |x| grid.get_pixel(x, y)[0] > grid.get_pixel(x + 1, y)[0])
        });

        Ok(Fingerprint::from_bits(size, bits))
    }

    fn bit_width(&self) -> u32 {
        self.hash_size
    }
}
