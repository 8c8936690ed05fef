//! Fingerprint value type and the hash algorithm trait.

use crate::config::is_valid_bit_width;
use crate::error::{CompareError, HashError};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A perceptual fingerprint: a `bit_width x bit_width` bit matrix,
/// row-major, most significant bit first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    bit_width: u32,
    /// Packed bits; a trailing half byte is zero-filled
    bytes: Vec<u8>,
}

impl Fingerprint {
    /// Pack a row-major bit sequence.
    ///
    /// Missing trailing bits are treated as zero and extra bits are ignored.
    pub fn from_bits<I>(bit_width: u32, bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let bit_count = (bit_width * bit_width) as usize;
        let mut bytes = vec![0u8; bit_count.div_ceil(8)];

        for (index, bit) in bits.into_iter().take(bit_count).enumerate() {
            if bit {
                bytes[index / 8] |= 1 << (7 - index % 8);
            }
        }

        Self { bit_width, bytes }
    }

    /// Parse the hex form produced by [`to_hex`](Self::to_hex).
    ///
    /// The string must be exactly `bit_width² / 4` hex digits. Upper case is
    /// accepted.
    pub fn from_hex(hex: &str, bit_width: u32) -> Result<Self, CompareError> {
        let malformed = |reason: String| CompareError::MalformedHash {
            hash: hex.to_string(),
            reason,
        };

        if !is_valid_bit_width(bit_width) {
            return Err(malformed(format!("unsupported bit width {}", bit_width)));
        }

        let expected = Self::hex_len(bit_width);
        if hex.len() != expected {
            return Err(malformed(format!(
                "expected {} hex characters for a {}x{} hash, got {}",
                expected,
                bit_width,
                bit_width,
                hex.len()
            )));
        }

        let mut bytes = vec![0u8; expected.div_ceil(2)];
        for (index, c) in hex.chars().enumerate() {
            let nibble = c
                .to_digit(16)
                .ok_or_else(|| malformed(format!("{:?} is not a hex digit", c)))?
                as u8;
            if index % 2 == 0 {
                bytes[index / 2] |= nibble << 4;
            } else {
                bytes[index / 2] |= nibble;
            }
        }

        Ok(Self { bit_width, bytes })
    }

    /// Hex length of a fingerprint of the given width
    pub fn hex_len(bit_width: u32) -> usize {
        (bit_width * bit_width / 4) as usize
    }

    /// Side length of the bit matrix
    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }

    /// Total number of bits
    pub fn bit_count(&self) -> u32 {
        self.bit_width * self.bit_width
    }

    /// Packed bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex, `bit_width² / 4` characters
    pub fn to_hex(&self) -> String {
        let mut hex: String = self.bytes.iter().map(|b| format!("{:02x}", b)).collect();
        hex.truncate(Self::hex_len(self.bit_width));
        hex
    }

    /// Hamming distance: the number of differing bits.
    pub fn distance(&self, other: &Self) -> Result<u32, CompareError> {
        if self.bit_width != other.bit_width {
            return Err(CompareError::BitWidthMismatch {
                left: self.bit_width,
                right: other.bit_width,
            });
        }

        Ok(self
            .bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A perceptual hash algorithm over decoded images
pub trait HashAlgorithm: Send + Sync {
    /// Fingerprint an already-decoded image
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError>;

    /// Side length of the fingerprints this algorithm produces
    fn bit_width(&self) -> u32;
}
