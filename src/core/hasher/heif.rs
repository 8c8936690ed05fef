//! HEIC/HEIF decoding as an explicit capability.
//!
//! The `image` crate cannot read HEIF containers, so HEIC support has to come
//! from somewhere else: `libheif` (behind the `heif` cargo feature) or the
//! macOS `sips` converter. The perceptual hasher is handed one of these at
//! construction (or none) and can be asked whether it has one, so a missing
//! codec shows up as [`HashError::UnsupportedFormat`] on the affected files
//! instead of a surprise deep in a batch.

use crate::error::HashError;
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;

/// Major/compatible brands that mark an ISO-BMFF file as HEIF still image
const HEVC_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"hevm", b"hevs",
];

/// Generic image-file brands shared by HEIF and AVIF
const GENERIC_BRANDS: &[&[u8; 4]] = &[b"mif1", b"msf1"];

const AVIF_BRANDS: &[&[u8; 4]] = &[b"avif", b"avis"];

/// A HEIC/HEIF decoding capability
pub trait HeifDecoder: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Decode the primary image of a HEIF file
    fn decode(&self, path: &Path) -> Result<DynamicImage, HashError>;
}

/// Whether the leading bytes of a file are an ISO-BMFF `ftyp` box naming a
/// HEIF brand.
pub fn is_heif(header: &[u8]) -> bool {
    if header.len() < 12 || &header[4..8] != b"ftyp" {
        return false;
    }

    let box_size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let box_end = box_size.clamp(12, header.len());

    let major = &header[8..12];
    // Compatible brands start after the 4-byte minor version
    let compatible = header.get(16..box_end).unwrap_or(&[]).chunks_exact(4);
    let brands: Vec<&[u8]> = std::iter::once(major).chain(compatible).collect();
    let has_any = |set: &[&[u8; 4]]| brands.iter().any(|b| set.iter().any(|k| *b == &k[..]));

    if has_any(HEVC_BRANDS) {
        return true;
    }
    // AVIF also lists mif1/miaf; the AV1 brands decide it
    if has_any(AVIF_BRANDS) {
        return false;
    }
    has_any(GENERIC_BRANDS)
}

/// The best HEIF decoder available in this build on this platform, if any.
#[cfg(feature = "heif")]
pub fn platform_heif_decoder() -> Option<Arc<dyn HeifDecoder>> {
    Some(Arc::new(LibheifDecoder))
}

/// The best HEIF decoder available in this build on this platform, if any.
#[cfg(all(not(feature = "heif"), target_os = "macos"))]
pub fn platform_heif_decoder() -> Option<Arc<dyn HeifDecoder>> {
    Some(Arc::new(SipsDecoder))
}

/// The best HEIF decoder available in this build on this platform, if any.
#[cfg(all(not(feature = "heif"), not(target_os = "macos")))]
pub fn platform_heif_decoder() -> Option<Arc<dyn HeifDecoder>> {
    None
}

#[cfg(any(feature = "heif", target_os = "macos"))]
fn heif_error(path: &Path, reason: String) -> HashError {
    HashError::DecodeError {
        path: path.to_path_buf(),
        reason,
    }
}

/// Decodes HEIF through libheif.
#[cfg(feature = "heif")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LibheifDecoder;

#[cfg(feature = "heif")]
impl HeifDecoder for LibheifDecoder {
    fn name(&self) -> &'static str {
        "libheif"
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, HashError> {
        use libheif_rs::{ColorSpace, HeifContext, RgbChroma};

        let path_str = path
            .to_str()
            .ok_or_else(|| heif_error(path, "path is not valid UTF-8".to_string()))?;

        let ctx = HeifContext::read_from_file(path_str)
            .map_err(|e| heif_error(path, format!("libheif could not read file: {}", e)))?;
        let handle = ctx
            .primary_image_handle()
            .map_err(|e| heif_error(path, format!("no primary image: {}", e)))?;
        let decoded = handle
            .decode(ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(|e| heif_error(path, format!("libheif decode failed: {}", e)))?;

        let width = decoded.width();
        let height = decoded.height();
        let plane = decoded
            .planes()
            .interleaved
            .ok_or_else(|| heif_error(path, "decoded image has no interleaved plane".to_string()))?;

        // Rows may be padded past width * 3
        let row_len = width as usize * 3;
        let mut pixels = Vec::with_capacity(row_len * height as usize);
        for row in plane.data.chunks(plane.stride).take(height as usize) {
            let row = row.get(..row_len).ok_or_else(|| {
                heif_error(path, "decoded row is shorter than the image width".to_string())
            })?;
            pixels.extend_from_slice(row);
        }

        let rgb = image::RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| heif_error(path, "decoded buffer has the wrong length".to_string()))?;
        Ok(DynamicImage::ImageRgb8(rgb))
    }
}

/// Converts HEIF to PNG with the macOS `sips` tool and decodes the result.
#[cfg(target_os = "macos")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SipsDecoder;

#[cfg(target_os = "macos")]
impl HeifDecoder for SipsDecoder {
    fn name(&self) -> &'static str {
        "sips"
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, HashError> {
        use std::process::Command;

        // Lossless intermediate so the conversion itself does not move bits
        let converted = tempfile::Builder::new()
            .prefix("heif-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| heif_error(path, format!("cannot create temp file: {}", e)))?;

        let output = Command::new("sips")
            .arg("-s")
            .arg("format")
            .arg("png")
            .arg(path)
            .arg("--out")
            .arg(converted.path())
            .output()
            .map_err(|e| heif_error(path, format!("failed to run sips: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(heif_error(path, format!("sips conversion failed: {}", stderr.trim())));
        }

        image::open(converted.path())
            .map_err(|e| heif_error(path, format!("cannot read sips output: {}", e)))
    }
}
