//! Image decoding with format sniffing.
//!
//! The format is taken from the file content first and the extension
//! second, so a HEIC saved as `.jpg` (or the reverse) still goes to the
//! right decoder. JPEG uses zune-jpeg with the `image` crate as fallback;
//! HEIC/HEIF uses the injected [`HeifDecoder`]; everything else uses `image`.
//!
//! Sniffing reads only the file header, so a large non-image (a video, an
//! archive) is rejected without loading it.

use super::heif::{is_heif, HeifDecoder};
use super::mmap_decode::{read_file_bytes, read_header};
use crate::error::HashError;
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb, Rgba};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// How a file will be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Heif,
    /// Any other format the `image` crate recognises
    Raster(ImageFormat),
    Unknown,
}

impl SourceFormat {
    /// Detect format from content, falling back to the extension
    pub fn detect(path: &Path, bytes: &[u8]) -> Self {
        if is_heif(bytes) {
            return Self::Heif;
        }
        match image::guess_format(bytes) {
            Ok(ImageFormat::Jpeg) => return Self::Jpeg,
            Ok(format) => return Self::Raster(format),
            Err(_) => {}
        }
        Self::from_extension(path)
    }

    /// Detect format from the file extension only
    pub fn from_extension(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("heic" | "heif" | "hif") => Self::Heif,
            Some("jpg" | "jpeg") => Self::Jpeg,
            Some(ext) => ImageFormat::from_extension(ext)
                .map(Self::Raster)
                .unwrap_or(Self::Unknown),
            None => Self::Unknown,
        }
    }
}

/// Decoder that routes each file to the best available codec
#[derive(Clone, Default)]
pub struct FastDecoder {
    heif: Option<Arc<dyn HeifDecoder>>,
}

impl FastDecoder {
    /// Create a decoder with an optional HEIF capability
    pub fn new(heif: Option<Arc<dyn HeifDecoder>>) -> Self {
        Self { heif }
    }

    /// Whether HEIC/HEIF files can be decoded
    pub fn supports_heif(&self) -> bool {
        self.heif.is_some()
    }

    /// Decode an image file.
    pub fn decode(&self, path: &Path) -> Result<DynamicImage, HashError> {
        let format = SourceFormat::detect(path, &read_header(path)?);
        debug!(path = %path.display(), ?format, "decoding image");

        match format {
            SourceFormat::Heif => self.decode_heif(path),
            SourceFormat::Jpeg => {
                let bytes = read_file_bytes(path)?;
                Self::decode_jpeg(path, &bytes)
                    .or_else(|_| Self::decode_with(path, &bytes, ImageFormat::Jpeg))
            }
            SourceFormat::Raster(format) => {
                Self::decode_with(path, &read_file_bytes(path)?, format)
            }
            SourceFormat::Unknown => Err(HashError::DecodeError {
                path: path.to_path_buf(),
                reason: "unrecognised image format".to_string(),
            }),
        }
    }

    fn decode_heif(&self, path: &Path) -> Result<DynamicImage, HashError> {
        match &self.heif {
            Some(decoder) => {
                debug!(path = %path.display(), decoder = decoder.name(), "decoding HEIF");
                decoder.decode(path)
            }
            None => Err(HashError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: "HEIC/HEIF".to_string(),
                reason: "no HEIF decoder is available".to_string(),
            }),
        }
    }

    /// Fast JPEG decoding using zune-jpeg
    fn decode_jpeg(path: &Path, bytes: &[u8]) -> Result<DynamicImage, HashError> {
        let decode_error = |reason: String| HashError::DecodeError {
            path: path.to_path_buf(),
            reason,
        };

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(bytes, options);

        let pixels = decoder
            .decode()
            .map_err(|e| decode_error(format!("zune-jpeg decode failed: {:?}", e)))?;

        let info = decoder
            .info()
            .ok_or_else(|| decode_error("missing JPEG header info".to_string()))?;
        let width = info.width as u32;
        let height = info.height as u32;

        let image = match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgb8),
            ColorSpace::RGBA => ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgba8),
            ColorSpace::Luma => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageLuma8),
            other => {
                return Err(decode_error(format!(
                    "unsupported JPEG output colorspace {:?}",
                    other
                )))
            }
        };

        image.ok_or_else(|| decode_error("decoded buffer has the wrong length".to_string()))
    }

    /// Decode with the `image` crate. Any failure here is a decode error;
    /// `UnsupportedFormat` is reserved for a missing HEIF capability.
    fn decode_with(
        path: &Path,
        bytes: &[u8],
        format: ImageFormat,
    ) -> Result<DynamicImage, HashError> {
        image::load_from_memory_with_format(bytes, format).map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
