//! Grayscale reduction and SIMD-accelerated resizing.
//!
//! Grayscale uses ITU-R BT.601 luma in 16.16 fixed point, the integer
//! formula common imaging libraries use for RGB to `L` conversion.
//! Resizing is a Lanczos3 convolution through `fast_image_resize`.

use crate::error::HashError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

/// BT.601 luma of one RGB pixel
#[inline]
pub fn luma_bt601(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// Reduce an image to one 8-bit luminance channel. Alpha is ignored.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = image {
        return gray.clone();
    }

    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut gray = GrayImage::new(width, height);
    for (source, target) in rgb.pixels().zip(gray.pixels_mut()) {
        let [r, g, b] = source.0;
        *target = Luma([luma_bt601(r, g, b)]);
    }
    gray
}

/// Reusable resizer
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    /// Create a new resizer
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Resize a grayscale image to exactly `width x height`.
    pub fn resize(
        &mut self,
        gray: &GrayImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, HashError> {
        let (src_width, src_height) = gray.dimensions();

        if src_width == 0 || src_height == 0 {
            return Err(HashError::ComputationFailed(
                "source image has no pixels".to_string(),
            ));
        }
        if width == 0 || height == 0 {
            return Err(HashError::ComputationFailed(format!(
                "invalid target size {}x{}",
                width, height
            )));
        }

        let src_image =
            Image::from_vec_u8(src_width, src_height, gray.as_raw().clone(), PixelType::U8)
                .map_err(|e| {
                    HashError::ComputationFailed(format!("invalid source buffer: {}", e))
                })?;

        let mut dst_image = Image::new(width, height, PixelType::U8);

        let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| HashError::ComputationFailed(format!("resize failed: {}", e)))?;

        let result: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_raw(width, height, dst_image.into_vec()).ok_or_else(|| {
                HashError::ComputationFailed("resized buffer has the wrong length".to_string())
            })?;

        Ok(result)
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Grayscale then resize, for one-off use.
pub fn resize_to_grayscale(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<GrayImage, HashError> {
    FastResizer::new().resize(&to_grayscale(image), width, height)
}
