//! Fixture images generated on the fly.
//!
//! The "photos" are grids of 20x20 px tiles, 17 tiles wide and 16 tall, so
//! a 16x16 dHash sees exactly one tile per sample. Horizontally adjacent
//! tiles alternate between a bright and a dark band, which keeps every
//! gradient sign far from zero and stable under lossy re-encoding.

#![allow(dead_code)]

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const TILE: u32 = 20;
const COLUMNS: u32 = 17;
const ROWS: u32 = 16;

/// Tile photo; tiles where `x + phase(y)` is even are bright
pub fn tile_photo(seed: u32, phase: impl Fn(u32) -> u32) -> RgbImage {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let mut levels = Vec::with_capacity((COLUMNS * ROWS) as usize);
    for y in 0..ROWS {
        for x in 0..COLUMNS {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let jitter = ((state >> 16) % 30) as u8;
            let bright = (x + phase(y)) % 2 == 0;
            levels.push(if bright { 170 + jitter } else { 30 + jitter });
        }
    }

    RgbImage::from_fn(COLUMNS * TILE, ROWS * TILE, |px, py| {
        let level = levels[((py / TILE) * COLUMNS + px / TILE) as usize];
        // Slight warm tint so the colour path is exercised
        Rgb([level.saturating_add(8), level, level.saturating_sub(8)])
    })
}

/// The main fixture: a checkerboard of jittered tiles
pub fn holiday_photo() -> RgbImage {
    tile_photo(7, |y| y % 2)
}

/// A fixture with a different tile layout
pub fn unrelated_photo() -> RgbImage {
    tile_photo(1234, |y| (y / 2) % 2)
}

pub fn write_jpeg(dir: &Path, name: &str, image: &RgbImage, quality: u8) -> PathBuf {
    let path = dir.join(name);
    let mut writer = BufWriter::new(File::create(&path).unwrap());
    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(image)
        .unwrap();
    path
}

pub fn write_png(dir: &Path, name: &str, image: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

/// An ISO-BMFF `ftyp` box with HEIC brands and nothing else
pub fn fake_heic_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&24u32.to_be_bytes());
    bytes.extend_from_slice(b"ftypheic");
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(b"mif1heic");
    bytes.extend_from_slice(&[0u8; 64]);
    bytes
}
