//! Integration tests for perceptual hashing and similarity search.
//!
//! These tests verify:
//! - Re-encoded images stay within the very-similar band
//! - Unrelated images are far apart
//! - Ranked search over real hashing results
//! - Byte-identical copies are grouped

mod common;

use common::{holiday_photo, unrelated_photo, write_jpeg, write_png};
use photo_fingerprint::config::HashingConfig;
use photo_fingerprint::core::batch::BatchHasher;
use photo_fingerprint::core::comparator::{
    group_identical, hamming_distance, MatchType, SimilarityEngine,
};
use photo_fingerprint::core::hasher::{perceptual_hash, HasherConfig};
use std::fs;
use tempfile::TempDir;

#[test]
fn jpeg_quality_change_is_very_similar() {
    let temp_dir = TempDir::new().unwrap();
    let photo = holiday_photo();

    let high = write_jpeg(temp_dir.path(), "q90.jpg", &photo, 90);
    let low = write_jpeg(temp_dir.path(), "q70.jpg", &photo, 70);

    let a = perceptual_hash(&high, 16).unwrap();
    let b = perceptual_hash(&low, 16).unwrap();

    assert_eq!(a.len(), 64);
    let distance = hamming_distance(&a, &b, 16).unwrap();
    assert!(distance <= 5, "re-encoded distance was {}", distance);
}

#[test]
fn format_change_is_very_similar() {
    let temp_dir = TempDir::new().unwrap();
    let photo = holiday_photo();

    let png = write_png(temp_dir.path(), "original.png", &photo);
    let jpeg = write_jpeg(temp_dir.path(), "export.jpg", &photo, 90);

    let hasher = HasherConfig::new().heif_decoder(None).build().unwrap();
    let a = hasher.hash_file(&png).unwrap();
    let b = hasher.hash_file(&jpeg).unwrap();

    assert!(a.distance(&b).unwrap() <= 5);
}

#[test]
fn unrelated_image_is_different() {
    let temp_dir = TempDir::new().unwrap();

    let ours = write_jpeg(temp_dir.path(), "ours.jpg", &holiday_photo(), 90);
    let theirs = write_jpeg(temp_dir.path(), "theirs.jpg", &unrelated_photo(), 90);

    let a = perceptual_hash(&ours, 16).unwrap();
    let b = perceptual_hash(&theirs, 16).unwrap();

    let distance = hamming_distance(&a, &b, 16).unwrap();
    assert!(distance > 15, "unrelated distance was only {}", distance);
    assert_eq!(MatchType::from_distance(distance), MatchType::Different);
}

#[test]
fn distance_is_symmetric_on_real_hashes() {
    let temp_dir = TempDir::new().unwrap();
    let a = perceptual_hash(&write_png(temp_dir.path(), "a.png", &holiday_photo()), 16).unwrap();
    let b = perceptual_hash(&write_png(temp_dir.path(), "b.png", &unrelated_photo()), 16).unwrap();

    assert_eq!(hamming_distance(&a, &a, 16).unwrap(), 0);
    assert_eq!(
        hamming_distance(&a, &b, 16).unwrap(),
        hamming_distance(&b, &a, 16).unwrap()
    );
}

#[test]
fn search_over_batch_results_finds_re_encodes() {
    let temp_dir = TempDir::new().unwrap();
    let photo = holiday_photo();

    let original = write_png(temp_dir.path(), "original.png", &photo);
    let paths = vec![
        original.clone(),
        write_jpeg(temp_dir.path(), "q90.jpg", &photo, 90),
        write_jpeg(temp_dir.path(), "q70.jpg", &photo, 70),
        write_jpeg(temp_dir.path(), "other.jpg", &unrelated_photo(), 90),
    ];

    let config = HashingConfig::default();
    let batch = BatchHasher::builder()
        .config(config.clone())
        .heif_decoder(None)
        .build()
        .unwrap();
    let results = batch.hash_all(&paths);

    let engine = SimilarityEngine::from_config(&config);
    let target = results[&original].perceptual_hash();
    let search = engine.find_similar_results(target, &results).unwrap();

    let found: Vec<_> = search.matches.iter().map(|m| m.id.clone()).collect();
    assert_eq!(found.len(), 3);
    assert!(found.contains(&original));
    assert!(!found.contains(&paths[3]));
    assert!(search
        .matches
        .windows(2)
        .all(|pair| pair[0].distance <= pair[1].distance));
}

#[test]
fn byte_identical_copies_are_grouped() {
    let temp_dir = TempDir::new().unwrap();
    let original = write_jpeg(temp_dir.path(), "IMG_1000.jpg", &holiday_photo(), 85);
    let copy = temp_dir.path().join("IMG_1000 (1).jpg");
    fs::copy(&original, &copy).unwrap();
    // Same picture, different bytes
    let re_save = write_jpeg(temp_dir.path(), "IMG_1000_edit.jpg", &holiday_photo(), 60);

    let batch = BatchHasher::builder().heif_decoder(None).build().unwrap();
    let results = batch.hash_all(&[original.clone(), copy.clone(), re_save]);

    let groups = group_identical(&results);
    assert_eq!(groups.len(), 1);

    let mut expected = vec![original, copy];
    expected.sort();
    assert_eq!(groups[0].paths, expected);
}
