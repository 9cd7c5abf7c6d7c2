//! End-to-end decode tests against synthetic round-code renders. The
//! renderer in `tests/support` duplicates the wire geometry independently
//! of `roundcode`'s internals, so a passing test exercises the real
//! detection and sampling pipeline rather than a tautology.

mod support;

use roundcode::{scan, Quality, ScanError};

#[test]
fn decodes_canonical_placement() {
    support::init_logging();
    let payload = support::sample_payload();
    let img = support::render_code(&payload, 410, 1.0, (10.0, 10.0), 3.0);
    let result = scan(img.as_raw(), img.width(), img.height(), Some(Quality::Best)).unwrap();
    assert_eq!(result.payload, payload);
}

#[test]
fn decodes_when_translated() {
    support::init_logging();
    let payload = support::sample_payload();
    let img = support::render_code(&payload, 460, 1.0, (60.0, 60.0), 3.0);
    let result = scan(img.as_raw(), img.width(), img.height(), Some(Quality::Best)).unwrap();
    assert_eq!(result.payload, payload);
    assert!(result.center_x > 150 && result.center_x < 350);
    assert!(result.center_y > 150 && result.center_y < 350);
}

#[test]
fn decodes_after_low_quality_downscale() {
    support::init_logging();
    let payload = support::sparse_payload();
    let img = support::render_code(&payload, 480, 1.0, (44.0, 44.0), 10.0);
    // Low quality caps the working edge at 240px, forcing an exact 0.5x
    // box downscale before detection even starts.
    let result = scan(img.as_raw(), img.width(), img.height(), Some(Quality::Low)).unwrap();
    assert_eq!(result.payload, payload);
}

#[test]
fn decodes_dense_payload() {
    support::init_logging();
    let payload = support::dense_payload();
    let img = support::render_code(&payload, 410, 1.0, (10.0, 10.0), 2.0);
    let result = scan(img.as_raw(), img.width(), img.height(), Some(Quality::Best)).unwrap();
    assert_eq!(result.payload, payload);
}

#[test]
fn reports_not_found_on_blank_image() {
    support::init_logging();
    let buffer = vec![128u8; 200 * 200];
    let err = scan(&buffer, 200, 200, Some(Quality::Medium)).unwrap_err();
    assert!(matches!(err, ScanError::NotFound));
}

#[test]
fn reports_invalid_input_on_buffer_size_mismatch() {
    support::init_logging();
    let buffer = vec![0u8; 100];
    let err = scan(&buffer, 50, 50, Some(Quality::Medium)).unwrap_err();
    assert!(matches!(err, ScanError::InvalidInput { .. }));
}

#[test]
fn scanning_twice_is_idempotent() {
    support::init_logging();
    let payload = support::sample_payload();
    let img = support::render_code(&payload, 410, 1.0, (10.0, 10.0), 3.0);
    let first = scan(img.as_raw(), img.width(), img.height(), Some(Quality::Best)).unwrap();
    let second = scan(img.as_raw(), img.width(), img.height(), Some(Quality::Best)).unwrap();
    assert_eq!(first.payload, second.payload);
    assert_eq!(first.center_x, second.center_x);
    assert_eq!(first.center_y, second.center_y);
    assert_eq!(first.inverse_homography, second.inverse_homography);
}
