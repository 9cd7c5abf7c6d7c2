//! Orchestrator: preprocess, discover ellipse candidates, match each
//! against the finder-ring template, solve a homography and sample the
//! payload, returning on the first candidate that succeeds all the way
//! through.

use crate::constants::{ADAPTIVE_C, FIXED_THRESHOLD, INNER_RING_RATIO};
use crate::ellipse::{discover_ellipses, EllipseCandidate, Polarity};
use crate::error::{InternalGeometryFailure, ScanError};
use crate::finder::{extract_finder_points, FinderTemplate};
use crate::geometry::{Homography, Point};
use crate::quality::Quality;
use crate::raster::{adaptive_threshold_inv, downscale, fixed_threshold, unsharp_mask};
use crate::sampler::sample_payload;
use crate::solver::solve_homography;
use crate::timing::ScanTiming;
use image::GrayImage;
use rand::Rng;
use std::time::Instant;

/// Successful scan: the 35-byte payload plus placement metadata in the
/// (possibly downscaled) working-image coordinate space.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub payload: [u8; crate::constants::PAYLOAD_BYTES],
    pub center_x: u32,
    pub center_y: u32,
    pub scale: u32,
    /// Row-major 3x3 homography mapping working-image coordinates back to
    /// the canonical code plane.
    pub inverse_homography: [f64; 9],
}

/// Scans `buffer` (row-major greyscale, `width * height` bytes) for a
/// round code. `quality` defaults to [`Quality::High`] when `None`.
pub fn scan(
    buffer: &[u8],
    width: u32,
    height: u32,
    quality: Option<Quality>,
) -> Result<ScanResult, ScanError> {
    scan_timed(buffer, width, height, quality).map(|(result, _)| result)
}

/// Like [`scan`], but also returns a per-stage timing breakdown.
pub fn scan_timed(
    buffer: &[u8],
    width: u32,
    height: u32,
    quality: Option<Quality>,
) -> Result<(ScanResult, ScanTiming), ScanError> {
    let quality = quality.unwrap_or_default();
    let total_start = Instant::now();
    let expected = (width as usize) * (height as usize);
    if buffer.len() != expected {
        return Err(ScanError::InvalidInput {
            expected,
            got: buffer.len(),
        });
    }

    let image = GrayImage::from_raw(width, height, buffer.to_vec())
        .ok_or(ScanError::InvalidInput { expected, got: buffer.len() })?;

    let max_edge = width.max(height);
    let cap = quality.max_edge();
    let working = if max_edge > cap {
        downscale(&image, cap as f64 / max_edge as f64)
    } else {
        image
    };
    let (w, h) = working.dimensions();
    let scaling_rate = (w.min(h) as f64) / 480.0;

    let preprocess_start = Instant::now();
    let mut sharpened = working.clone();
    if quality.double_sharpen() {
        sharpened = unsharp_mask(&sharpened);
        sharpened = unsharp_mask(&sharpened);
    }
    let whitish = fixed_threshold(&sharpened, FIXED_THRESHOLD);
    let preprocess_time = preprocess_start.elapsed();

    let ellipse_start = Instant::now();
    let candidates = discover_ellipses(&whitish, scaling_rate);
    let ellipse_time = ellipse_start.elapsed();
    log::debug!("found {} ellipse candidates", candidates.len());

    let template = FinderTemplate::new();
    let object_finder_points = template.object_points();
    let mut blackish: Option<GrayImage> = None;
    let mut rng = rand::thread_rng();

    let mut finder_solve_time = std::time::Duration::ZERO;
    let mut sampling_time = std::time::Duration::ZERO;

    for candidate in &candidates {
        let finder_start = Instant::now();
        // Computed once and reused across candidates, since any candidate
        // may turn out to need the adaptive fallback mask.
        let blackish_ref = blackish
            .get_or_insert_with(|| adaptive_threshold_inv(&sharpened, quality.adaptive_block(), ADAPTIVE_C));

        let located = locate_homography(
            candidate,
            &whitish,
            blackish_ref,
            &template,
            &object_finder_points,
            &mut rng,
        );
        let (polarity, homography, inverse) = match located {
            Ok(v) => v,
            Err(e) => {
                log::debug!("candidate at {:?} rejected: {:#}", candidate.center, e.0);
                continue;
            }
        };
        finder_solve_time += finder_start.elapsed();

        let sampling_start = Instant::now();
        let mask: &GrayImage = match polarity {
            Polarity::Normal => &whitish,
            Polarity::Inverted => blackish_ref,
        };
        let payload = sample_payload(&homography, mask);
        sampling_time += sampling_start.elapsed();

        let result = ScanResult {
            payload,
            center_x: candidate.center.0.round() as u32,
            center_y: candidate.center.1.round() as u32,
            scale: (w.max(h) as f64 / INNER_RING_RATIO).round() as u32,
            inverse_homography: inverse.to_row_major(),
        };

        return Ok((
            result,
            ScanTiming {
                preprocess: preprocess_time,
                ellipse_discovery: ellipse_time,
                finder_and_solve: finder_solve_time,
                sampling: sampling_time,
                total: total_start.elapsed(),
            },
        ));
    }

    Err(ScanError::NotFound)
}

/// Matches `candidate`'s finder ring and solves its homography, folding
/// every failure mode into one `anyhow`-backed error so the orchestrator
/// can log *why* a candidate was rejected without exposing that detail in
/// [`ScanError`].
fn locate_homography(
    candidate: &EllipseCandidate,
    whitish: &GrayImage,
    blackish: &GrayImage,
    template: &FinderTemplate,
    object_finder_points: &[Point],
    rng: &mut impl Rng,
) -> Result<(Polarity, Homography, Homography), InternalGeometryFailure> {
    let (polarity, finder_points) =
        extract_finder_points(candidate, whitish, Some(blackish), template)
            .ok_or_else(|| anyhow::anyhow!("finder ring did not match"))?;

    let image_pts: Vec<Point> = finder_points.to_vec();
    let homography = solve_homography(object_finder_points, &image_pts, rng)
        .ok_or_else(|| anyhow::anyhow!("homography solve failed"))?;
    let inverse = homography
        .inverse()
        .ok_or_else(|| anyhow::anyhow!("homography not invertible"))?;

    Ok((polarity, homography, inverse))
}
