//! Bit-exact geometric constants for the round-code wire format. All
//! object-space coordinates live in a fixed 390x390 canonical plane
//! (`CENTER` is both axes' midpoint); the solved homography maps this
//! plane into the working image.

use std::f64::consts::PI;

/// 32-bit finder sequence, MSB of `FINDER_BYTES[0]` scanned first.
pub const FINDER_BYTES: [u8; 4] = [0xB2, 0xCB, 0x25, 0xC6];

/// Number of angular finder points on the orientation ring (one per
/// consecutive run of set bits in `FINDER_BYTES`, circularly).
pub const FINDER_POINT_COUNT: usize = 9;

/// Quantum angle used when computing finder-bit centroids: pi/16.
pub const ANGLE_QUANTUM: f64 = PI / 16.0;

/// Scale factor shared by every radius in the canonical plane.
pub const MODIFIER: f64 = 42.0;

/// Canonical plane center (both x and y).
pub const CENTER: f64 = 195.0;

/// Finder ring radius multiplier (applied to `MODIFIER`).
pub const FINDER_RING_MULTIPLIER: f64 = 2.025;

/// `out_scale = max(width, height) / INNER_RING_RATIO`.
pub const INNER_RING_RATIO: f64 = 0.32;

/// Data rings: point counts per ring, outermost last.
pub const RING_POINT_COUNTS: [usize; 5] = [40, 48, 56, 64, 72];

/// Total sampled data-ring points (== payload bits, 35 bytes).
pub const TOTAL_DATA_POINTS: usize = 40 + 48 + 56 + 64 + 72;

/// Payload size in bytes (35 bytes == 280 bits == `TOTAL_DATA_POINTS`).
pub const PAYLOAD_BYTES: usize = 35;

/// Radius multiplier for data ring `r` (1-indexed, 1..=5).
pub fn ring_radius_multiplier(r: usize) -> f64 {
    (r as f64 + 1.0) * 0.4 + 1.8
}

/// Radius (canonical plane units) of data ring `r` (1-indexed, 1..=5).
pub fn ring_radius(r: usize) -> f64 {
    MODIFIER * ring_radius_multiplier(r)
}

/// Fixed threshold used for the "whitish" binary mask.
pub const FIXED_THRESHOLD: u8 = 170;

/// Adaptive-threshold constant subtracted from the local mean.
pub const ADAPTIVE_C: i32 = 5;

/// Minimum ellipse contour length, scaled by `scaling_rate`.
pub const MIN_ELLIPSE_CONTOUR_SIZE: f64 = 22.0;

/// Minimum ellipse area, scaled by `scaling_rate`.
pub const MIN_ELLIPSE_AREA: f64 = 220.0;

/// Minimum circularity (`4*pi*area/perimeter^2`) for an ellipse candidate.
pub const MIN_CIRCULARITY: f64 = 0.75;

/// Minimum convexity (`area/hull_area`) for an ellipse candidate.
pub const MIN_CONVEXITY: f64 = 0.9;

/// Minimum inertia ratio (minor/major eigenvalue-derived) for a candidate.
pub const MIN_INERTIA: f64 = 0.5;

/// Edge tolerance (px, scaled by `scaling_rate`) used when shrinking the
/// fitted ellipse before building the finder-ring annulus mask.
pub const ELLIPSE_EDGE_TOLERANCE: f64 = 5.0;

/// Pixels shrunk from both fitted ellipse axes before searching the ring.
pub const AXIS_SHRINK_PX: f64 = 2.0;

/// Dedup threshold (px): drop the smaller of two ellipse candidates whose
/// centers are closer than this and whose areas differ by at least 2x.
pub const ELLIPSE_DEDUP_DISTANCE: f64 = 50.0;

/// Reprojection-error inlier threshold for the RANSAC homography fit, in
/// working-image pixels. Matches OpenCV's default `ransacReprojThreshold`
/// for `findHomography`.
pub const RANSAC_REPROJ_THRESHOLD: f64 = 3.0;

/// Outer radius multiplier (relative to the shrunk ellipse axes) of the
/// finder-ring annulus search band.
pub const FINDER_ANNULUS_OUTER_MULT: f64 = 1.525;

/// Inner radius multiplier of the finder-ring annulus search band.
pub const FINDER_ANNULUS_INNER_MULT: f64 = FINDER_ANNULUS_OUTER_MULT * 0.805;

/// Sequential dedup distance (px) between consecutive finder-blob
/// centroids.
pub const FINDER_CENTROID_DEDUP_DIST: f64 = 2.0;

/// Divisor applied to the 90th-percentile contour size when pruning small
/// noise blobs from the finder-ring candidate list.
pub const FINDER_SIZE_PRUNE_DIVISOR: f64 = 5.0;

/// Angular tolerance (radians) when matching detected finder-blob deltas
/// against the template's deltas.
pub const FINDER_ANGLE_TOLERANCE: f64 = 0.25;
