//! Two-pass ellipse discovery over a binary mask: shape-filtered contour
//! candidates and a least-squares ellipse fit form the first pass; the
//! second pass rasterizes each fitted ellipse's outline, prunes it
//! against `whitish`, and refits from the surviving edge pixels before
//! dedup. The disk's own silhouette is always light-on-dark by the time
//! it reaches this module (the fixed threshold already normalizes that);
//! per-ring ink polarity is resolved later, in [`crate::finder`].

use crate::constants::*;
use crate::contour::{find_contours, Contour};
use crate::raster::{and_masks, rasterize_ellipse};
use image::{GrayImage, Luma};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Code disk is lighter than its surroundings (matches the fixed
    /// "whitish" threshold directly).
    Normal,
    /// Code disk reads darker than its surroundings; the finder/data
    /// rings must be matched against the adaptive "blackish" mask.
    Inverted,
}

#[derive(Debug, Clone, Copy)]
pub struct EllipseCandidate {
    pub center: (f64, f64),
    pub semi_major: f64,
    pub semi_minor: f64,
    pub angle: f64,
    pub area: f64,
}

impl EllipseCandidate {
    /// Semi-axes shrunk by `AXIS_SHRINK_PX`, used when building the
    /// finder-ring annulus so the search starts just inside the disk edge.
    pub fn shrunk_axes(&self) -> (f64, f64) {
        (
            (self.semi_major - AXIS_SHRINK_PX).max(1.0),
            (self.semi_minor - AXIS_SHRINK_PX).max(1.0),
        )
    }
}

/// Equivalent ellipse of a *filled* pixel membership: for a uniform disk
/// of radius r, mu20 = mu02 = r^2/4, so semi-axis = 2*sqrt(lambda).
fn fit_ellipse(contour: &Contour) -> Option<EllipseCandidate> {
    fit_ellipse_with(contour, |lambda| 2.0 * lambda.sqrt())
}

/// Equivalent ellipse of a thin edge/ring pixel membership: for points
/// uniform in angle on an ellipse of semi-axis a, mu20 = a^2/2 along that
/// axis, so semi-axis = sqrt(2*lambda) rather than the filled-region
/// `2*sqrt(lambda)`. Used by the second discovery pass, which refits from
/// an AND-pruned outline rather than a filled blob.
fn fit_ellipse_from_edge(contour: &Contour) -> Option<EllipseCandidate> {
    fit_ellipse_with(contour, |lambda| (2.0 * lambda).sqrt())
}

fn fit_ellipse_with(contour: &Contour, semi_axis: impl Fn(f64) -> f64) -> Option<EllipseCandidate> {
    let (cx, cy) = contour.centroid();
    let (mu20, mu11, mu02) = contour.central_moments();
    let common = ((mu20 - mu02).powi(2) + 4.0 * mu11 * mu11).sqrt();
    let lambda1 = (mu20 + mu02 + common) / 2.0;
    let lambda2 = (mu20 + mu02 - common) / 2.0;
    if lambda1 <= 0.0 || lambda2 <= 0.0 {
        return None;
    }
    let angle = 0.5 * (2.0 * mu11).atan2(mu20 - mu02);
    Some(EllipseCandidate {
        center: (cx, cy),
        semi_major: semi_axis(lambda1),
        semi_minor: semi_axis(lambda2),
        angle,
        area: contour.area(),
    })
}

fn circularity(c: &Contour) -> f64 {
    let perimeter = c.perimeter();
    if perimeter <= 0.0 {
        return 0.0;
    }
    4.0 * std::f64::consts::PI * c.area() / (perimeter * perimeter)
}

fn convexity(c: &Contour) -> f64 {
    let hull_area = c.hull_area();
    if hull_area <= 0.0 {
        return 0.0;
    }
    c.area() / hull_area
}

/// OpenCV `SimpleBlobDetector`-style inertia ratio from central moments.
fn inertia_ratio(c: &Contour) -> f64 {
    let (mu20, mu11, mu02) = c.central_moments();
    let common = ((mu20 - mu02).powi(2) + 4.0 * mu11 * mu11).sqrt();
    let denom = mu20 + mu02 + common;
    if denom < 1e-2 {
        return 1.0;
    }
    let numer = mu20 + mu02 - common;
    numer / denom
}

/// Discovers ellipse-shaped candidates in `whitish`, filtering by size,
/// circularity, convexity and inertia (first pass), refitting each
/// survivor against its edge pixels (second pass), then dedups
/// overlapping candidates. `scaling_rate` is `min(width, height) / 480.0`,
/// per the resolution-relative thresholds.
pub fn discover_ellipses(whitish: &GrayImage, scaling_rate: f64) -> Vec<EllipseCandidate> {
    let contours = find_contours(whitish);
    let mut candidates = Vec::new();

    let min_contour_size = MIN_ELLIPSE_CONTOUR_SIZE * scaling_rate;
    let min_area = MIN_ELLIPSE_AREA * scaling_rate;

    for c in &contours {
        if (c.boundary.len() as f64) < min_contour_size {
            continue;
        }
        if c.area() < min_area {
            continue;
        }
        if circularity(c) < MIN_CIRCULARITY {
            continue;
        }
        if convexity(c) < MIN_CONVEXITY {
            continue;
        }
        if inertia_ratio(c) < MIN_INERTIA {
            continue;
        }
        let Some(ellipse) = fit_ellipse(c) else {
            continue;
        };
        candidates.push(ellipse);
    }

    let refined: Vec<EllipseCandidate> = candidates
        .into_iter()
        .map(|ellipse| refit_against_edge(whitish, ellipse, scaling_rate))
        .collect();

    dedup_candidates(refined)
}

/// Rasterizes `ellipse`'s outline at `ELLIPSE_EDGE_TOLERANCE * scaling_rate`
/// thickness, ANDs it with `whitish`, and refits a new ellipse from the
/// surviving edge pixels when there are more than 5 of them. Falls back to
/// the first-pass fit otherwise.
fn refit_against_edge(
    whitish: &GrayImage,
    ellipse: EllipseCandidate,
    scaling_rate: f64,
) -> EllipseCandidate {
    let (w, h) = whitish.dimensions();
    let half_thickness = (ELLIPSE_EDGE_TOLERANCE * scaling_rate) / 2.0;
    let outer = rasterize_ellipse(
        w,
        h,
        ellipse.center,
        (ellipse.semi_major + half_thickness, ellipse.semi_minor + half_thickness),
        ellipse.angle,
    );
    let inner = rasterize_ellipse(
        w,
        h,
        ellipse.center,
        (
            (ellipse.semi_major - half_thickness).max(0.0),
            (ellipse.semi_minor - half_thickness).max(0.0),
        ),
        ellipse.angle,
    );
    let mut outline = outer;
    for y in 0..h {
        for x in 0..w {
            if inner.get_pixel(x, y).0[0] > 0 {
                outline.put_pixel(x, y, Luma([0]));
            }
        }
    }

    let pruned = and_masks(&outline, whitish);
    let mut points = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if pruned.get_pixel(x, y).0[0] > 0 {
                points.push((x, y));
            }
        }
    }

    if points.len() > 5 {
        let edge_contour = Contour { pixels: points, boundary: Vec::new() };
        if let Some(refit) = fit_ellipse_from_edge(&edge_contour) {
            return refit;
        }
    }
    ellipse
}

/// Pairwise dedup: for every pair whose centers are within
/// `ELLIPSE_DEDUP_DISTANCE` and whose areas differ by at least 2x, drop
/// the smaller one.
fn dedup_candidates(mut candidates: Vec<EllipseCandidate>) -> Vec<EllipseCandidate> {
    let mut dropped = vec![false; candidates.len()];
    for i in 0..candidates.len() {
        if dropped[i] {
            continue;
        }
        for j in 0..candidates.len() {
            if i == j || dropped[j] {
                continue;
            }
            let dx = candidates[i].center.0 - candidates[j].center.0;
            let dy = candidates[i].center.1 - candidates[j].center.1;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist < ELLIPSE_DEDUP_DISTANCE && 2.0 * candidates[i].area > candidates[j].area {
                dropped[i] = true;
                break;
            }
        }
    }
    candidates = candidates
        .into_iter()
        .zip(dropped)
        .filter(|(_, d)| !d)
        .map(|(c, _)| c)
        .collect();
    candidates
}
