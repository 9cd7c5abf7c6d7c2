//! Finder-ring template and annulus-based orientation matching.
//!
//! The 32-bit finder sequence, scanned LSB-first within each byte of
//! [`FINDER_BYTES`], breaks into exactly nine runs of consecutive set
//! bits. Each run's bit-index centroid becomes one point on the finder
//! ring; the eight angular gaps between consecutive centroids are the
//! template this module matches detected blobs against.

use crate::constants::*;
use crate::contour::find_contours;
use crate::ellipse::{EllipseCandidate, Polarity};
use crate::geometry::Point;
use crate::raster::{and_masks, rasterize_ellipse};
use image::GrayImage;
use std::f64::consts::{PI, TAU};

fn bit(i: usize) -> u8 {
    (FINDER_BYTES[i / 8] >> (i % 8)) & 1
}

/// Start/end bit indices (inclusive) of each run of consecutive set bits
/// in the 32-bit finder sequence, in scan order. No wraparound: bit 0 and
/// bit 31 are both 0 for `FINDER_BYTES`, so runs never span the seam.
fn finder_runs() -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for i in 0..32 {
        if bit(i) == 1 {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            runs.push((s, i - 1));
        }
    }
    if let Some(s) = start {
        runs.push((s, 31));
    }
    runs
}

/// The nine canonical finder-ring angles (radians, image convention where
/// 0 points along +x and angle grows clockwise when y grows downward) and
/// the eight angular gaps between them, derived once from [`FINDER_BYTES`].
#[derive(Debug, Clone)]
pub struct FinderTemplate {
    pub deltas: [f64; FINDER_POINT_COUNT - 1],
}

impl FinderTemplate {
    pub fn new() -> Self {
        let runs = finder_runs();
        debug_assert_eq!(runs.len(), FINDER_POINT_COUNT);
        let centroids: Vec<f64> = runs.iter().map(|&(s, e)| (s + e) as f64 / 2.0).collect();
        let mut deltas = [0.0; FINDER_POINT_COUNT - 1];
        for j in 0..FINDER_POINT_COUNT - 1 {
            deltas[j] = (centroids[j + 1] - centroids[j]) * ANGLE_QUANTUM;
        }
        FinderTemplate { deltas }
    }

    /// Canonical-plane positions of the nine finder points, index 0 at
    /// bit-offset 0.
    pub fn object_points(&self) -> [Point; FINDER_POINT_COUNT] {
        let runs = finder_runs();
        let first_centroid = (runs[0].0 + runs[0].1) as f64 / 2.0;
        let radius = MODIFIER * FINDER_RING_MULTIPLIER;
        let mut angle = first_centroid * ANGLE_QUANTUM - PI / 2.0;
        let mut points = [Point::origin(); FINDER_POINT_COUNT];
        for j in 0..FINDER_POINT_COUNT {
            points[j] = Point::new(CENTER + radius * angle.cos(), CENTER + radius * angle.sin());
            if j < self.deltas.len() {
                angle += self.deltas[j];
            }
        }
        points
    }
}

impl Default for FinderTemplate {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts and angularly matches blobs on the finder-ring annulus around
/// `candidate`, returning the nine matched image-space points already
/// rotated so index 0 is bit-offset 0 — the caller needs no separate
/// rotational-offset value.
pub fn extract_finder_points(
    candidate: &EllipseCandidate,
    whitish: &GrayImage,
    blackish: Option<&GrayImage>,
    template: &FinderTemplate,
) -> Option<(Polarity, [Point; FINDER_POINT_COUNT])> {
    let (w, h) = whitish.dimensions();
    let (sa, sb) = candidate.shrunk_axes();
    let outer = rasterize_ellipse(
        w,
        h,
        candidate.center,
        (sa * FINDER_ANNULUS_OUTER_MULT, sb * FINDER_ANNULUS_OUTER_MULT),
        candidate.angle,
    );
    let inner = rasterize_ellipse(
        w,
        h,
        candidate.center,
        (sa * FINDER_ANNULUS_INNER_MULT, sb * FINDER_ANNULUS_INNER_MULT),
        candidate.angle,
    );
    let mut annulus = outer;
    for y in 0..h {
        for x in 0..w {
            if inner.get_pixel(x, y).0[0] > 0 {
                annulus.put_pixel(x, y, image::Luma([0]));
            }
        }
    }

    // The ring's ink polarity relative to the fixed threshold isn't known
    // up front (it depends on how dense the code's bit pattern happens to
    // be locally, not just on the disk's own overall polarity), so try
    // the direct ("whitish") mask first and fall back to the adaptive
    // ("blackish") one.
    if let Some(points) = match_against_mask(&annulus, whitish, candidate, template) {
        return Some((Polarity::Normal, points));
    }
    if let Some(blackish) = blackish {
        if let Some(points) = match_against_mask(&annulus, blackish, candidate, template) {
            return Some((Polarity::Inverted, points));
        }
    }
    None
}

fn match_against_mask(
    annulus: &GrayImage,
    polarity_mask: &GrayImage,
    candidate: &EllipseCandidate,
    template: &FinderTemplate,
) -> Option<[Point; FINDER_POINT_COUNT]> {
    let search = and_masks(annulus, polarity_mask);

    let mut blobs = find_contours(&search);
    if blobs.len() < FINDER_POINT_COUNT {
        return None;
    }

    // Prune small noise blobs: keep anything at least p90/5 the size of
    // the largest decile.
    blobs.sort_by(|a, b| b.area().partial_cmp(&a.area()).unwrap());
    let p90_idx = ((blobs.len() as f64) * 0.9) as usize;
    let p90_size = blobs.get(p90_idx.min(blobs.len() - 1)).map(|c| c.area()).unwrap_or(0.0);
    let min_size = p90_size / FINDER_SIZE_PRUNE_DIVISOR;
    blobs.retain(|c| c.area() >= min_size);

    // Sort by angle around the candidate center, then sequentially dedup
    // centroids closer than FINDER_CENTROID_DEDUP_DIST to the previous one.
    let mut by_angle: Vec<(f64, Point)> = blobs
        .iter()
        .map(|c| {
            let (cx, cy) = c.centroid();
            let angle = (cy - candidate.center.1).atan2(cx - candidate.center.0);
            (angle.rem_euclid(TAU), Point::new(cx, cy))
        })
        .collect();
    by_angle.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let mut points: Vec<Point> = Vec::with_capacity(by_angle.len());
    for &(_, p) in &by_angle {
        if let Some(&last) = points.last() {
            let d = ((p.x - last.x).powi(2) + (p.y - last.y).powi(2)).sqrt();
            if d < FINDER_CENTROID_DEDUP_DIST {
                continue;
            }
        }
        points.push(p);
    }
    // Must yield exactly nine finder points; anything else is rejected
    // outright rather than guessed at with a sliding window.
    if points.len() != FINDER_POINT_COUNT {
        return None;
    }

    let n = points.len();
    let angle_of = |p: Point| (p.y - candidate.center.1).atan2(p.x - candidate.center.0);

    for start in 0..n {
        let subset: Vec<Point> = (0..FINDER_POINT_COUNT)
            .map(|k| points[(start + k) % n])
            .collect();
        let mut ok = true;
        for j in 0..FINDER_POINT_COUNT - 1 {
            let a0 = angle_of(subset[j]);
            let a1 = angle_of(subset[j + 1]);
            let mut delta = a1 - a0;
            if delta < 0.0 {
                delta += TAU;
            }
            if (delta - template.deltas[j]).abs() > FINDER_ANGLE_TOLERANCE {
                ok = false;
                break;
            }
        }
        if ok {
            let mut out = [Point::origin(); FINDER_POINT_COUNT];
            out.copy_from_slice(&subset);
            return Some(out);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nine_runs_in_finder_bytes() {
        assert_eq!(finder_runs().len(), FINDER_POINT_COUNT);
    }

    #[test]
    fn deltas_plus_closing_gap_span_full_circle() {
        let template = FinderTemplate::new();
        let object_points = template.object_points();
        let center = Point::new(CENTER, CENTER);
        let mut angles: Vec<f64> = object_points
            .iter()
            .map(|p| (p.y - center.y).atan2(p.x - center.x).rem_euclid(TAU))
            .collect();
        angles.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mut total = 0.0;
        for i in 0..angles.len() {
            let next = angles[(i + 1) % angles.len()];
            let mut gap = next - angles[i];
            if gap < 0.0 {
                gap += TAU;
            }
            total += gap;
        }
        assert!((total - TAU).abs() < 1e-6);
    }
}
