//! Polar payload grid: 280 canonical data points across five rings,
//! sampled through the solved homography into the 35-byte payload.

use crate::constants::*;
use crate::geometry::{Homography, Point};
use image::GrayImage;
use std::f64::consts::PI;

/// Canonical-plane positions of all 280 data-ring points, in the exact
/// order their bits are packed into the payload (ring 1 first, point 0
/// of each ring first).
pub fn canonical_data_points() -> Vec<Point> {
    let mut points = Vec::with_capacity(TOTAL_DATA_POINTS);
    for (ring_idx, &n) in RING_POINT_COUNTS.iter().enumerate() {
        let r = ring_idx + 1;
        let radius = ring_radius(r);
        for k in 0..n {
            let angle = (k as f64) * (PI / n as f64) * 2.0 - PI / 2.0;
            points.push(Point::new(
                CENTER + radius * angle.cos(),
                CENTER + radius * angle.sin(),
            ));
        }
    }
    points
}

/// Maps each canonical data point through `homography` into `mask`'s pixel
/// space, reads the pixel at `(floor(x), floor(y))`, and sets the bit
/// whenever that pixel is nonzero, LSB-first within each byte. `mask` must
/// be whichever of `whitish`/`blackish` the finder-ring match actually
/// succeeded against, so a "set" bit always means "ink present in the mask
/// the orientation ring was found in" rather than a re-guessed threshold.
/// Points that land outside `mask` read as unset.
pub fn sample_payload(homography: &Homography, mask: &GrayImage) -> [u8; PAYLOAD_BYTES] {
    let (w, h) = mask.dimensions();
    let points = canonical_data_points();
    let mut payload = [0u8; PAYLOAD_BYTES];
    for (j, &p) in points.iter().enumerate() {
        let image_pt = homography.apply(p);
        let (x, y) = (image_pt.x.floor(), image_pt.y.floor());
        if x < 0.0 || y < 0.0 || x >= w as f64 || y >= h as f64 {
            continue;
        }
        if mask.get_pixel(x as u32, y as u32).0[0] != 0 {
            payload[j / 8] |= 1 << (j % 8);
        }
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_points_count_matches_payload_bits() {
        assert_eq!(canonical_data_points().len(), TOTAL_DATA_POINTS);
        assert_eq!(TOTAL_DATA_POINTS, PAYLOAD_BYTES * 8);
    }
}
