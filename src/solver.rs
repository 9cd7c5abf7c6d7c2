//! RANSAC-robust homography fit between the canonical finder-ring points
//! and their matched image-space detections.

use crate::constants::RANSAC_REPROJ_THRESHOLD;
use crate::geometry::{fit_homography_dlt, Homography, Point};
use rand::seq::SliceRandom;
use rand::Rng;

const RANSAC_ITERATIONS: usize = 64;
const MIN_SAMPLE: usize = 4;

/// Fits a homography mapping `object_pts` to `image_pts` (same length,
/// `>= 4`, matched index-for-index) by RANSAC over 4-point subsets,
/// refining with all inliers. Returns `None` if no 4-point subset yields
/// a usable model or inversion fails.
pub fn solve_homography(
    object_pts: &[Point],
    image_pts: &[Point],
    rng: &mut impl Rng,
) -> Option<Homography> {
    if object_pts.len() != image_pts.len() || object_pts.len() < MIN_SAMPLE {
        return None;
    }
    let n = object_pts.len();
    let indices: Vec<usize> = (0..n).collect();

    let mut best_inliers: Vec<usize> = Vec::new();
    let mut best_h: Option<Homography> = None;

    for _ in 0..RANSAC_ITERATIONS {
        let mut sample = indices.clone();
        sample.shuffle(rng);
        sample.truncate(MIN_SAMPLE);

        let src: Vec<Point> = sample.iter().map(|&i| object_pts[i]).collect();
        let dst: Vec<Point> = sample.iter().map(|&i| image_pts[i]).collect();
        let Some(h) = fit_homography_dlt(&src, &dst) else {
            continue;
        };

        let inliers: Vec<usize> = (0..n)
            .filter(|&i| {
                let projected = h.apply(object_pts[i]);
                let err = ((projected.x - image_pts[i].x).powi(2)
                    + (projected.y - image_pts[i].y).powi(2))
                .sqrt();
                err <= RANSAC_REPROJ_THRESHOLD
            })
            .collect();

        if inliers.len() > best_inliers.len() {
            best_inliers = inliers;
            best_h = Some(h);
        }
    }

    if best_inliers.len() < MIN_SAMPLE {
        return None;
    }

    let src: Vec<Point> = best_inliers.iter().map(|&i| object_pts[i]).collect();
    let dst: Vec<Point> = best_inliers.iter().map(|&i| image_pts[i]).collect();
    fit_homography_dlt(&src, &dst).or(best_h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    #[test]
    fn recovers_homography_from_exact_points() {
        let h = Homography(Matrix3::new(1.1, 0.0, 5.0, 0.0, 0.95, -3.0, 0.0001, -0.0001, 1.0));
        let object_pts = vec![
            Point::new(0.0, 0.0),
            Point::new(50.0, 0.0),
            Point::new(50.0, 50.0),
            Point::new(0.0, 50.0),
            Point::new(25.0, 25.0),
        ];
        let image_pts: Vec<Point> = object_pts.iter().map(|p| h.apply(*p)).collect();
        let mut rng = rand::thread_rng();
        let fitted = solve_homography(&object_pts, &image_pts, &mut rng).unwrap();
        for p in &object_pts {
            let expected = h.apply(*p);
            let got = fitted.apply(*p);
            assert!((expected.x - got.x).abs() < 1e-3);
            assert!((expected.y - got.y).abs() < 1e-3);
        }
    }
}
