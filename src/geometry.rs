//! Planar point/homography algebra shared by the solver and sampler.

use nalgebra::{DMatrix, Matrix3};

pub type Point = nalgebra::Point2<f64>;

/// A 3x3 projective transform between the canonical code plane and a
/// working image (or its inverse).
#[derive(Debug, Clone, Copy)]
pub struct Homography(pub Matrix3<f64>);

impl Homography {
    pub fn identity() -> Self {
        Homography(Matrix3::identity())
    }

    /// Maps a point through this transform (homogeneous divide by `w`).
    pub fn apply(&self, p: Point) -> Point {
        let v = self.0 * nalgebra::Vector3::new(p.x, p.y, 1.0);
        Point::new(v.x / v.z, v.y / v.z)
    }

    pub fn inverse(&self) -> Option<Homography> {
        self.0.try_inverse().map(Homography)
    }

    /// Row-major 3x3, as the public [`crate::ScanResult`] exposes it.
    pub fn to_row_major(&self) -> [f64; 9] {
        let m = &self.0;
        [
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 0)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 0)],
            m[(2, 1)],
            m[(2, 2)],
        ]
    }
}

/// Normalized Direct Linear Transform: fits a homography mapping `src` to
/// `dst` (both arrays, same length, >= 4 points) by minimizing algebraic
/// reprojection error via SVD. Returns `None` if the system is degenerate.
pub fn fit_homography_dlt(src: &[Point], dst: &[Point]) -> Option<Homography> {
    if src.len() < 4 || src.len() != dst.len() {
        return None;
    }

    let (src_n, t_src) = normalize_points(src)?;
    let (dst_n, t_dst) = normalize_points(dst)?;

    let n = src_n.len();
    let mut rows = Vec::with_capacity(2 * n * 9);
    for i in 0..n {
        let (x, y) = (src_n[i].x, src_n[i].y);
        let (u, v) = (dst_n[i].x, dst_n[i].y);
        rows.extend_from_slice(&[-x, -y, -1.0, 0.0, 0.0, 0.0, u * x, u * y, u]);
        rows.extend_from_slice(&[0.0, 0.0, 0.0, -x, -y, -1.0, v * x, v * y, v]);
    }
    let a = DMatrix::from_row_slice(2 * n, 9, &rows);

    let svd = a.svd(false, true);
    let v_t = svd.v_t?;
    let singular_values = svd.singular_values;
    let (min_idx, _) = singular_values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())?;
    let h = v_t.row(min_idx);
    let h_norm = Matrix3::new(
        h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8],
    );

    let t_dst_inv = t_dst.try_inverse()?;
    let h_denorm = t_dst_inv * h_norm * t_src;
    Some(Homography(h_denorm))
}

/// Hartley normalization: translate centroid to origin, scale so the mean
/// distance to the origin is sqrt(2). Returns the normalized points and
/// the similarity transform used, so callers can denormalize afterwards.
fn normalize_points(pts: &[Point]) -> Option<(Vec<Point>, Matrix3<f64>)> {
    let n = pts.len() as f64;
    let centroid = pts.iter().fold(Point::origin(), |acc, p| {
        Point::new(acc.x + p.x / n, acc.y + p.y / n)
    });
    let mean_dist: f64 = pts
        .iter()
        .map(|p| ((p.x - centroid.x).powi(2) + (p.y - centroid.y).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    if mean_dist < 1e-9 {
        return None;
    }
    let scale = std::f64::consts::SQRT_2 / mean_dist;
    let t = Matrix3::new(
        scale, 0.0, -scale * centroid.x,
        0.0, scale, -scale * centroid.y,
        0.0, 0.0, 1.0,
    );
    let normalized = pts
        .iter()
        .map(|p| Point::new(scale * (p.x - centroid.x), scale * (p.y - centroid.y)))
        .collect();
    Some((normalized, t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dlt_recovers_known_homography() {
        let h = Matrix3::new(1.2, 0.1, 30.0, -0.05, 0.9, 15.0, 0.0003, -0.0002, 1.0);
        let hg = Homography(h);
        let src = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
            Point::new(50.0, 50.0),
        ];
        let dst: Vec<Point> = src.iter().map(|p| hg.apply(*p)).collect();
        let fitted = fit_homography_dlt(&src, &dst).unwrap();
        for p in src {
            let expected = hg.apply(p);
            let got = fitted.apply(p);
            assert!((expected.x - got.x).abs() < 1e-6);
            assert!((expected.y - got.y).abs() < 1e-6);
        }
    }

    #[test]
    fn inverse_round_trips() {
        let hg = Homography(Matrix3::new(
            1.0, 0.0, 10.0, 0.0, 1.0, 20.0, 0.0001, 0.0002, 1.0,
        ));
        let inv = hg.inverse().unwrap();
        let p = Point::new(5.0, 7.0);
        let round_tripped = inv.apply(hg.apply(p));
        assert!((round_tripped.x - p.x).abs() < 1e-6);
        assert!((round_tripped.y - p.y).abs() < 1e-6);
    }
}
