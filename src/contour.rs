//! Connected-component labeling, boundary tracing and shape moments over
//! a binary mask. Stands in for OpenCV's `findContours`/`moments`/
//! `convexHull` triad.

use image::GrayImage;

/// One connected blob: its full pixel membership (for moments) and its
/// traced outer boundary (for perimeter/shape metrics).
#[derive(Debug, Clone)]
pub struct Contour {
    pub pixels: Vec<(u32, u32)>,
    pub boundary: Vec<(i32, i32)>,
}

impl Contour {
    pub fn area(&self) -> f64 {
        self.pixels.len() as f64
    }

    pub fn perimeter(&self) -> f64 {
        if self.boundary.len() < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        for i in 0..self.boundary.len() {
            let a = self.boundary[i];
            let b = self.boundary[(i + 1) % self.boundary.len()];
            let dx = (a.0 - b.0) as f64;
            let dy = (a.1 - b.1) as f64;
            total += (dx * dx + dy * dy).sqrt();
        }
        total
    }

    /// Raw moments (m00, m10, m01, m11, m20, m02), summed over member
    /// pixels.
    pub fn raw_moments(&self) -> [f64; 6] {
        let mut m = [0.0; 6];
        for &(x, y) in &self.pixels {
            let (x, y) = (x as f64, y as f64);
            m[0] += 1.0;
            m[1] += x;
            m[2] += y;
            m[3] += x * y;
            m[4] += x * x;
            m[5] += y * y;
        }
        m
    }

    pub fn centroid(&self) -> (f64, f64) {
        let m = self.raw_moments();
        if m[0] == 0.0 {
            return (0.0, 0.0);
        }
        (m[1] / m[0], m[2] / m[0])
    }

    /// Central moments (mu20, mu11, mu02).
    pub fn central_moments(&self) -> (f64, f64, f64) {
        let m = self.raw_moments();
        let (cx, cy) = self.centroid();
        let mu20 = m[4] / m[0] - cx * cx;
        let mu02 = m[5] / m[0] - cy * cy;
        let mu11 = m[3] / m[0] - cx * cy;
        (mu20, mu11, mu02)
    }

    /// Convex hull area via the monotone-chain hull over the boundary
    /// points, shoelace formula.
    pub fn hull_area(&self) -> f64 {
        let hull = convex_hull(&self.boundary);
        polygon_area(&hull)
    }
}

/// Labels all 8-connected foreground (>0) components in `mask` and traces
/// each one's outer boundary.
pub fn find_contours(mask: &GrayImage) -> Vec<Contour> {
    let (w, h) = mask.dimensions();
    let mut visited = vec![false; (w * h) as usize];
    let idx = |x: u32, y: u32| (y * w + x) as usize;
    let fg = |x: i32, y: i32| -> bool {
        x >= 0
            && y >= 0
            && (x as u32) < w
            && (y as u32) < h
            && mask.get_pixel(x as u32, y as u32).0[0] > 0
    };

    let mut contours = Vec::new();
    for sy in 0..h {
        for sx in 0..w {
            if visited[idx(sx, sy)] || !fg(sx as i32, sy as i32) {
                continue;
            }
            // flood fill to collect membership
            let mut pixels = Vec::new();
            let mut stack = vec![(sx, sy)];
            visited[idx(sx, sy)] = true;
            while let Some((x, y)) = stack.pop() {
                pixels.push((x, y));
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                        if fg(nx, ny) {
                            let (nx, ny) = (nx as u32, ny as u32);
                            if !visited[idx(nx, ny)] {
                                visited[idx(nx, ny)] = true;
                                stack.push((nx, ny));
                            }
                        }
                    }
                }
            }
            let boundary = trace_boundary(&fg, sx as i32, sy as i32);
            contours.push(Contour { pixels, boundary });
        }
    }
    contours
}

/// Moore-neighbor boundary trace starting at `(sx, sy)`, the
/// topmost/leftmost pixel of its component (found by the raster scan in
/// `find_contours`, so the pixel directly to its left is guaranteed
/// background).
fn trace_boundary(fg: &impl Fn(i32, i32) -> bool, sx: i32, sy: i32) -> Vec<(i32, i32)> {
    // Clockwise 8-neighborhood starting from "west".
    const DIRS: [(i32, i32); 8] = [
        (-1, 0),
        (-1, -1),
        (0, -1),
        (1, -1),
        (1, 0),
        (1, 1),
        (0, 1),
        (-1, 1),
    ];

    if !fg(sx, sy) {
        return Vec::new();
    }

    // Degenerate single-isolated-pixel component.
    let has_any_neighbor = DIRS.iter().any(|&(dx, dy)| fg(sx + dx, sy + dy));
    if !has_any_neighbor {
        return vec![(sx, sy)];
    }

    let mut boundary = vec![(sx, sy)];
    let mut current = (sx, sy);
    let mut backtrack_dir = 0usize; // came from "west" (background)
    let max_steps = 100_000;

    for _ in 0..max_steps {
        let start_dir = (backtrack_dir + 1) % 8;
        let mut found = None;
        for k in 0..8 {
            let d = (start_dir + k) % 8;
            let (dx, dy) = DIRS[d];
            let cand = (current.0 + dx, current.1 + dy);
            if fg(cand.0, cand.1) {
                found = Some((cand, d));
                break;
            }
        }
        let Some((next, found_dir)) = found else {
            break;
        };
        backtrack_dir = (found_dir + 4) % 8;
        current = next;
        if current == (sx, sy) {
            break;
        }
        boundary.push(current);
        if boundary.len() > max_steps {
            break;
        }
    }
    boundary
}

/// Andrew's monotone chain convex hull.
pub fn convex_hull(points: &[(i32, i32)]) -> Vec<(i32, i32)> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut pts = points.to_vec();
    pts.sort_unstable();
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let cross = |o: (i32, i32), a: (i32, i32), b: (i32, i32)| -> i64 {
        (a.0 - o.0) as i64 * (b.1 - o.1) as i64 - (a.1 - o.1) as i64 * (b.0 - o.0) as i64
    };

    let mut lower = Vec::new();
    for &p in &pts {
        while lower.len() >= 2
            && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0
        {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper = Vec::new();
    for &p in pts.iter().rev() {
        while upper.len() >= 2
            && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0
        {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn polygon_area(poly: &[(i32, i32)]) -> f64 {
    if poly.len() < 3 {
        return 0.0;
    }
    let mut sum = 0i64;
    for i in 0..poly.len() {
        let (x0, y0) = poly[i];
        let (x1, y1) = poly[(i + 1) % poly.len()];
        sum += x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64;
    }
    (sum as f64 / 2.0).abs()
}
