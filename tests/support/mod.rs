//! Independent reference encoder for round-code test images. Deliberately
//! does not call into `roundcode`'s internals: it re-derives the wire
//! geometry from the same constants the scanner is built against, so
//! these tests exercise the real decode path rather than a tautology.

use image::{GrayImage, Luma};
use std::f64::consts::{PI, TAU};

const FINDER_BYTES: [u8; 4] = [0xB2, 0xCB, 0x25, 0xC6];
const MODIFIER: f64 = 42.0;
const CENTER: f64 = 195.0;
const FINDER_RING_MULTIPLIER: f64 = 2.025;
const ANGLE_QUANTUM: f64 = PI / 16.0;
const RING_POINT_COUNTS: [usize; 5] = [40, 48, 56, 64, 72];

fn bit(i: usize) -> u8 {
    (FINDER_BYTES[i / 8] >> (i % 8)) & 1
}

fn finder_run_centroids() -> Vec<f64> {
    let mut runs = Vec::new();
    let mut start = None;
    for i in 0..32 {
        if bit(i) == 1 {
            start.get_or_insert(i);
        } else if let Some(s) = start.take() {
            runs.push((s, i - 1));
        }
    }
    if let Some(s) = start {
        runs.push((s, 31));
    }
    runs.into_iter().map(|(s, e)| (s + e) as f64 / 2.0).collect()
}

/// The nine canonical finder points in object space.
pub fn finder_object_points() -> Vec<(f64, f64)> {
    let centroids = finder_run_centroids();
    assert_eq!(centroids.len(), 9);
    let radius = MODIFIER * FINDER_RING_MULTIPLIER;
    let mut angle = centroids[0] * ANGLE_QUANTUM - PI / 2.0;
    let mut points = Vec::with_capacity(9);
    for i in 0..9 {
        points.push((CENTER + radius * angle.cos(), CENTER + radius * angle.sin()));
        if i + 1 < centroids.len() {
            angle += (centroids[i + 1] - centroids[i]) * ANGLE_QUANTUM;
        }
    }
    points
}

fn ring_radius(r: usize) -> f64 {
    MODIFIER * ((r as f64 + 1.0) * 0.4 + 1.8)
}

/// All 280 canonical data points, in payload-bit order.
pub fn data_object_points() -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(280);
    for (ring_idx, &n) in RING_POINT_COUNTS.iter().enumerate() {
        let r = ring_idx + 1;
        let radius = ring_radius(r);
        for k in 0..n {
            let angle = (k as f64) * (PI / n as f64) * 2.0 - PI / 2.0;
            points.push((CENTER + radius * angle.cos(), CENTER + radius * angle.sin()));
        }
    }
    points
}

/// Maps an object-space point through a pure similarity transform
/// (uniform scale + translation, no rotation) into image space.
fn to_image(p: (f64, f64), scale: f64, offset: (f64, f64)) -> (f64, f64) {
    (offset.0 + scale * p.0, offset.1 + scale * p.1)
}

fn fill_disk(img: &mut GrayImage, center: (f64, f64), radius: f64, value: u8) {
    let (w, h) = img.dimensions();
    let x0 = (center.0 - radius).floor().max(0.0) as u32;
    let x1 = (center.0 + radius).ceil().min(w as f64 - 1.0) as u32;
    let y0 = (center.1 - radius).floor().max(0.0) as u32;
    let y1 = (center.1 + radius).ceil().min(h as f64 - 1.0) as u32;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f64 - center.0;
            let dy = y as f64 - center.1;
            if dx * dx + dy * dy <= radius * radius {
                img.put_pixel(x, y, Luma([value]));
            }
        }
    }
}

/// Radius multiplier (of `MODIFIER`) for the small central orientation
/// disk that the scanner's ellipse pass actually fits. Chosen so the
/// disk's finder-ring annulus (`1.227..1.525x` its shrunk axes) contains
/// the finder ring at `FINDER_RING_MULTIPLIER * MODIFIER` with margin on
/// both sides, at both full resolution and after a 2x quality downscale.
const CENTRAL_DISK_RADIUS_MULTIPLIER: f64 = 1.6;

/// Renders a synthetic round code: a small central orientation disk, a
/// separate ring of nine (always-set) finder ink dots, and data ink dots
/// at every position whose payload bit is 1 — all as light (255) marks on
/// a dark (30) background, matching the scanner's "whitish" foreground
/// convention. The disk and the ink rings are independent shapes, not a
/// single disk with holes punched into it: a real code's finder/data
/// marks sit well outside the small center disk, in the annulus the
/// scanner searches after fitting it. `dot_radius_base` is in
/// object-plane units (before `scale`).
pub fn render_code(
    payload: &[u8; 35],
    canvas: u32,
    scale: f64,
    offset: (f64, f64),
    dot_radius_base: f64,
) -> GrayImage {
    let mut img = GrayImage::from_pixel(canvas, canvas, Luma([30]));

    let disk_radius = MODIFIER * CENTRAL_DISK_RADIUS_MULTIPLIER * scale;
    fill_disk(
        &mut img,
        to_image((CENTER, CENTER), scale, offset),
        disk_radius,
        255,
    );

    let dot_radius = (dot_radius_base * scale).max(1.0);
    for p in finder_object_points() {
        fill_disk(&mut img, to_image(p, scale, offset), dot_radius, 255);
    }

    for (j, p) in data_object_points().into_iter().enumerate() {
        let bit_set = (payload[j / 8] >> (j % 8)) & 1 == 1;
        if bit_set {
            fill_disk(&mut img, to_image(p, scale, offset), dot_radius, 255);
        }
    }

    img
}

/// Initializes `env_logger` once per test binary so `RUST_LOG=debug`
/// surfaces per-candidate rejection reasons from the scanner; safe to
/// call from every test since repeat calls after the first are no-ops.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// A payload with a recognizable, non-trivial, ~50%-density bit pattern
/// for round-trip tests.
pub fn sample_payload() -> [u8; 35] {
    let mut payload = [0u8; 35];
    for (i, b) in payload.iter_mut().enumerate() {
        *b = (i as u8).wrapping_mul(37).wrapping_add(11);
    }
    payload
}

/// All-zero payload: only the nine (always-set) finder dots are inked.
pub fn sparse_payload() -> [u8; 35] {
    [0u8; 35]
}

/// All-one payload: every data position is inked.
pub fn dense_payload() -> [u8; 35] {
    [0xFFu8; 35]
}

#[allow(dead_code)]
pub fn angle_gap_sum_is_full_circle() -> f64 {
    let points = finder_object_points();
    let center = (CENTER, CENTER);
    let mut angles: Vec<f64> = points
        .iter()
        .map(|p| (p.1 - center.1).atan2(p.0 - center.0).rem_euclid(TAU))
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
    total
}
