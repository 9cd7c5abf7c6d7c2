//! Hand-rolled image primitives the pipeline needs that aren't exposed by
//! a ready-made crate with the exact semantics required (constant-offset
//! adaptive threshold, rotated-ellipse rasterization). Operates directly
//! on `image::GrayImage`.

use image::{GrayImage, Luma};

/// Box-filter downscale (area-averaging, matching `cv::INTER_AREA`).
pub fn downscale(src: &GrayImage, scale: f64) -> GrayImage {
    let (w, h) = src.dimensions();
    let new_w = ((w as f64) * scale).round().max(1.0) as u32;
    let new_h = ((h as f64) * scale).round().max(1.0) as u32;
    let mut out = GrayImage::new(new_w, new_h);

    for oy in 0..new_h {
        let sy0 = (oy as f64 / scale).floor() as u32;
        let sy1 = (((oy + 1) as f64) / scale).ceil().min(h as f64) as u32;
        for ox in 0..new_w {
            let sx0 = (ox as f64 / scale).floor() as u32;
            let sx1 = (((ox + 1) as f64) / scale).ceil().min(w as f64) as u32;
            let mut sum = 0u64;
            let mut count = 0u64;
            for sy in sy0..sy1.max(sy0 + 1).min(h) {
                for sx in sx0..sx1.max(sx0 + 1).min(w) {
                    sum += src.get_pixel(sx, sy).0[0] as u64;
                    count += 1;
                }
            }
            let avg = if count > 0 { (sum / count) as u8 } else { 0 };
            out.put_pixel(ox, oy, Luma([avg]));
        }
    }
    out
}

/// Separable Gaussian blur with the given sigma, reflecting at the border.
pub fn gaussian_blur(src: &GrayImage, sigma: f64) -> GrayImage {
    let radius = (sigma * 3.0).ceil().max(1.0) as i32;
    let mut kernel = Vec::with_capacity((2 * radius + 1) as usize);
    let mut sum = 0.0;
    for i in -radius..=radius {
        let v = (-((i * i) as f64) / (2.0 * sigma * sigma)).exp();
        kernel.push(v);
        sum += v;
    }
    for v in kernel.iter_mut() {
        *v /= sum;
    }

    let (w, h) = src.dimensions();
    let reflect = |v: i32, max: i32| -> i32 {
        if max <= 1 {
            return 0;
        }
        let period = 2 * (max - 1);
        let mut m = v.rem_euclid(period);
        if m >= max {
            m = period - m;
        }
        m
    };

    let mut horiz = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &weight) in kernel.iter().enumerate() {
                let dx = k as i32 - radius;
                let sx = reflect(x as i32 + dx, w as i32);
                acc += weight * src.get_pixel(sx as u32, y).0[0] as f64;
            }
            horiz.put_pixel(x, y, Luma([acc.round().clamp(0.0, 255.0) as u8]));
        }
    }

    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &weight) in kernel.iter().enumerate() {
                let dy = k as i32 - radius;
                let sy = reflect(y as i32 + dy, h as i32);
                acc += weight * horiz.get_pixel(x, sy as u32).0[0] as f64;
            }
            out.put_pixel(x, y, Luma([acc.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

/// `dst = 1.5*src - 0.5*blur(src, sigma=2)`, clamped to `[0, 255]`.
pub fn unsharp_mask(src: &GrayImage) -> GrayImage {
    let blurred = gaussian_blur(src, 2.0);
    let (w, h) = src.dimensions();
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let s = src.get_pixel(x, y).0[0] as f64;
            let b = blurred.get_pixel(x, y).0[0] as f64;
            let v = 1.5 * s - 0.5 * b;
            out.put_pixel(x, y, Luma([v.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

/// Fixed binary threshold: pixels `>= t` become 255 ("whitish"), else 0.
pub fn fixed_threshold(src: &GrayImage, t: u8) -> GrayImage {
    let (w, h) = src.dimensions();
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = if src.get_pixel(x, y).0[0] >= t { 255 } else { 0 };
            out.put_pixel(x, y, Luma([v]));
        }
    }
    out
}

/// Local mean-minus-C adaptive threshold (inverse: darker than the local
/// mean minus `c` becomes 255, i.e. "blackish"), computed via an integral
/// image so the block-mean lookup is O(1) per pixel.
pub fn adaptive_threshold_inv(src: &GrayImage, block: u32, c: i32) -> GrayImage {
    let (w, h) = src.dimensions();
    let radius = (block / 2) as i32;

    let mut integral = vec![0i64; ((w + 1) * (h + 1)) as usize];
    let stride = (w + 1) as usize;
    for y in 0..h {
        let mut row_sum = 0i64;
        for x in 0..w {
            row_sum += src.get_pixel(x, y).0[0] as i64;
            let above = integral[(y as usize) * stride + (x as usize + 1)];
            integral[(y as usize + 1) * stride + (x as usize + 1)] = above + row_sum;
        }
    }
    let sum_region = |x0: i32, y0: i32, x1: i32, y1: i32| -> i64 {
        let x0 = x0.clamp(0, w as i32) as usize;
        let y0 = y0.clamp(0, h as i32) as usize;
        let x1 = x1.clamp(0, w as i32) as usize;
        let y1 = y1.clamp(0, h as i32) as usize;
        integral[y1 * stride + x1] - integral[y0 * stride + x1] - integral[y1 * stride + x0]
            + integral[y0 * stride + x0]
    };

    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let x0 = x as i32 - radius;
            let y0 = y as i32 - radius;
            let x1 = x as i32 + radius + 1;
            let y1 = y as i32 + radius + 1;
            let area = ((x1.clamp(0, w as i32) - x0.clamp(0, w as i32)) as i64)
                * ((y1.clamp(0, h as i32) - y0.clamp(0, h as i32)) as i64);
            let mean = if area > 0 {
                sum_region(x0, y0, x1, y1) as f64 / area as f64
            } else {
                0.0
            };
            let v = src.get_pixel(x, y).0[0] as f64;
            let out_v = if v < mean - c as f64 { 255 } else { 0 };
            out.put_pixel(x, y, Luma([out_v]));
        }
    }
    out
}

/// Rasterizes a filled, possibly-rotated ellipse mask (255 inside, 0
/// outside) the size of `(w, h)`, for use as an annulus/disk test mask.
pub fn rasterize_ellipse(
    w: u32,
    h: u32,
    center: (f64, f64),
    semi_axes: (f64, f64),
    angle: f64,
) -> GrayImage {
    let mut out = GrayImage::new(w, h);
    let (cos_a, sin_a) = (angle.cos(), angle.sin());
    let (a, b) = semi_axes;
    if a <= 0.0 || b <= 0.0 {
        return out;
    }
    for y in 0..h {
        for x in 0..w {
            let dx = x as f64 - center.0;
            let dy = y as f64 - center.1;
            let u = dx * cos_a + dy * sin_a;
            let v = -dx * sin_a + dy * cos_a;
            if (u * u) / (a * a) + (v * v) / (b * b) <= 1.0 {
                out.put_pixel(x, y, Luma([255]));
            }
        }
    }
    out
}

/// Pixelwise AND of two binary (0/255) masks.
pub fn and_masks(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let (w, h) = a.dimensions();
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let va = a.get_pixel(x, y).0[0];
            let vb = b.get_pixel(x, y).0[0];
            out.put_pixel(x, y, Luma([if va > 0 && vb > 0 { 255 } else { 0 }]));
        }
    }
    out
}
