//! Drawing a bitmap through an affine transform.
//!
//! Uses inverse mapping: for each destination pixel we compute where it
//! lands in the source bitmap and resample there. Samples outside the
//! source are transparent, so edges fade instead of smearing.
//!
//! Interpolation happens on premultiplied values to keep transparent
//! neighbours from darkening the edge colour.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::geometry::{Affine, Point, Rect};

/// Resampling filter for transformed draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationFilter {
    /// Nearest neighbour. Exact for unscaled, axis-aligned draws.
    Nearest,
    /// Bilinear interpolation - fast, good for interactive previews.
    #[default]
    Bilinear,
    /// Lanczos3 interpolation - sharper, good for export.
    Lanczos3,
}

/// Draw `src` onto `dst` (source-over) through `transform`.
///
/// `transform` maps source pixel coordinates (origin at the top-left corner
/// of the bitmap) to destination pixel coordinates. Singular transforms draw
/// nothing.
pub fn draw_transformed(
    dst: &mut RgbaImage,
    src: &RgbaImage,
    transform: &Affine,
    filter: InterpolationFilter,
) {
    let Some(inverse) = transform.invert() else {
        return;
    };
    if src.width() == 0 || src.height() == 0 {
        return;
    }

    let Some((x0, y0, x1, y1)) = destination_span(dst, src, transform) else {
        return;
    };

    for dy in y0..y1 {
        for dx in x0..x1 {
            let s = inverse.apply(Point::new(dx as f64 + 0.5, dy as f64 + 0.5));
            // Pixel centres sit at +0.5; shift into index space.
            let (sx, sy) = (s.x - 0.5, s.y - 0.5);
            let sample = match filter {
                InterpolationFilter::Nearest => sample_nearest(src, s.x, s.y),
                InterpolationFilter::Bilinear => sample_bilinear(src, sx, sy),
                InterpolationFilter::Lanczos3 => sample_lanczos3(src, sx, sy),
            };
            if sample[3] <= 0.0 {
                continue;
            }
            let px = dst.get_pixel_mut(dx, dy);
            *px = composite_over(sample, *px);
        }
    }
}

/// Destination pixel range covered by the transformed source, clipped to `dst`.
fn destination_span(
    dst: &RgbaImage,
    src: &RgbaImage,
    transform: &Affine,
) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = (src.width() as f64, src.height() as f64);
    let corners = [
        transform.apply(Point::new(0.0, 0.0)),
        transform.apply(Point::new(w, 0.0)),
        transform.apply(Point::new(0.0, h)),
        transform.apply(Point::new(w, h)),
    ];
    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    if !(min_x.is_finite() && max_x.is_finite() && min_y.is_finite() && max_y.is_finite()) {
        return None;
    }

    // One pixel of slack for the filter footprint.
    let x0 = (min_x.floor() - 1.0).max(0.0) as u32;
    let y0 = (min_y.floor() - 1.0).max(0.0) as u32;
    let x1 = ((max_x.ceil() + 1.0).max(0.0) as u32).min(dst.width());
    let y1 = ((max_y.ceil() + 1.0).max(0.0) as u32).min(dst.height());
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((x0, y0, x1, y1))
}

/// Premultiplied RGBA as f64, alpha in 0..=1 and colour in 0..=255.
type Premul = [f64; 4];

#[inline]
fn premul_at(image: &RgbaImage, x: i64, y: i64) -> Premul {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return [0.0; 4];
    }
    let p = image.get_pixel(x as u32, y as u32).0;
    let a = p[3] as f64 / 255.0;
    [p[0] as f64 * a, p[1] as f64 * a, p[2] as f64 * a, a]
}

fn sample_nearest(image: &RgbaImage, x: f64, y: f64) -> Premul {
    premul_at(image, x.floor() as i64, y.floor() as i64)
}

/// Bilinear interpolation over the 4 nearest pixels.
fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> Premul {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = premul_at(image, x0, y0);
    let p10 = premul_at(image, x0 + 1, y0);
    let p01 = premul_at(image, x0, y0 + 1);
    let p11 = premul_at(image, x0 + 1, y0 + 1);

    let mut out = [0.0; 4];
    for i in 0..4 {
        out[i] = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
    }
    out
}

/// Lanczos3 interpolation over a 6x6 neighbourhood.
///
/// Falls back to bilinear near the edges where the kernel would mostly read
/// transparent padding.
fn sample_lanczos3(image: &RgbaImage, x: f64, y: f64) -> Premul {
    let (w, h) = (image.width() as i64, image.height() as i64);
    if x < 2.0 || x >= (w - 3) as f64 || y < 2.0 || y >= (h - 3) as f64 {
        return sample_bilinear(image, x, y);
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut sum = [0.0f64; 4];
    let mut weight_sum = 0.0;
    for ky in -2..=3 {
        for kx in -2..=3 {
            let px = x0 + kx;
            let py = y0 + ky;
            let weight = lanczos_weight(x - px as f64, 3.0) * lanczos_weight(y - py as f64, 3.0);
            let p = premul_at(image, px, py);
            for i in 0..4 {
                sum[i] += p[i] * weight;
            }
            weight_sum += weight;
        }
    }

    if weight_sum.abs() < f64::EPSILON {
        return [0.0; 4];
    }
    let mut out = [0.0; 4];
    for i in 0..4 {
        out[i] = sum[i] / weight_sum;
    }
    // Ringing can overshoot; keep premultiplied colour within alpha.
    out[3] = out[3].clamp(0.0, 1.0);
    for i in 0..3 {
        out[i] = out[i].clamp(0.0, 255.0 * out[3]);
    }
    out
}

/// Lanczos kernel: `sinc(x) * sinc(x / a)` for `|x| < a`, zero outside.
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }
    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;
    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}

/// Source-over compositing of a premultiplied sample onto a straight pixel.
fn composite_over(src: Premul, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3].clamp(0.0, 1.0);
    let da = dst.0[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for i in 0..3 {
        let premul = src[i] + dst.0[i] as f64 * da * (1.0 - sa);
        out[i] = (premul / out_a).clamp(0.0, 255.0).round() as u8;
    }
    out[3] = (out_a * 255.0).clamp(0.0, 255.0).round() as u8;
    Rgba(out)
}

/// Darken every pixel outside `window` by `amount` (0 = untouched, 1 = black).
///
/// Transparent pixels gain an opaque dark veil so the masked area is visible
/// on an empty canvas too.
pub fn dim_outside(image: &mut RgbaImage, window: &Rect, amount: f64) {
    let amount = amount.clamp(0.0, 1.0);
    let veil = Rgba([0, 0, 0, (amount * 255.0).round() as u8]);
    for (x, y, px) in image.enumerate_pixels_mut() {
        let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
        if window.contains_point(center) {
            continue;
        }
        let sample = [0.0, 0.0, 0.0, veil.0[3] as f64 / 255.0];
        *px = composite_over(sample, *px);
    }
}
