//! Canvas geometry: points, axis-aligned rectangles and 2D affine transforms.
//!
//! # Coordinate Systems
//!
//! - **Canvas space**: the fixed coordinate system of the editing surface,
//!   origin top-left, y pointing down.
//! - **Image-local space**: coordinates relative to the unscaled, unrotated
//!   source bitmap, origin top-left, range `[0, width] x [0, height]`.
//!
//! Bounds deliberately ignore rotation: the image's footprint is always the
//! unrotated, scaled box centred on the transform position.

use serde::{Deserialize, Serialize};

use crate::model::ImageTransform;

/// A point in canvas or image-local space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle, `(x, y)` being the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from its four edges.
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True when the rectangle has no area (or a negative one).
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// True when the two rectangles share a region of positive area.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// True when `other` lies inside `self`, allowing `eps` of slack per edge.
    pub fn contains_rect(&self, other: &Rect, eps: f64) -> bool {
        other.x >= self.x - eps
            && other.y >= self.y - eps
            && other.right() <= self.right() + eps
            && other.bottom() <= self.bottom() + eps
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// A 2D affine transform in canvas `setTransform(a, b, c, d, e, f)` order:
///
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translation(tx: f64, ty: f64) -> Self {
        Affine {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Affine {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Rotation by `degrees`; positive is clockwise on a y-down canvas.
    pub fn rotation(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Affine {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Compose so that `other` is applied first, then `self`.
    ///
    /// This mirrors how a 2D context accumulates `translate`/`rotate`/`scale`
    /// calls: `ctx.translate(..); ctx.rotate(..)` equals
    /// `translation.then(rotation)`.
    pub fn then(&self, other: &Affine) -> Affine {
        Affine {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform, or `None` when the matrix is singular (zero scale).
    pub fn invert(&self) -> Option<Affine> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Affine {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }
}

/// Canvas-space bounds of the transformed image. Rotation is ignored.
pub fn image_bounds(t: &ImageTransform) -> Rect {
    let width = t.width * t.scale_x;
    let height = t.height * t.scale_y;
    Rect::new(t.x - width / 2.0, t.y - height / 2.0, width, height)
}

/// Convert a canvas point to image-local coordinates, clamped to the bitmap.
pub fn stage_to_image_local(p: Point, t: &ImageTransform) -> Point {
    let bounds = image_bounds(t);
    let lx = if t.scale_x > 0.0 {
        (p.x - bounds.x) / t.scale_x
    } else {
        0.0
    };
    let ly = if t.scale_y > 0.0 {
        (p.y - bounds.y) / t.scale_y
    } else {
        0.0
    };
    Point::new(lx.clamp(0.0, t.width), ly.clamp(0.0, t.height))
}

/// Convert image-local coordinates back to canvas space (unclamped).
pub fn image_local_to_stage(p: Point, t: &ImageTransform) -> Point {
    let bounds = image_bounds(t);
    Point::new(bounds.x + p.x * t.scale_x, bounds.y + p.y * t.scale_y)
}

/// The full draw chain for the image: centre-translate, rotate, scale, then
/// shift so the bitmap's centre sits on the origin.
///
/// Maps image-local pixel coordinates to canvas space.
pub fn image_to_canvas(t: &ImageTransform) -> Affine {
    Affine::translation(t.x, t.y)
        .then(&Affine::rotation(t.rotation_deg))
        .then(&Affine::scaling(t.scale_x, t.scale_y))
        .then(&Affine::translation(-t.width / 2.0, -t.height / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform(x: f64, y: f64, scale: f64, width: f64, height: f64) -> ImageTransform {
        ImageTransform {
            x,
            y,
            scale_x: scale,
            scale_y: scale,
            rotation_deg: 0.0,
            width,
            height,
            aspect_ratio: width / height,
        }
    }

    #[test]
    fn test_image_bounds() {
        let t = transform(300.0, 200.0, 0.5, 800.0, 600.0);
        let b = image_bounds(&t);
        assert_eq!(b, Rect::new(100.0, 50.0, 400.0, 300.0));
        assert_eq!(b.right(), 500.0);
        assert_eq!(b.bottom(), 350.0);
    }

    #[test]
    fn test_bounds_ignore_rotation() {
        let mut t = transform(300.0, 200.0, 0.5, 800.0, 600.0);
        let before = image_bounds(&t);
        t.rotation_deg = 37.0;
        assert_eq!(image_bounds(&t), before);
    }

    #[test]
    fn test_stage_to_image_local_clamps() {
        let t = transform(300.0, 200.0, 0.5, 800.0, 600.0);
        let p = stage_to_image_local(Point::new(0.0, 1000.0), &t);
        assert_eq!(p, Point::new(0.0, 600.0));

        let p = stage_to_image_local(Point::new(300.0, 200.0), &t);
        assert_eq!(p, Point::new(400.0, 300.0));
    }

    #[test]
    fn test_image_local_to_stage_unclamped() {
        let t = transform(300.0, 200.0, 0.5, 800.0, 600.0);
        let p = image_local_to_stage(Point::new(-100.0, 700.0), &t);
        assert_eq!(p, Point::new(50.0, 400.0));
    }

    #[test]
    fn test_rect_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&Rect::new(5.0, 5.0, 10.0, 10.0)));
        // Touching edges share no area
        assert!(!a.overlaps(&Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(!a.overlaps(&Rect::new(50.0, 50.0, 1.0, 1.0)));
    }

    #[test]
    fn test_rect_degenerate() {
        assert!(Rect::new(0.0, 0.0, 0.0, 10.0).is_degenerate());
        assert!(Rect::new(0.0, 0.0, 10.0, -1.0).is_degenerate());
        assert!(Rect::new(0.0, 0.0, f64::NAN, 1.0).is_degenerate());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn test_affine_inverse() {
        let m = Affine::translation(10.0, -4.0)
            .then(&Affine::rotation(30.0))
            .then(&Affine::scaling(2.0, 0.5));
        let inv = m.invert().unwrap();
        let p = Point::new(12.5, -7.25);
        let back = inv.apply(m.apply(p));
        assert!((back.x - p.x).abs() < 1e-9);
        assert!((back.y - p.y).abs() < 1e-9);
    }

    #[test]
    fn test_affine_singular() {
        assert!(Affine::scaling(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_rotation_is_clockwise_on_y_down() {
        let p = Affine::rotation(90.0).apply(Point::new(1.0, 0.0));
        assert!(p.x.abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_image_to_canvas_matches_bounds_without_rotation() {
        let t = transform(300.0, 200.0, 0.5, 800.0, 600.0);
        let m = image_to_canvas(&t);
        let b = image_bounds(&t);
        let tl = m.apply(Point::new(0.0, 0.0));
        let br = m.apply(Point::new(800.0, 600.0));
        assert!((tl.x - b.x).abs() < 1e-9 && (tl.y - b.y).abs() < 1e-9);
        assert!((br.x - b.right()).abs() < 1e-9 && (br.y - b.bottom()).abs() < 1e-9);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
