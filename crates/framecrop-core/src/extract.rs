//! Extraction: rendering exactly the target frame's content off-screen.
//!
//! Only the transformed bitmap is drawn. Handles, borders and the view mask
//! never reach an extraction surface.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::geometry::{image_to_canvas, Affine, Rect};
use crate::model::{ExtractArea, ImageTransform};
use crate::render::{draw_transformed, InterpolationFilter};
use crate::surface::{pixel_len, SurfaceFactory};

/// The caller's requested output frame. Only its aspect ratio positions the
/// frame on the canvas; full-stage extraction also uses its pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetFrame {
    pub width: f64,
    pub height: f64,
}

impl TargetFrame {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn validate(&self) -> Result<(), EngineError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(self.width) && valid(self.height) {
            Ok(())
        } else {
            Err(EngineError::InvalidTarget {
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// Optional mask applied to an extracted raster, for slots that are not
/// plain rectangles. Purely cosmetic: it never affects the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum ClipShape {
    #[default]
    None,
    /// Rounded rectangle with the given corner radius, in output pixels.
    RoundedRect { radius: f64 },
    /// Ellipse inscribed in the raster.
    Ellipse,
}

/// Fit the target's aspect ratio inside the canvas minus `margin` on every
/// side, then centre it.
pub fn compute_extract_area(
    canvas_width: f64,
    canvas_height: f64,
    target: TargetFrame,
    margin: f64,
) -> Result<ExtractArea, EngineError> {
    target.validate()?;
    let avail_w = (canvas_width - 2.0 * margin).max(0.0);
    let avail_h = (canvas_height - 2.0 * margin).max(0.0);
    let scale = (avail_w / target.width).min(avail_h / target.height);
    let width = target.width * scale;
    let height = target.height * scale;
    Ok(Rect::new(
        (canvas_width - width) / 2.0,
        (canvas_height - height) / 2.0,
        width,
        height,
    ))
}

/// Render the part of the canvas covered by `frame` into a new
/// `out_width x out_height` surface.
///
/// The drawing chain is: scale canvas units to output pixels, shift the
/// frame's origin to zero, then the image's own centre-translate, rotate,
/// scale chain.
pub fn render_frame(
    source: &RgbaImage,
    transform: &ImageTransform,
    frame: &Rect,
    out_width: u32,
    out_height: u32,
    filter: InterpolationFilter,
    surfaces: &dyn SurfaceFactory,
) -> Result<RgbaImage, EngineError> {
    let mut surface = surfaces.create(out_width, out_height)?;
    if frame.is_degenerate() {
        return Ok(surface);
    }

    let matrix = Affine::scaling(
        out_width as f64 / frame.width,
        out_height as f64 / frame.height,
    )
    .then(&Affine::translation(-frame.x, -frame.y))
    .then(&image_to_canvas(transform));

    draw_transformed(&mut surface, source, &matrix, filter);
    Ok(surface)
}

/// Render `frame` at its own pixel size (one output pixel per canvas unit).
pub fn render_frame_native(
    source: &RgbaImage,
    transform: &ImageTransform,
    frame: &Rect,
    filter: InterpolationFilter,
    surfaces: &dyn SurfaceFactory,
) -> Result<RgbaImage, EngineError> {
    let (w, h) = (pixel_len(frame.width), pixel_len(frame.height));
    render_frame(source, transform, frame, w, h, filter, surfaces)
}

/// Clear alpha outside `shape`. Anti-aliasing is limited to pixel-centre
/// coverage, which is enough for a mask.
pub fn apply_clip(image: &mut RgbaImage, shape: ClipShape) {
    let (w, h) = (image.width() as f64, image.height() as f64);
    let inside: Box<dyn Fn(f64, f64) -> bool> = match shape {
        ClipShape::None => return,
        ClipShape::Ellipse => {
            let (rx, ry) = (w / 2.0, h / 2.0);
            Box::new(move |x, y| {
                let nx = (x - rx) / rx;
                let ny = (y - ry) / ry;
                nx * nx + ny * ny <= 1.0
            })
        }
        ClipShape::RoundedRect { radius } => {
            let r = radius.clamp(0.0, w.min(h) / 2.0);
            Box::new(move |x, y| {
                // Distance from the inner rectangle shrunk by the radius.
                let dx = (r - x).max(x - (w - r)).max(0.0);
                let dy = (r - y).max(y - (h - r)).max(0.0);
                dx * dx + dy * dy <= r * r
            })
        }
    };

    for (x, y, px) in image.enumerate_pixels_mut() {
        if !inside(x as f64 + 0.5, y as f64 + 0.5) {
            *px = Rgba([0, 0, 0, 0]);
        }
    }
}
