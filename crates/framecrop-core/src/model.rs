//! The affine state of the loaded image and the rectangles derived from it.

use serde::{Deserialize, Serialize};

use crate::geometry::{image_bounds, Rect};

/// The active crop rectangle, in canvas space. Always axis-aligned.
pub type CropArea = Rect;

/// Where the export window sits on the canvas. Derived from the target frame.
pub type ExtractArea = Rect;

/// Position, scale and rotation of the loaded image on the canvas.
///
/// `(x, y)` is the canvas-space centre of the image. `width`/`height` are the
/// intrinsic pixel size of the current source bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageTransform {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation_deg: f64,
    pub width: f64,
    pub height: f64,
    /// `width / height`. Recomputed by [`ImageTransform::with_size`] only.
    pub aspect_ratio: f64,
}

impl ImageTransform {
    /// Place an image of the given size centred on the canvas, scaled so the
    /// limiting dimension fills `fit_ratio` of the canvas.
    pub fn fit_to_canvas(
        width: u32,
        height: u32,
        canvas_width: f64,
        canvas_height: f64,
        fit_ratio: f64,
    ) -> Self {
        let scale = fit_scale(width, height, canvas_width, canvas_height) * fit_ratio;
        let (w, h) = (width as f64, height as f64);
        Self {
            x: canvas_width / 2.0,
            y: canvas_height / 2.0,
            scale_x: scale,
            scale_y: scale,
            rotation_deg: 0.0,
            width: w,
            height: h,
            aspect_ratio: aspect(w, h),
        }
    }

    /// Same placement, new intrinsic size. The aspect ratio follows.
    pub fn with_size(&self, width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            aspect_ratio: aspect(width, height),
            ..*self
        }
    }

    /// Canvas-space bounds, ignoring rotation.
    pub fn bounds(&self) -> Rect {
        image_bounds(self)
    }
}

/// Scale at which a `width x height` image exactly fits the canvas.
pub fn fit_scale(width: u32, height: u32, canvas_width: f64, canvas_height: f64) -> f64 {
    if width == 0 || height == 0 {
        return 1.0;
    }
    (canvas_width / width as f64).min(canvas_height / height as f64)
}

/// The image's aspect fitted to the whole canvas and centred.
///
/// This is the crop rectangle a freshly loaded image starts with. It contains
/// the image bounds, so entering crop mode clamps it down to them.
pub fn canvas_fit_rect(width: u32, height: u32, canvas_width: f64, canvas_height: f64) -> Rect {
    let scale = fit_scale(width, height, canvas_width, canvas_height);
    let w = width as f64 * scale;
    let h = height as f64 * scale;
    Rect::new((canvas_width - w) / 2.0, (canvas_height - h) / 2.0, w, h)
}

fn aspect(width: f64, height: f64) -> f64 {
    if height > 0.0 {
        width / height
    } else {
        0.0
    }
}

/// Immutable copy of the state right after load, restored by reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialStateSnapshot {
    pub transform: ImageTransform,
    pub crop: CropArea,
}
