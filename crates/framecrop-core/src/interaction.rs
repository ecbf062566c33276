//! Pointer routing: image drags, bounding-box resize/rotate releases, wheel
//! zoom and crop handle drags.
//!
//! Each handler maps one host gesture to a mutation of the engine state and
//! leaves the crop invariant of the current mode intact once the gesture
//! ends. Intermediate drag positions are not reconciled.

use serde::{Deserialize, Serialize};

use crate::crop::{clamp_to_bounds, drag_handle, hit_test_handle, CropHandle};
use crate::engine::Engine;
use crate::geometry::Point;
use crate::mode::EditMode;

/// The gesture currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Image translation; `last` is the previous pointer position.
    DraggingImage { last: Point },
    /// Bounding-box resize or rotate, applied on release.
    Transforming,
    DraggingHandle(CropHandle),
}

/// Node attributes reported by the host's transformer when a resize or
/// rotate gesture is released.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformerRelease {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation_deg: f64,
}

impl Engine {
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    // ------------------------------------------------------------------
    // Image drag
    // ------------------------------------------------------------------

    pub fn drag_start(&mut self, pointer: Point) {
        if !self.is_ready() {
            return;
        }
        self.gesture = Gesture::DraggingImage { last: pointer };
        self.dragging = true;
        self.notify();
    }

    /// Translate the image by the pointer delta. In crop mode the crop
    /// rectangle moves with it.
    pub fn drag_move(&mut self, pointer: Point) {
        let Gesture::DraggingImage { last } = self.gesture else {
            return;
        };
        let mode = self.mode;
        let Some(session) = self.ready_session() else {
            return;
        };
        let (dx, dy) = (pointer.x - last.x, pointer.y - last.y);
        session.transform.x += dx;
        session.transform.y += dy;
        if mode == EditMode::Crop {
            session.crop = session.crop.translated(dx, dy);
        }
        self.gesture = Gesture::DraggingImage { last: pointer };
        self.notify();
    }

    pub fn drag_end(&mut self) {
        if !matches!(self.gesture, Gesture::DraggingImage { .. }) {
            return;
        }
        self.end_gesture();
        let mode = self.mode;
        if let Some(session) = self.ready_session() {
            session.reconcile_crop(mode);
        }
        self.notify();
    }

    // ------------------------------------------------------------------
    // Transformer (edit mode only)
    // ------------------------------------------------------------------

    pub fn transform_start(&mut self) {
        if self.is_ready() && self.mode == EditMode::Edit {
            self.gesture = Gesture::Transforming;
        }
    }

    /// Adopt the released node attributes. Scale is clamped per axis and
    /// the crop snaps to the new bounds.
    pub fn transform_end(&mut self, release: TransformerRelease) {
        if self.mode != EditMode::Edit {
            return;
        }
        let scale_x = self.config.clamp_scale(release.scale_x.abs());
        let scale_y = self.config.clamp_scale(release.scale_y.abs());
        self.gesture = Gesture::Idle;
        let Some(session) = self.ready_session() else {
            return;
        };
        let t = &mut session.transform;
        t.x = release.x;
        t.y = release.y;
        t.scale_x = scale_x;
        t.scale_y = scale_y;
        t.rotation_deg = release.rotation_deg.rem_euclid(360.0);
        session.reconcile_crop(EditMode::Edit);
        self.notify();
    }

    // ------------------------------------------------------------------
    // Wheel zoom
    // ------------------------------------------------------------------

    /// Zoom one step about `pointer`. Negative `delta_y` (wheel up) zooms in.
    pub fn wheel(&mut self, pointer: Point, delta_y: f64) {
        if !self.is_ready() || delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let factor = if delta_y < 0.0 {
            self.config.zoom_step
        } else {
            1.0 / self.config.zoom_step
        };
        self.scale_about(factor, pointer);
        self.notify();
    }

    /// Multiply both scale factors by `factor`, clamped per axis, keeping the
    /// canvas point `anchor` fixed. Then reconcile the crop for the mode.
    ///
    /// An axis never moves against the direction of `factor`: a zoom out
    /// from below `min_scale` leaves that axis where it is.
    pub(crate) fn scale_about(&mut self, factor: f64, anchor: Point) {
        let mode = self.mode;
        let config = self.config.clone();
        let step = |scale: f64| {
            let next = config.clamp_scale(scale * factor);
            if (factor < 1.0 && next > scale) || (factor > 1.0 && next < scale) {
                scale
            } else {
                next
            }
        };
        let Some(session) = self.ready_session() else {
            return;
        };
        let t = &mut session.transform;
        let next_x = step(t.scale_x);
        let next_y = step(t.scale_y);
        t.x = anchor.x - (anchor.x - t.x) * (next_x / t.scale_x);
        t.y = anchor.y - (anchor.y - t.y) * (next_y / t.scale_y);
        t.scale_x = next_x;
        t.scale_y = next_y;
        session.reconcile_crop(mode);
    }

    // ------------------------------------------------------------------
    // Crop handles (crop mode only)
    // ------------------------------------------------------------------

    /// The handle under `pointer`, if any, using the configured hit area.
    pub fn handle_at(&self, pointer: Point) -> Option<CropHandle> {
        if self.mode != EditMode::Crop {
            return None;
        }
        let crop = self.crop_area()?;
        hit_test_handle(
            crop,
            pointer,
            self.config.handle_length,
            self.config.handle_thickness,
        )
    }

    pub fn handle_drag_start(&mut self, handle: CropHandle) {
        if self.is_ready() && self.mode == EditMode::Crop {
            self.gesture = Gesture::DraggingHandle(handle);
        }
    }

    pub fn handle_drag_move(&mut self, pointer: Point) {
        let Gesture::DraggingHandle(handle) = self.gesture else {
            return;
        };
        let min_size = self.config.min_crop_size;
        let Some(session) = self.ready_session() else {
            return;
        };
        let bounds = session.transform.bounds();
        session.crop = drag_handle(&session.crop, handle, pointer, &bounds, min_size);
        self.notify();
    }

    pub fn handle_drag_end(&mut self) {
        if !matches!(self.gesture, Gesture::DraggingHandle(_)) {
            return;
        }
        self.gesture = Gesture::Idle;
        if let Some(session) = self.ready_session() {
            let bounds = session.transform.bounds();
            session.crop = clamp_to_bounds(&session.crop, &bounds);
        }
        self.notify();
    }
}
