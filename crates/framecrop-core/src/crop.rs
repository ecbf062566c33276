//! Crop region management: edge handles, resize and clamping.
//!
//! The crop rectangle lives in canvas space and is never rotated. While in
//! crop mode it must stay inside the image bounds, so every operation here
//! finishes by clamping against them.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::model::CropArea;

/// One of the four edge handles of the crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropHandle {
    Top,
    Bottom,
    Left,
    Right,
}

impl CropHandle {
    pub const ALL: [CropHandle; 4] = [
        CropHandle::Top,
        CropHandle::Bottom,
        CropHandle::Left,
        CropHandle::Right,
    ];

    /// Parse a handle name as sent by the host ("top", "bottom", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "top" => Some(CropHandle::Top),
            "bottom" => Some(CropHandle::Bottom),
            "left" => Some(CropHandle::Left),
            "right" => Some(CropHandle::Right),
            _ => None,
        }
    }

    fn is_horizontal_edge(self) -> bool {
        matches!(self, CropHandle::Top | CropHandle::Bottom)
    }
}

/// The bar drawn for `handle`: `length` long, `thickness` thick, centred on
/// the midpoint of its edge.
pub fn handle_rect(crop: &CropArea, handle: CropHandle, length: f64, thickness: f64) -> Rect {
    let center = crop.center();
    let (cx, cy) = match handle {
        CropHandle::Top => (center.x, crop.y),
        CropHandle::Bottom => (center.x, crop.bottom()),
        CropHandle::Left => (crop.x, center.y),
        CropHandle::Right => (crop.right(), center.y),
    };
    let (w, h) = if handle.is_horizontal_edge() {
        (length, thickness)
    } else {
        (thickness, length)
    };
    Rect::new(cx - w / 2.0, cy - h / 2.0, w, h)
}

/// Find the handle under a pointer, if any.
pub fn hit_test_handle(
    crop: &CropArea,
    pointer: Point,
    length: f64,
    thickness: f64,
) -> Option<CropHandle> {
    CropHandle::ALL
        .into_iter()
        .find(|&h| handle_rect(crop, h, length, thickness).contains_point(pointer))
}

/// Clamp `crop` so no edge lies outside `bounds`.
///
/// Offending edges are pulled in to coincide with the bound. If the two
/// rectangles do not overlap at all the result collapses to zero size on
/// the affected axis.
pub fn clamp_to_bounds(crop: &CropArea, bounds: &Rect) -> CropArea {
    let left = crop.x.max(bounds.x).min(bounds.right());
    let top = crop.y.max(bounds.y).min(bounds.bottom());
    let right = crop.right().min(bounds.right()).max(left);
    let bottom = crop.bottom().min(bounds.bottom()).max(top);
    Rect::from_edges(left, top, right, bottom)
}

/// Reconcile a possibly stale crop with new bounds on entering crop mode.
///
/// A degenerate crop, or one that no longer overlaps the image, is replaced
/// by the full bounds. Otherwise as much of the existing crop is kept as
/// fits.
pub fn reconcile_for_crop_mode(crop: &CropArea, bounds: &Rect) -> CropArea {
    if crop.is_degenerate() || !crop.overlaps(bounds) {
        return *bounds;
    }
    let clamped = clamp_to_bounds(crop, bounds);
    if clamped.is_degenerate() {
        *bounds
    } else {
        clamped
    }
}

/// Move one edge of the crop to follow the pointer.
///
/// The pointer is clamped to the image bounds first. The moving edge stops
/// `min_size` short of the opposite edge, then the whole rectangle is clamped
/// to the bounds.
pub fn drag_handle(
    crop: &CropArea,
    handle: CropHandle,
    pointer: Point,
    bounds: &Rect,
    min_size: f64,
) -> CropArea {
    let px = pointer.x.clamp(bounds.x, bounds.right().max(bounds.x));
    let py = pointer.y.clamp(bounds.y, bounds.bottom().max(bounds.y));

    let (mut left, mut top, mut right, mut bottom) = (crop.x, crop.y, crop.right(), crop.bottom());
    match handle {
        CropHandle::Top => top = py.min(bottom - min_size),
        CropHandle::Bottom => bottom = py.max(top + min_size),
        CropHandle::Left => left = px.min(right - min_size),
        CropHandle::Right => right = px.max(left + min_size),
    }

    clamp_to_bounds(&Rect::from_edges(left, top, right, bottom), bounds)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
