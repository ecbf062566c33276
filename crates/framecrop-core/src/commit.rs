//! Crop commit: bake the crop rectangle into a new, smaller source bitmap.
//!
//! Shared by the explicit "apply crop" control and by the automatic commit
//! when leaving crop mode. Rotation is ignored when mapping the crop into
//! the bitmap, consistent with how bounds are computed.

use image::RgbaImage;

use crate::error::EngineError;
use crate::geometry::{image_local_to_stage, stage_to_image_local, Point};
use crate::model::{CropArea, ImageTransform};
use crate::surface::SurfaceFactory;

/// Result of a commit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Zero or negative area. Nothing changes.
    Degenerate,
    /// The crop covers the whole bitmap. The image is kept as is and the
    /// crop rectangle snaps to the image bounds.
    Unchanged { crop: CropArea },
    /// A new bitmap, transform and crop replace the old ones.
    Committed {
        bitmap: RgbaImage,
        transform: ImageTransform,
        crop: CropArea,
    },
}

/// Pixel rectangle `(left, top, width, height)` of `crop` inside the bitmap.
pub fn crop_pixel_rect(
    crop: &CropArea,
    transform: &ImageTransform,
    bitmap_width: u32,
    bitmap_height: u32,
) -> Option<(u32, u32, u32, u32)> {
    if crop.is_degenerate() {
        return None;
    }
    let tl = stage_to_image_local(Point::new(crop.x, crop.y), transform);
    let br = stage_to_image_local(Point::new(crop.right(), crop.bottom()), transform);

    let to_px = |v: f64, max: u32| (v.round().max(0.0) as u32).min(max);
    let left = to_px(tl.x, bitmap_width);
    let top = to_px(tl.y, bitmap_height);
    let right = to_px(br.x, bitmap_width);
    let bottom = to_px(br.y, bitmap_height);

    let width = right.saturating_sub(left);
    let height = bottom.saturating_sub(top);
    if width == 0 || height == 0 {
        return None;
    }
    Some((left, top, width, height))
}

/// Run the commit procedure against the current bitmap and transform.
///
/// The new transform keeps scale and rotation, takes the sub-rectangle's
/// pixel size, and is centred where that pixel rectangle already sits on
/// the canvas, so the kept pixels do not move.
pub fn commit_crop(
    source: &RgbaImage,
    transform: &ImageTransform,
    crop: &CropArea,
    surfaces: &dyn SurfaceFactory,
) -> Result<CommitOutcome, EngineError> {
    let Some((left, top, width, height)) =
        crop_pixel_rect(crop, transform, source.width(), source.height())
    else {
        return Ok(CommitOutcome::Degenerate);
    };

    if left == 0 && top == 0 && width == source.width() && height == source.height() {
        return Ok(CommitOutcome::Unchanged {
            crop: transform.bounds(),
        });
    }

    let mut bitmap = surfaces.create(width, height)?;
    copy_region(source, &mut bitmap, left, top);

    let center = image_local_to_stage(
        Point::new(
            left as f64 + width as f64 / 2.0,
            top as f64 + height as f64 / 2.0,
        ),
        transform,
    );
    let mut next = transform.with_size(width as f64, height as f64);
    next.x = center.x;
    next.y = center.y;

    Ok(CommitOutcome::Committed {
        bitmap,
        crop: next.bounds(),
        transform: next,
    })
}

/// Copy a `dst`-sized region starting at `(left, top)` out of `src`, row by row.
fn copy_region(src: &RgbaImage, dst: &mut RgbaImage, left: u32, top: u32) {
    let src_stride = src.width() as usize * 4;
    let dst_stride = dst.width() as usize * 4;
    let src_raw = src.as_raw();
    for (y, dst_row) in dst.chunks_exact_mut(dst_stride).enumerate() {
        let start = (top as usize + y) * src_stride + left as usize * 4;
        dst_row.copy_from_slice(&src_raw[start..start + dst_stride]);
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
