//! Off-screen rendering surfaces.
//!
//! The engine never creates surfaces on its own: a [`SurfaceFactory`] is
//! injected at construction, so hosts can cap memory use or simulate an
//! unavailable rendering context.

use image::RgbaImage;

use crate::error::SurfaceError;

/// Creates blank, fully transparent RGBA surfaces.
pub trait SurfaceFactory {
    fn create(&self, width: u32, height: u32) -> Result<RgbaImage, SurfaceError>;
}

/// In-memory raster surfaces with a per-side size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterSurfaceFactory {
    pub max_dimension: u32,
}

impl RasterSurfaceFactory {
    pub fn new(max_dimension: u32) -> Self {
        Self { max_dimension }
    }
}

impl Default for RasterSurfaceFactory {
    fn default() -> Self {
        Self::new(16384)
    }
}

impl SurfaceFactory for RasterSurfaceFactory {
    fn create(&self, width: u32, height: u32) -> Result<RgbaImage, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::ZeroSized { width, height });
        }
        if width > self.max_dimension || height > self.max_dimension {
            return Err(SurfaceError::TooLarge {
                width,
                height,
                max: self.max_dimension,
            });
        }
        Ok(RgbaImage::new(width, height))
    }
}

/// Round a canvas-space length to a whole pixel count.
pub(crate) fn pixel_len(len: f64) -> u32 {
    if len.is_finite() && len > 0.0 {
        len.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}
