//! Engine configuration.
//!
//! Every field has a default, so hosts may pass a partial object (the WASM
//! bindings deserialize it straight from JavaScript).

use serde::{Deserialize, Serialize};

use crate::codec::OutputFormat;
use crate::error::EngineError;
use crate::render::InterpolationFilter;

/// Tunables for one editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Editing surface width in canvas units.
    pub canvas_width: f64,
    /// Editing surface height in canvas units.
    pub canvas_height: f64,
    /// Fraction of the limiting canvas dimension a new image fills.
    pub fit_ratio: f64,
    /// Margin kept on every side when fitting the extraction frame.
    pub extract_margin: f64,
    /// Smallest crop width/height reachable by dragging a handle.
    pub min_crop_size: f64,
    /// Length of a crop handle bar.
    pub handle_length: f64,
    /// Thickness of a crop handle bar's hit area.
    pub handle_thickness: f64,
    /// Scale multiplier per zoom step or wheel notch.
    pub zoom_step: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Degrees per rotate-left/right control.
    pub rotate_step: f64,
    /// Resampling filter used when drawing the transformed image.
    pub filter: InterpolationFilter,
    /// Encoding for extracted rasters.
    pub output: OutputFormat,
    /// Largest side allowed for an off-screen surface.
    pub max_surface_dimension: u32,
    /// Largest side allowed for a decoded source image.
    pub max_source_dimension: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canvas_width: 600.0,
            canvas_height: 400.0,
            fit_ratio: 0.8,
            extract_margin: 20.0,
            min_crop_size: 20.0,
            handle_length: 40.0,
            handle_thickness: 8.0,
            zoom_step: 1.1,
            min_scale: 0.1,
            max_scale: 5.0,
            rotate_step: 90.0,
            filter: InterpolationFilter::Bilinear,
            output: OutputFormat::Png,
            max_surface_dimension: 16384,
            max_source_dimension: 16384,
        }
    }
}

impl EngineConfig {
    /// Default configuration for a canvas of the given size.
    pub fn with_canvas(width: f64, height: f64) -> Self {
        Self {
            canvas_width: width,
            canvas_height: height,
            ..Self::default()
        }
    }

    /// Reject values that would break the geometry.
    pub fn validate(&self) -> Result<(), EngineError> {
        let positive = [
            ("canvasWidth", self.canvas_width),
            ("canvasHeight", self.canvas_height),
            ("fitRatio", self.fit_ratio),
            ("minScale", self.min_scale),
            ("maxScale", self.max_scale),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.min_scale > self.max_scale {
            return Err(EngineError::InvalidConfig(format!(
                "minScale ({}) exceeds maxScale ({})",
                self.min_scale, self.max_scale
            )));
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "zoomStep must be greater than 1, got {}",
                self.zoom_step
            )));
        }
        if !(self.extract_margin >= 0.0
            && self.extract_margin * 2.0 < self.canvas_width.min(self.canvas_height))
        {
            return Err(EngineError::InvalidConfig(format!(
                "extractMargin {} leaves no room on a {}x{} canvas",
                self.extract_margin, self.canvas_width, self.canvas_height
            )));
        }
        if self.min_crop_size.is_nan() || self.min_crop_size < 0.0 {
            return Err(EngineError::InvalidConfig(
                "minCropSize must not be negative".to_string(),
            ));
        }
        if self.max_surface_dimension == 0 || self.max_source_dimension == 0 {
            return Err(EngineError::InvalidConfig(
                "surface and source limits must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Clamp a scale value into the configured range.
    pub fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}
