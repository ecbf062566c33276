//! WASM-compatible wrapper types for engine output.
//!
//! Encoded rasters cross the boundary as `JsRaster`, which carries the
//! bytes plus enough metadata to build a `Blob` or a data URL on the
//! JavaScript side.

use framecrop_core::EncodedRaster;
use wasm_bindgen::prelude::*;

/// An encoded (PNG or JPEG) raster produced by an extraction.
///
/// # Memory Management
///
/// The encoded bytes stay in WASM memory until `bytes()` copies them to a
/// `Uint8Array`. `free()` may be called to release them early.
#[wasm_bindgen]
pub struct JsRaster {
    inner: EncodedRaster,
}

#[wasm_bindgen]
impl JsRaster {
    /// Raster width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Raster height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// MIME type of the encoded bytes ("image/png" or "image/jpeg")
    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        self.inner.mime_type().to_string()
    }

    /// Number of encoded bytes
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.inner.bytes.len()
    }

    /// Returns the encoded bytes as a Uint8Array (copied).
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.bytes.clone()
    }

    /// Returns a `data:` URL, ready for an `<img>` element.
    pub fn data_url(&self) -> String {
        self.inner.to_data_url()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {}
}

impl From<EncodedRaster> for JsRaster {
    fn from(inner: EncodedRaster) -> Self {
        Self { inner }
    }
}
