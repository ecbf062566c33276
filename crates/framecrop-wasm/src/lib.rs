//! Framecrop WASM - WebAssembly bindings for the framecrop editor
//!
//! This crate exposes the framecrop-core editing engine to JavaScript and
//! TypeScript hosts.
//!
//! # Module Structure
//!
//! - `editor` - `JsEditor`, the engine's control surface and pointer routing
//! - `events` - JavaScript callback registration
//! - `types` - WASM-compatible wrapper types for encoded rasters
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsEditor } from '@framecrop/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const editor = new JsEditor(undefined, 1080, 1350);
//! editor.set_on_extract_complete((raster) => upload(raster.bytes()));
//! editor.load_image(new Uint8Array(await file.arrayBuffer()));
//! editor.trigger_extract();
//! ```

use wasm_bindgen::prelude::*;

mod editor;
mod events;
mod types;

// Re-export public types
pub use editor::JsEditor;
pub use types::JsRaster;

/// Initialize the WASM module (called automatically on load)
///
/// Routes panics and `log` output to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    _ = console_log::init_with_level(log::Level::Debug);
    log::info!("framecrop {} ready", version());
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
