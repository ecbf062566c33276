//! WASM bindings for the editing engine.
//!
//! `JsEditor` wraps one [`Engine`] and exposes its control surface, pointer
//! routing and extraction calls to JavaScript. Geometry values (transform,
//! crop rectangle, extraction frame) are returned as plain objects via
//! serde-wasm-bindgen.

use framecrop_core::{
    ClipShape, CropHandle, EditMode, Engine, EngineConfig, Point, RasterSurfaceFactory,
    TargetFrame, TransformerRelease,
};
use js_sys::Function;
use wasm_bindgen::{prelude::*, Clamped};
use web_sys::ImageData;

use crate::events::SharedCallbacks;
use crate::types::JsRaster;

fn to_js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_mode(name: &str) -> Result<EditMode, JsValue> {
    EditMode::from_name(name)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown mode: {}", name)))
}

fn parse_handle(name: &str) -> Result<CropHandle, JsValue> {
    CropHandle::from_name(name)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown crop handle: {}", name)))
}

fn handle_name(handle: CropHandle) -> &'static str {
    match handle {
        CropHandle::Top => "top",
        CropHandle::Bottom => "bottom",
        CropHandle::Left => "left",
        CropHandle::Right => "right",
    }
}

/// Interactive crop/transform editor.
///
/// Callbacks fire on the microtask after the editor call that caused them,
/// so they may read the editor. Consecutive changes within one call arrive
/// as a single `onChange`.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const editor = new JsEditor({ canvasWidth: 600, canvasHeight: 400 }, 1080, 1350);
/// editor.set_on_change(() => redraw(editor.render_view()));
/// editor.load_image(new Uint8Array(await file.arrayBuffer()));
/// editor.set_mode("crop");
/// const raster = editor.trigger_extract();
/// img.src = raster.data_url();
/// ```
#[wasm_bindgen]
pub struct JsEditor {
    engine: Engine,
    callbacks: SharedCallbacks,
}

#[wasm_bindgen]
impl JsEditor {
    /// Create an editor.
    ///
    /// # Arguments
    ///
    /// * `config` - Partial `EngineConfig` object (camelCase keys), or `undefined`
    /// * `target_width` - Width of the requested output frame
    /// * `target_height` - Height of the requested output frame
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be parsed or is invalid, or if
    /// the target frame has a non-positive side.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, target_width: f64, target_height: f64) -> Result<JsEditor, JsValue> {
        let config: EngineConfig = if config.is_undefined() || config.is_null() {
            EngineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid editor config: {}", e)))?
        };
        let callbacks = SharedCallbacks::default();
        let surfaces = RasterSurfaceFactory::new(config.max_surface_dimension);
        let engine = Engine::with_parts(
            config,
            TargetFrame::new(target_width, target_height),
            Box::new(surfaces),
            Box::new(callbacks.clone()),
        )
        .map_err(to_js_err)?;
        log::debug!("editor created: {:?}", engine);
        Ok(JsEditor { engine, callbacks })
    }

    // ------------------------------------------------------------------
    // Callbacks
    // ------------------------------------------------------------------

    /// `(width: number, height: number) => void`
    pub fn set_on_image_load(&mut self, f: Option<Function>) {
        self.callbacks.0.borrow_mut().on_image_load = f;
    }

    /// `(message: string) => void`
    pub fn set_on_image_error(&mut self, f: Option<Function>) {
        self.callbacks.0.borrow_mut().on_image_error = f;
    }

    /// `(raster: JsRaster) => void`
    pub fn set_on_extract_complete(&mut self, f: Option<Function>) {
        self.callbacks.0.borrow_mut().on_extract_complete = f;
    }

    pub fn set_on_cancel(&mut self, f: Option<Function>) {
        self.callbacks.0.borrow_mut().on_cancel = f;
    }

    /// Fired after every state change.
    pub fn set_on_change(&mut self, f: Option<Function>) {
        self.callbacks.0.borrow_mut().on_change = f;
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    pub fn begin_loading(&mut self) {
        self.engine.begin_loading();
    }

    /// Decode and load image bytes (PNG or JPEG).
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.engine.load_image(bytes).map_err(to_js_err)
    }

    /// Report a failure that happened before the bytes arrived.
    pub fn fail_load(&mut self, message: &str) {
        self.engine.fail_load(message);
    }

    #[wasm_bindgen(getter)]
    pub fn is_ready(&self) -> bool {
        self.engine.is_ready()
    }

    #[wasm_bindgen(getter)]
    pub fn is_dragging(&self) -> bool {
        self.engine.is_dragging()
    }

    /// "edit" or "crop"
    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> String {
        self.engine.mode().as_str().to_string()
    }

    // ------------------------------------------------------------------
    // Controls
    // ------------------------------------------------------------------

    pub fn set_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode = parse_mode(mode)?;
        self.engine.set_mode(mode);
        Ok(())
    }

    pub fn toggle_mode(&mut self) {
        self.engine.toggle_mode();
    }

    pub fn zoom_in(&mut self) {
        self.engine.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.engine.zoom_out();
    }

    pub fn rotate_left(&mut self) {
        self.engine.rotate_left();
    }

    pub fn rotate_right(&mut self) {
        self.engine.rotate_right();
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }

    pub fn apply_crop(&mut self) {
        self.engine.apply_crop();
    }

    pub fn cancel(&mut self) {
        self.engine.cancel();
    }

    // ------------------------------------------------------------------
    // Pointer events
    // ------------------------------------------------------------------

    pub fn drag_start(&mut self, x: f64, y: f64) {
        self.engine.drag_start(Point::new(x, y));
    }

    pub fn drag_move(&mut self, x: f64, y: f64) {
        self.engine.drag_move(Point::new(x, y));
    }

    pub fn drag_end(&mut self) {
        self.engine.drag_end();
    }

    pub fn transform_start(&mut self) {
        self.engine.transform_start();
    }

    /// Apply the transformer's node attributes on release:
    /// `{ x, y, scaleX, scaleY, rotationDeg }`.
    pub fn transform_end(&mut self, attrs: JsValue) -> Result<(), JsValue> {
        let release: TransformerRelease = serde_wasm_bindgen::from_value(attrs)
            .map_err(|e| JsValue::from_str(&format!("Invalid transformer attributes: {}", e)))?;
        self.engine.transform_end(release);
        Ok(())
    }

    pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
        self.engine.wheel(Point::new(x, y), delta_y);
    }

    /// Name of the crop handle under the pointer, if any.
    pub fn handle_at(&self, x: f64, y: f64) -> Option<String> {
        self.engine
            .handle_at(Point::new(x, y))
            .map(|h| handle_name(h).to_string())
    }

    pub fn handle_drag_start(&mut self, handle: &str) -> Result<(), JsValue> {
        let handle = parse_handle(handle)?;
        self.engine.handle_drag_start(handle);
        Ok(())
    }

    pub fn handle_drag_move(&mut self, x: f64, y: f64) {
        self.engine.handle_drag_move(Point::new(x, y));
    }

    pub fn handle_drag_end(&mut self) {
        self.engine.handle_drag_end();
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Current `ImageTransform`, or `undefined` before load.
    pub fn transform(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.engine.transform()).map_err(to_js_err)
    }

    /// Current crop rectangle, or `undefined` before load.
    pub fn crop_area(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.engine.crop_area()).map_err(to_js_err)
    }

    pub fn image_bounds(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.engine.image_bounds()).map_err(to_js_err)
    }

    pub fn extract_area(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.engine.extract_area()).map_err(to_js_err)
    }

    pub fn set_target_frame(&mut self, width: f64, height: f64) -> Result<(), JsValue> {
        self.engine
            .set_target_frame(TargetFrame::new(width, height))
            .map_err(to_js_err)
    }

    /// `{ shape: "none" }`, `{ shape: "ellipse" }` or
    /// `{ shape: "roundedRect", radius }`.
    pub fn set_clip_shape(&mut self, shape: JsValue) -> Result<(), JsValue> {
        let shape: ClipShape = serde_wasm_bindgen::from_value(shape)
            .map_err(|e| JsValue::from_str(&format!("Invalid clip shape: {}", e)))?;
        self.engine.set_clip_shape(shape);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Extraction
    // ------------------------------------------------------------------

    pub fn target_frame_image_data(&self) -> Result<JsRaster, JsValue> {
        self.engine
            .target_frame_image_data()
            .map(JsRaster::from)
            .map_err(to_js_err)
    }

    pub fn cropped_image_data(&self, width: f64, height: f64) -> Result<JsRaster, JsValue> {
        self.engine
            .cropped_image_data(TargetFrame::new(width, height))
            .map(JsRaster::from)
            .map_err(to_js_err)
    }

    pub fn canvas_data(&self) -> Result<JsRaster, JsValue> {
        self.engine.canvas_data().map(JsRaster::from).map_err(to_js_err)
    }

    /// Extract the target frame and fire `onExtractComplete`.
    pub fn trigger_extract(&mut self) -> Result<JsRaster, JsValue> {
        self.engine.trigger_extract().map(JsRaster::from).map_err(to_js_err)
    }

    /// The editor view (image, mask and handles) as `ImageData`, ready for
    /// `putImageData`.
    pub fn render_view(&self) -> Result<ImageData, JsValue> {
        let view = self.engine.render_view().map_err(to_js_err)?;
        let (width, height) = view.dimensions();
        ImageData::new_with_u8_clamped_array_and_sh(Clamped(view.as_raw().as_slice()), width, height)
    }
}
