//! The editing engine and its imperative control surface.
//!
//! One [`Engine`] owns everything for one editing session: the decoded
//! bitmap, its transform, the crop rectangle, the extraction frame and the
//! mode. Hosts only mutate it through the methods here and the pointer
//! routing in [`crate::interaction`].
//!
//! Every operation is a no-op while no image is loaded, except the
//! extraction calls, which return [`EngineError::NotReady`].

use image::{Rgba, RgbaImage};

use crate::codec::{decode_image, encode_raster, EncodedRaster};
use crate::commit::{commit_crop, CommitOutcome};
use crate::config::EngineConfig;
use crate::crop::{clamp_to_bounds, handle_rect, reconcile_for_crop_mode, CropHandle};
use crate::error::EngineError;
use crate::extract::{
    apply_clip, compute_extract_area, render_frame, render_frame_native, ClipShape, TargetFrame,
};
use crate::geometry::{image_to_canvas, Point, Rect};
use crate::interaction::Gesture;
use crate::mode::{EditMode, ModeTransition};
use crate::model::{canvas_fit_rect, CropArea, ExtractArea, ImageTransform, InitialStateSnapshot};
use crate::render::{dim_outside, draw_transformed};
use crate::surface::{pixel_len, RasterSurfaceFactory, SurfaceFactory};

/// Callbacks raised toward the host. All default to doing nothing.
pub trait EngineEvents {
    fn on_image_load(&mut self, _width: u32, _height: u32) {}
    fn on_image_error(&mut self, _message: &str) {}
    fn on_extract_complete(&mut self, _raster: &EncodedRaster) {}
    fn on_cancel(&mut self) {}
    /// Fired after any state mutation, for hosts that re-render on change.
    fn on_change(&mut self) {}
}

/// Event sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl EngineEvents for NoopEvents {}

/// Source image lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Empty,
    /// Decode in progress on the host side.
    Loading,
    Ready,
    Failed,
}

/// State that only exists once an image has loaded.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub(crate) original: RgbaImage,
    pub(crate) bitmap: RgbaImage,
    pub(crate) transform: ImageTransform,
    pub(crate) crop: CropArea,
    pub(crate) snapshot: InitialStateSnapshot,
}

impl Session {
    /// Restore the crop invariant after the image moved or resized.
    ///
    /// In edit mode the crop follows the image bounds exactly; in crop mode
    /// the user's rectangle is kept and clamped.
    pub(crate) fn reconcile_crop(&mut self, mode: EditMode) {
        let bounds = self.transform.bounds();
        self.crop = match mode {
            EditMode::Edit => bounds,
            EditMode::Crop => clamp_to_bounds(&self.crop, &bounds),
        };
    }
}

pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) surfaces: Box<dyn SurfaceFactory>,
    pub(crate) events: Box<dyn EngineEvents>,
    pub(crate) load_state: LoadState,
    pub(crate) session: Option<Session>,
    pub(crate) mode: EditMode,
    pub(crate) dragging: bool,
    pub(crate) gesture: Gesture,
    target: TargetFrame,
    extract_area: ExtractArea,
    clip: ClipShape,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("load_state", &self.load_state)
            .field("mode", &self.mode)
            .field("dragging", &self.dragging)
            .field("transform", &self.transform())
            .field("crop", &self.crop_area())
            .field("extract_area", &self.extract_area)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine with in-memory surfaces and no event sink.
    pub fn new(config: EngineConfig, target: TargetFrame) -> Result<Self, EngineError> {
        let surfaces = RasterSurfaceFactory::new(config.max_surface_dimension);
        Self::with_parts(config, target, Box::new(surfaces), Box::new(NoopEvents))
    }

    /// Create an engine with an injected surface factory and event sink.
    pub fn with_parts(
        config: EngineConfig,
        target: TargetFrame,
        surfaces: Box<dyn SurfaceFactory>,
        events: Box<dyn EngineEvents>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let extract_area = compute_extract_area(
            config.canvas_width,
            config.canvas_height,
            target,
            config.extract_margin,
        )?;
        Ok(Self {
            config,
            surfaces,
            events,
            load_state: LoadState::Empty,
            session: None,
            mode: EditMode::Edit,
            dragging: false,
            gesture: Gesture::Idle,
            target,
            extract_area,
            clip: ClipShape::None,
        })
    }

    /// Replace the event sink.
    pub fn set_events(&mut self, events: Box<dyn EngineEvents>) {
        self.events = events;
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn is_ready(&self) -> bool {
        self.load_state == LoadState::Ready && self.session.is_some()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// True between drag start and drag end. Renderers suspend the clip
    /// mask while this is set.
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn transform(&self) -> Option<&ImageTransform> {
        self.session.as_ref().map(|s| &s.transform)
    }

    pub fn crop_area(&self) -> Option<&CropArea> {
        self.session.as_ref().map(|s| &s.crop)
    }

    pub fn image_bounds(&self) -> Option<Rect> {
        self.transform().map(ImageTransform::bounds)
    }

    pub fn snapshot(&self) -> Option<&InitialStateSnapshot> {
        self.session.as_ref().map(|s| &s.snapshot)
    }

    /// The current source bitmap (already cropped if a crop was committed).
    pub fn bitmap(&self) -> Option<&RgbaImage> {
        self.session.as_ref().map(|s| &s.bitmap)
    }

    pub fn extract_area(&self) -> &ExtractArea {
        &self.extract_area
    }

    pub fn target_frame(&self) -> TargetFrame {
        self.target
    }

    pub fn clip_shape(&self) -> ClipShape {
        self.clip
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Mark an asynchronous decode as started. Drops any previous image.
    pub fn begin_loading(&mut self) {
        self.session = None;
        self.load_state = LoadState::Loading;
        self.mode = EditMode::Edit;
        self.end_gesture();
        self.notify();
    }

    /// Decode uploaded bytes and load the result.
    ///
    /// On failure the engine stays not-ready and `on_image_error` fires.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
        match decode_image(bytes, self.config.max_source_dimension) {
            Ok(bitmap) => {
                self.load_bitmap(bitmap);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.fail_load(&message);
                Err(e.into())
            }
        }
    }

    /// Report a load failure that happened outside the engine (e.g. network).
    pub fn fail_load(&mut self, message: &str) {
        log::warn!("image load failed: {message}");
        self.session = None;
        self.load_state = LoadState::Failed;
        self.mode = EditMode::Edit;
        self.end_gesture();
        self.events.on_image_error(message);
        self.notify();
    }

    /// Load an already decoded bitmap: fit it to the canvas, centre it and
    /// take the reset snapshot.
    pub fn load_bitmap(&mut self, bitmap: RgbaImage) {
        let (width, height) = bitmap.dimensions();
        if width == 0 || height == 0 {
            self.fail_load("image has no pixels");
            return;
        }
        let (cw, ch) = (self.config.canvas_width, self.config.canvas_height);
        let mut transform =
            ImageTransform::fit_to_canvas(width, height, cw, ch, self.config.fit_ratio);
        transform.scale_x = self.config.clamp_scale(transform.scale_x);
        transform.scale_y = self.config.clamp_scale(transform.scale_y);
        let crop = canvas_fit_rect(width, height, cw, ch);

        self.session = Some(Session {
            original: bitmap.clone(),
            bitmap,
            transform,
            crop,
            snapshot: InitialStateSnapshot { transform, crop },
        });
        self.load_state = LoadState::Ready;
        self.mode = EditMode::Edit;
        self.end_gesture();

        log::info!("loaded {width}x{height} image, scale {:.3}", transform.scale_x);
        self.events.on_image_load(width, height);
        self.notify();
    }

    // ------------------------------------------------------------------
    // Mode state machine
    // ------------------------------------------------------------------

    /// Switch mode. Leaving crop mode commits the crop first.
    pub fn set_mode(&mut self, target: EditMode) {
        if !self.is_ready() {
            return;
        }
        match self.mode.transition_to(target) {
            ModeTransition::Stay => return,
            ModeTransition::EnterCrop => {
                if let Some(session) = self.session.as_mut() {
                    let bounds = session.transform.bounds();
                    session.crop = reconcile_for_crop_mode(&session.crop, &bounds);
                }
            }
            ModeTransition::CommitAndExit => self.commit_and_snap(),
        }
        self.end_gesture();
        log::debug!("mode {} -> {}", self.mode.as_str(), target.as_str());
        self.mode = target;
        self.notify();
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode.toggled());
    }

    /// Commit the crop without waiting for a mode switch, then return to
    /// edit mode.
    pub fn apply_crop(&mut self) {
        if !self.is_ready() {
            return;
        }
        self.commit_and_snap();
        self.end_gesture();
        self.mode = EditMode::Edit;
        self.notify();
    }

    /// Commit, then snap the crop to the bounds as edit mode requires. The
    /// snap also covers a degenerate crop that was left uncommitted.
    fn commit_and_snap(&mut self) {
        self.run_commit();
        if let Some(session) = self.session.as_mut() {
            session.reconcile_crop(EditMode::Edit);
        }
    }

    fn run_commit(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match commit_crop(
            &session.bitmap,
            &session.transform,
            &session.crop,
            self.surfaces.as_ref(),
        ) {
            Ok(CommitOutcome::Degenerate) => {
                log::debug!("crop commit skipped: degenerate crop {:?}", session.crop);
            }
            Ok(CommitOutcome::Unchanged { crop }) => {
                session.crop = crop;
            }
            Ok(CommitOutcome::Committed {
                bitmap,
                transform,
                crop,
            }) => {
                log::debug!(
                    "crop committed: {}x{} -> {}x{}",
                    session.bitmap.width(),
                    session.bitmap.height(),
                    bitmap.width(),
                    bitmap.height()
                );
                session.bitmap = bitmap;
                session.transform = transform;
                session.crop = crop;
            }
            Err(e) => log::warn!("crop commit failed, keeping previous image: {e}"),
        }
    }

    // ------------------------------------------------------------------
    // Transform controls
    // ------------------------------------------------------------------

    pub fn zoom_in(&mut self) {
        self.zoom_by(self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(1.0 / self.config.zoom_step);
    }

    fn zoom_by(&mut self, factor: f64) {
        let Some(center) = self.transform().map(|t| Point::new(t.x, t.y)) else {
            return;
        };
        self.scale_about(factor, center);
        self.notify();
    }

    pub fn rotate_left(&mut self) {
        self.rotate_by(-self.config.rotate_step);
    }

    pub fn rotate_right(&mut self) {
        self.rotate_by(self.config.rotate_step);
    }

    fn rotate_by(&mut self, degrees: f64) {
        let mode = self.mode;
        let Some(session) = self.ready_session() else {
            return;
        };
        let t = &mut session.transform;
        t.rotation_deg = (t.rotation_deg + degrees).rem_euclid(360.0);
        session.reconcile_crop(mode);
        self.notify();
    }

    /// Restore the state captured right after load, including the original
    /// bitmap, and force edit mode.
    pub fn reset(&mut self) {
        let Some(session) = self.ready_session() else {
            return;
        };
        session.bitmap = session.original.clone();
        session.transform = session.snapshot.transform;
        session.crop = session.snapshot.crop;
        self.mode = EditMode::Edit;
        self.end_gesture();
        self.notify();
    }

    /// Release the bitmaps and return to the empty state.
    pub fn cancel(&mut self) {
        self.session = None;
        self.load_state = LoadState::Empty;
        self.mode = EditMode::Edit;
        self.end_gesture();
        self.events.on_cancel();
        self.notify();
    }

    // ------------------------------------------------------------------
    // Extraction frame
    // ------------------------------------------------------------------

    /// Change the target frame and recompute where the export window sits.
    pub fn set_target_frame(&mut self, target: TargetFrame) -> Result<(), EngineError> {
        self.extract_area = compute_extract_area(
            self.config.canvas_width,
            self.config.canvas_height,
            target,
            self.config.extract_margin,
        )?;
        self.target = target;
        self.notify();
        Ok(())
    }

    pub fn set_clip_shape(&mut self, clip: ClipShape) {
        self.clip = clip;
        self.notify();
    }

    // ------------------------------------------------------------------
    // Extraction
    // ------------------------------------------------------------------

    /// The whole canvas with the transformed image, no chrome, no mask.
    pub fn canvas_data(&self) -> Result<EncodedRaster, EngineError> {
        let session = self.session_ref()?;
        let canvas = Rect::new(0.0, 0.0, self.config.canvas_width, self.config.canvas_height);
        let surface = render_frame_native(
            &session.bitmap,
            &session.transform,
            &canvas,
            self.config.filter,
            self.surfaces.as_ref(),
        )?;
        Ok(encode_raster(&surface, self.config.output)?)
    }

    /// Extract using a caller-supplied frame: fitted and centred on the
    /// canvas like the tracked frame, rendered at the target's pixel size.
    pub fn cropped_image_data(&self, target: TargetFrame) -> Result<EncodedRaster, EngineError> {
        let session = self.session_ref()?;
        let frame = compute_extract_area(
            self.config.canvas_width,
            self.config.canvas_height,
            target,
            self.config.extract_margin,
        )?;
        let mut surface = render_frame(
            &session.bitmap,
            &session.transform,
            &frame,
            pixel_len(target.width),
            pixel_len(target.height),
            self.config.filter,
            self.surfaces.as_ref(),
        )?;
        apply_clip(&mut surface, self.clip);
        Ok(encode_raster(&surface, self.config.output)?)
    }

    /// Extract exactly the tracked extraction frame at its own pixel size.
    pub fn target_frame_image_data(&self) -> Result<EncodedRaster, EngineError> {
        let session = self.session_ref()?;
        let mut surface = render_frame_native(
            &session.bitmap,
            &session.transform,
            &self.extract_area,
            self.config.filter,
            self.surfaces.as_ref(),
        )?;
        apply_clip(&mut surface, self.clip);
        Ok(encode_raster(&surface, self.config.output)?)
    }

    /// Frame-relative extraction followed by `on_extract_complete`.
    ///
    /// Failures are logged and returned; the callback is not invoked.
    pub fn trigger_extract(&mut self) -> Result<EncodedRaster, EngineError> {
        match self.target_frame_image_data() {
            Ok(raster) => {
                log::info!(
                    "extracted {}x{} {}",
                    raster.width,
                    raster.height,
                    raster.mime_type()
                );
                self.events.on_extract_complete(&raster);
                Ok(raster)
            }
            Err(e) => {
                log::warn!("extraction unavailable: {e}");
                Err(e)
            }
        }
    }

    /// Editor view: the canvas with the image, the dimming mask outside the
    /// active window (suspended while dragging) and, in crop mode, the
    /// handles.
    pub fn render_view(&self) -> Result<RgbaImage, EngineError> {
        let session = self.session_ref()?;
        let width = pixel_len(self.config.canvas_width);
        let height = pixel_len(self.config.canvas_height);
        let mut surface = self.surfaces.create(width, height)?;
        draw_transformed(
            &mut surface,
            &session.bitmap,
            &image_to_canvas(&session.transform),
            self.config.filter,
        );

        if self.dragging {
            return Ok(surface);
        }
        let window = match self.mode {
            EditMode::Edit => self.extract_area,
            EditMode::Crop => session.crop,
        };
        dim_outside(&mut surface, &window, 0.5);
        if self.mode == EditMode::Crop {
            for handle in CropHandle::ALL {
                let bar = handle_rect(
                    &session.crop,
                    handle,
                    self.config.handle_length,
                    self.config.handle_thickness / 2.0,
                );
                fill_rect(&mut surface, &bar, Rgba([255, 255, 255, 255]));
            }
        }
        Ok(surface)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    pub(crate) fn ready_session(&mut self) -> Option<&mut Session> {
        if self.load_state == LoadState::Ready {
            self.session.as_mut()
        } else {
            None
        }
    }

    fn session_ref(&self) -> Result<&Session, EngineError> {
        match (&self.load_state, &self.session) {
            (LoadState::Ready, Some(session)) => Ok(session),
            _ => Err(EngineError::NotReady),
        }
    }

    pub(crate) fn end_gesture(&mut self) {
        self.gesture = Gesture::Idle;
        self.dragging = false;
    }

    pub(crate) fn notify(&mut self) {
        self.events.on_change();
    }
}

fn fill_rect(image: &mut RgbaImage, rect: &Rect, color: Rgba<u8>) {
    let x0 = rect.x.floor().max(0.0) as u32;
    let y0 = rect.y.floor().max(0.0) as u32;
    let x1 = (rect.right().ceil().max(0.0) as u32).min(image.width());
    let y1 = (rect.bottom().ceil().max(0.0) as u32).min(image.height());
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::OutputFormat;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.0.borrow().clone()
        }

        fn count(&self, name: &str) -> usize {
            self.0.borrow().iter().filter(|e| e.starts_with(name)).count()
        }
    }

    impl EngineEvents for Recorder {
        fn on_image_load(&mut self, width: u32, height: u32) {
            self.0.borrow_mut().push(format!("load {width}x{height}"));
        }
        fn on_image_error(&mut self, message: &str) {
            self.0.borrow_mut().push(format!("error {message}"));
        }
        fn on_extract_complete(&mut self, raster: &EncodedRaster) {
            self.0
                .borrow_mut()
                .push(format!("extract {}x{}", raster.width, raster.height));
        }
        fn on_cancel(&mut self) {
            self.0.borrow_mut().push("cancel".to_string());
        }
        fn on_change(&mut self) {
            self.0.borrow_mut().push("change".to_string());
        }
    }

    fn engine_with(recorder: &Recorder) -> Engine {
        Engine::with_parts(
            EngineConfig::default(),
            TargetFrame::new(300.0, 200.0),
            Box::new(RasterSurfaceFactory::default()),
            Box::new(recorder.clone()),
        )
        .unwrap()
    }

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 90, 255])
        })
    }

    #[test]
    fn test_new_engine_is_empty() {
        let engine = Engine::new(EngineConfig::default(), TargetFrame::new(1.0, 1.0)).unwrap();
        assert_eq!(engine.load_state(), LoadState::Empty);
        assert!(!engine.is_ready());
        assert_eq!(engine.mode(), EditMode::Edit);
        assert!(engine.transform().is_none());
    }

    #[test]
    fn test_new_rejects_invalid_target() {
        let result = Engine::new(EngineConfig::default(), TargetFrame::new(0.0, 1.0));
        assert!(matches!(result, Err(EngineError::InvalidTarget { .. })));
    }

    #[test]
    fn test_load_bitmap_fires_load_and_snapshot() {
        let rec = Recorder::default();
        let mut engine = engine_with(&rec);
        engine.load_bitmap(gradient(80, 60));

        assert!(engine.is_ready());
        assert_eq!(rec.count("load 80x60"), 1);
        let snapshot = engine.snapshot().unwrap();
        assert_eq!(&snapshot.transform, engine.transform().unwrap());
        assert_eq!(&snapshot.crop, engine.crop_area().unwrap());
    }

    #[test]
    fn test_load_image_failure_reports_error() {
        let rec = Recorder::default();
        let mut engine = engine_with(&rec);
        let result = engine.load_image(b"not an image");
        assert!(matches!(result, Err(EngineError::Decode(_))));
        assert_eq!(engine.load_state(), LoadState::Failed);
        assert_eq!(rec.count("error "), 1);
        // Operations are ignored while not ready
        engine.zoom_in();
        engine.set_mode(EditMode::Crop);
        assert_eq!(engine.mode(), EditMode::Edit);
        assert!(engine.transform().is_none());
    }

    #[test]
    fn test_load_image_from_png_bytes() {
        let bytes = encode_raster(&gradient(30, 20), OutputFormat::Png)
            .unwrap()
            .bytes;
        let mut engine = engine_with(&Recorder::default());
        engine.load_image(&bytes).unwrap();
        assert_eq!(engine.bitmap().unwrap().dimensions(), (30, 20));
    }

    #[test]
    fn test_begin_loading_blocks_operations() {
        let mut engine = engine_with(&Recorder::default());
        engine.load_bitmap(gradient(80, 60));
        engine.begin_loading();
        assert_eq!(engine.load_state(), LoadState::Loading);
        assert!(matches!(
            engine.target_frame_image_data(),
            Err(EngineError::NotReady)
        ));
    }

    #[test]
    fn test_zoom_is_uniform_and_centered() {
        let mut engine = engine_with(&Recorder::default());
        engine.load_bitmap(gradient(800, 600));
        let before = *engine.transform().unwrap();
        engine.zoom_in();
        let after = *engine.transform().unwrap();
        assert!((after.scale_x - before.scale_x * 1.1).abs() < 1e-12);
        assert_eq!(after.scale_x, after.scale_y);
        assert_eq!((after.x, after.y), (before.x, before.y));
        // Edit mode: crop follows bounds
        assert_eq!(engine.crop_area().unwrap(), &after.bounds());
    }

    #[test]
    fn test_zoom_clamps_to_range() {
        let mut engine = engine_with(&Recorder::default());
        engine.load_bitmap(gradient(800, 600));
        for _ in 0..100 {
            engine.zoom_in();
        }
        assert_eq!(engine.transform().unwrap().scale_x, 5.0);
        for _ in 0..200 {
            engine.zoom_out();
        }
        assert_eq!(engine.transform().unwrap().scale_y, 0.1);
    }

    #[test]
    fn test_large_image_fit_scale_is_clamped() {
        let config = EngineConfig {
            min_scale: 0.5,
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config, TargetFrame::new(300.0, 200.0)).unwrap();
        // Fit would be min(600/1200, 400/900) * 0.8, about 0.356
        engine.load_bitmap(gradient(1200, 900));
        assert_eq!(engine.transform().unwrap().scale_x, 0.5);
        assert_eq!(engine.snapshot().unwrap().transform.scale_y, 0.5);

        engine.zoom_out();
        assert_eq!(engine.transform().unwrap().scale_x, 0.5);
        engine.wheel(Point::new(300.0, 200.0), 120.0);
        assert_eq!(engine.transform().unwrap().scale_x, 0.5);

        engine.zoom_in();
        assert!((engine.transform().unwrap().scale_x - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_normalizes() {
        let mut engine = engine_with(&Recorder::default());
        engine.load_bitmap(gradient(80, 60));
        engine.rotate_left();
        assert_eq!(engine.transform().unwrap().rotation_deg, 270.0);
        engine.rotate_right();
        engine.rotate_right();
        assert_eq!(engine.transform().unwrap().rotation_deg, 90.0);
    }

    #[test]
    fn test_enter_crop_clamps_initial_crop_to_bounds() {
        let mut engine = engine_with(&Recorder::default());
        engine.load_bitmap(gradient(800, 600));
        engine.set_mode(EditMode::Crop);
        assert_eq!(engine.mode(), EditMode::Crop);
        let bounds = engine.image_bounds().unwrap();
        let crop = engine.crop_area().unwrap();
        assert!(bounds.contains_rect(crop, 1e-9));
        assert!((crop.width - bounds.width).abs() < 1e-9);
    }

    #[test]
    fn test_apply_crop_commits_and_returns_to_edit() {
        let mut engine = engine_with(&Recorder::default());
        engine.load_bitmap(gradient(800, 600));
        engine.set_mode(EditMode::Crop);
        let bounds = engine.image_bounds().unwrap();
        engine.handle_drag_start(CropHandle::Right);
        engine.handle_drag_move(Point::new(bounds.center().x, 0.0));
        engine.handle_drag_end();
        engine.apply_crop();

        assert_eq!(engine.mode(), EditMode::Edit);
        let bitmap = engine.bitmap().unwrap();
        assert_eq!(bitmap.dimensions(), (400, 600));
        let t = engine.transform().unwrap();
        assert_eq!((t.width, t.height), (400.0, 600.0));
        assert!((t.aspect_ratio - 400.0 / 600.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_commit_keeps_state() {
        let mut engine = engine_with(&Recorder::default());
        engine.load_bitmap(gradient(800, 600));
        engine.set_mode(EditMode::Crop);
        if let Some(session) = engine.session.as_mut() {
            session.crop.width = 0.0;
        }
        let before = *engine.transform().unwrap();
        engine.apply_crop();
        assert_eq!(engine.transform().unwrap(), &before);
        assert_eq!(engine.bitmap().unwrap().dimensions(), (800, 600));
    }

    #[test]
    fn test_reset_restores_original_bitmap() {
        let mut engine = engine_with(&Recorder::default());
        engine.load_bitmap(gradient(800, 600));
        let snapshot = *engine.snapshot().unwrap();
        engine.set_mode(EditMode::Crop);
        engine.handle_drag_start(CropHandle::Top);
        engine.handle_drag_move(Point::new(0.0, 200.0));
        engine.handle_drag_end();
        engine.set_mode(EditMode::Edit);
        assert_ne!(engine.bitmap().unwrap().dimensions(), (800, 600));

        engine.reset();
        assert_eq!(engine.bitmap().unwrap().dimensions(), (800, 600));
        assert_eq!(engine.transform().unwrap(), &snapshot.transform);
        assert_eq!(engine.crop_area().unwrap(), &snapshot.crop);
        assert_eq!(engine.mode(), EditMode::Edit);
    }

    #[test]
    fn test_trigger_extract_invokes_callback() {
        let rec = Recorder::default();
        let mut engine = engine_with(&rec);
        engine.load_bitmap(gradient(800, 600));
        let raster = engine.trigger_extract().unwrap();
        // 300x200 fitted into 560x360 -> 540x360
        assert_eq!((raster.width, raster.height), (540, 360));
        assert_eq!(rec.count("extract 540x360"), 1);
    }

    #[test]
    fn test_trigger_extract_without_image_fails_silently() {
        let rec = Recorder::default();
        let mut engine = engine_with(&rec);
        assert!(matches!(engine.trigger_extract(), Err(EngineError::NotReady)));
        assert_eq!(rec.count("extract"), 0);
    }

    #[test]
    fn test_extraction_does_not_mutate_state() {
        let mut engine = engine_with(&Recorder::default());
        engine.load_bitmap(gradient(800, 600));
        engine.rotate_right();
        let t = *engine.transform().unwrap();
        let c = *engine.crop_area().unwrap();
        engine.target_frame_image_data().unwrap();
        engine.cropped_image_data(TargetFrame::new(64.0, 48.0)).unwrap();
        engine.canvas_data().unwrap();
        assert_eq!(engine.transform().unwrap(), &t);
        assert_eq!(engine.crop_area().unwrap(), &c);
    }

    #[test]
    fn test_cropped_image_data_uses_target_size() {
        let mut engine = engine_with(&Recorder::default());
        engine.load_bitmap(gradient(800, 600));
        let raster = engine
            .cropped_image_data(TargetFrame::new(1200.0, 800.0))
            .unwrap();
        assert_eq!((raster.width, raster.height), (1200, 800));
    }

    #[test]
    fn test_surface_failure_is_not_fatal() {
        let mut engine = Engine::with_parts(
            EngineConfig::default(),
            TargetFrame::new(300.0, 200.0),
            Box::new(RasterSurfaceFactory::new(64)),
            Box::new(NoopEvents),
        )
        .unwrap();
        engine.load_bitmap(gradient(80, 60));
        assert!(matches!(
            engine.trigger_extract(),
            Err(EngineError::Surface(_))
        ));
        // Session survives
        assert!(engine.is_ready());
        engine.zoom_in();
    }

    #[test]
    fn test_set_target_frame_recomputes_area() {
        let mut engine = engine_with(&Recorder::default());
        engine.set_target_frame(TargetFrame::new(1.0, 1.0)).unwrap();
        assert_eq!(engine.extract_area(), &Rect::new(120.0, 20.0, 360.0, 360.0));
        assert!(engine.set_target_frame(TargetFrame::new(-1.0, 1.0)).is_err());
        // Previous frame kept on error
        assert_eq!(engine.target_frame(), TargetFrame::new(1.0, 1.0));
    }

    #[test]
    fn test_cancel_releases_session() {
        let rec = Recorder::default();
        let mut engine = engine_with(&rec);
        engine.load_bitmap(gradient(80, 60));
        engine.cancel();
        assert!(engine.bitmap().is_none());
        assert_eq!(engine.load_state(), LoadState::Empty);
        assert_eq!(rec.count("cancel"), 1);
    }

    #[test]
    fn test_change_notifications() {
        let rec = Recorder::default();
        let mut engine = engine_with(&rec);
        engine.load_bitmap(gradient(80, 60));
        engine.zoom_in();
        engine.rotate_left();
        let events = rec.events();
        assert_eq!(events.iter().filter(|e| *e == "change").count(), 3);
    }

    #[test]
    fn test_wheel_before_load_is_silent() {
        let rec = Recorder::default();
        let mut engine = engine_with(&rec);
        engine.wheel(Point::new(10.0, 10.0), -120.0);
        assert!(rec.events().is_empty());
    }

    #[test]
    fn test_render_view_masks_outside_window() {
        let mut engine = engine_with(&Recorder::default());
        engine.set_target_frame(TargetFrame::new(1.0, 1.0)).unwrap();
        engine.load_bitmap(RgbaImage::from_pixel(800, 600, Rgba([200, 200, 200, 255])));
        let view = engine.render_view().unwrap();
        assert_eq!(view.dimensions(), (600, 400));
        // Centre is inside both the image and the extraction frame
        assert_eq!(view.get_pixel(300, 200).0, [200, 200, 200, 255]);
        // (100, 50) is on the image but left of the square frame at x=120
        let dimmed = view.get_pixel(100, 50).0;
        assert!(dimmed[0] < 200);

        engine.drag_start(Point::new(300.0, 200.0));
        let view = engine.render_view().unwrap();
        assert_eq!(view.get_pixel(100, 50).0, [200, 200, 200, 255]);
    }
}
