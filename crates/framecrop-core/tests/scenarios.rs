//! End-to-end editing sessions driven through the public engine API.

use std::cell::RefCell;
use std::rc::Rc;

use framecrop_core::{
    CropHandle, EditMode, EncodedRaster, Engine, EngineConfig, EngineError, EngineEvents, Point,
    RasterSurfaceFactory, TargetFrame,
};
use image::{Rgba, RgbaImage};

#[derive(Clone, Default)]
struct ExtractLog(Rc<RefCell<Vec<(u32, u32)>>>);

impl EngineEvents for ExtractLog {
    fn on_extract_complete(&mut self, raster: &EncodedRaster) {
        self.0.borrow_mut().push((raster.width, raster.height));
    }
}

fn photo(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8, 255])
    })
}

fn engine_with_log(log: &ExtractLog) -> Engine {
    Engine::with_parts(
        EngineConfig::default(),
        TargetFrame::new(1080.0, 1350.0),
        Box::new(RasterSurfaceFactory::default()),
        Box::new(log.clone()),
    )
    .unwrap()
}

#[test]
fn test_load_fits_image_to_canvas() {
    let mut engine = Engine::new(EngineConfig::default(), TargetFrame::new(4.0, 5.0)).unwrap();
    engine.load_bitmap(photo(800, 600));

    let t = engine.transform().unwrap();
    assert!((t.scale_x - 0.5333).abs() < 1e-3);
    assert_eq!(t.scale_x, t.scale_y);
    assert_eq!((t.x, t.y), (300.0, 200.0));

    let crop = engine.crop_area().unwrap();
    assert!((crop.x - 33.333).abs() < 1e-2);
    assert_eq!(crop.y, 0.0);
    assert!((crop.width - 533.333).abs() < 1e-2);
    assert_eq!(crop.height, 400.0);
}

#[test]
fn test_right_handle_stops_at_min_size() {
    let mut engine = Engine::new(EngineConfig::default(), TargetFrame::new(4.0, 5.0)).unwrap();
    engine.load_bitmap(photo(800, 600));
    engine.set_mode(EditMode::Crop);

    engine.handle_drag_start(CropHandle::Left);
    engine.handle_drag_move(Point::new(100.0, 0.0));
    engine.handle_drag_end();
    assert_eq!(engine.crop_area().unwrap().x, 100.0);

    engine.handle_drag_start(CropHandle::Right);
    engine.handle_drag_move(Point::new(50.0, 0.0));
    engine.handle_drag_end();
    let crop = engine.crop_area().unwrap();
    assert_eq!(crop.x, 100.0);
    assert_eq!(crop.width, 20.0);
}

#[test]
fn test_extract_without_image_reports_failure() {
    let log = ExtractLog::default();
    let mut engine = engine_with_log(&log);
    assert!(matches!(engine.trigger_extract(), Err(EngineError::NotReady)));
    assert!(log.0.borrow().is_empty());
}

#[test]
fn test_crop_round_trip_without_drag_preserves_content() {
    let mut engine = Engine::new(EngineConfig::default(), TargetFrame::new(4.0, 5.0)).unwrap();
    engine.load_bitmap(photo(800, 600));
    let before = engine.canvas_data().unwrap();
    let bitmap_before = engine.bitmap().unwrap().clone();

    engine.set_mode(EditMode::Crop);
    engine.set_mode(EditMode::Edit);

    assert_eq!(engine.mode(), EditMode::Edit);
    assert_eq!(engine.bitmap().unwrap(), &bitmap_before);
    assert_eq!(engine.canvas_data().unwrap(), before);
}

#[test]
fn test_full_session_produces_target_frame() {
    let log = ExtractLog::default();
    let mut engine = engine_with_log(&log);
    engine.load_bitmap(photo(1200, 900));

    engine.zoom_in();
    engine.rotate_right();
    engine.drag_start(Point::new(300.0, 200.0));
    engine.drag_move(Point::new(320.0, 210.0));
    engine.drag_end();

    engine.set_mode(EditMode::Crop);
    engine.handle_drag_start(CropHandle::Top);
    engine.handle_drag_move(Point::new(0.0, 120.0));
    engine.handle_drag_end();
    engine.toggle_mode();
    assert_eq!(engine.mode(), EditMode::Edit);
    assert!(engine.bitmap().unwrap().height() < 900);

    let raster = engine.trigger_extract().unwrap();
    // 1080x1350 fitted into 560x360 is 288x360
    assert_eq!((raster.width, raster.height), (288, 360));
    assert_eq!(&raster.bytes[1..4], b"PNG");
    assert_eq!(log.0.borrow().as_slice(), &[(288, 360)]);

    let full = engine
        .cropped_image_data(TargetFrame::new(1080.0, 1350.0))
        .unwrap();
    assert_eq!((full.width, full.height), (1080, 1350));
}

#[test]
fn test_reset_after_commit_restores_everything() {
    let mut engine = Engine::new(EngineConfig::default(), TargetFrame::new(1.0, 1.0)).unwrap();
    let original = photo(640, 480);
    engine.load_bitmap(original.clone());
    let snapshot = *engine.snapshot().unwrap();

    engine.set_mode(EditMode::Crop);
    engine.handle_drag_start(CropHandle::Bottom);
    engine.handle_drag_move(Point::new(0.0, 250.0));
    engine.handle_drag_end();
    engine.apply_crop();
    engine.wheel(Point::new(10.0, 10.0), -1.0);
    engine.rotate_left();

    engine.reset();
    assert_eq!(engine.transform().unwrap(), &snapshot.transform);
    assert_eq!(engine.crop_area().unwrap(), &snapshot.crop);
    assert_eq!(engine.bitmap().unwrap(), &original);
    assert_eq!(engine.mode(), EditMode::Edit);
    assert!(!engine.is_dragging());
}

#[test]
fn test_rotated_extraction_is_transparent_in_corners() {
    let mut engine = Engine::new(EngineConfig::default(), TargetFrame::new(1.0, 1.0)).unwrap();
    engine.load_bitmap(RgbaImage::from_pixel(100, 100, Rgba([255, 0, 0, 255])));
    let area = *engine.extract_area();

    // Shrink the image well inside the frame, then turn it 45 degrees
    for _ in 0..8 {
        engine.zoom_out();
    }
    engine.transform_start();
    let t = *engine.transform().unwrap();
    engine.transform_end(framecrop_core::TransformerRelease {
        x: t.x,
        y: t.y,
        scale_x: t.scale_x,
        scale_y: t.scale_y,
        rotation_deg: 45.0,
    });

    let raster = engine.target_frame_image_data().unwrap();
    assert_eq!(raster.width, area.width.round() as u32);
    let decoded = image::load_from_memory(&raster.bytes).unwrap().into_rgba8();
    assert_eq!(decoded.get_pixel(0, 0).0[3], 0);
    let (cx, cy) = (decoded.width() / 2, decoded.height() / 2);
    assert_eq!(decoded.get_pixel(cx, cy).0, [255, 0, 0, 255]);
}
