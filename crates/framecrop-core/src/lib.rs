//! Framecrop Core - interactive raster transform and region extraction
//!
//! This crate holds the editing engine behind the framecrop image editor:
//! decoding an uploaded photo, placing it on a canvas with a translate,
//! scale and rotate transform, committing axis-aligned crops into a smaller
//! source bitmap, and rendering a fixed-aspect target frame into a new
//! raster.
//!
//! The engine is single-threaded and host-agnostic. [`Engine`] is the only
//! stateful type; everything else is plain geometry and pixel functions.

pub mod codec;
pub mod commit;
pub mod config;
pub mod crop;
pub mod engine;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod interaction;
pub mod mode;
pub mod model;
pub mod render;
pub mod surface;

pub use codec::{decode_image, encode_raster, EncodedRaster, OutputFormat};
pub use config::EngineConfig;
pub use crop::CropHandle;
pub use engine::{Engine, EngineEvents, LoadState, NoopEvents};
pub use error::{DecodeError, EncodeError, EngineError, SurfaceError};
pub use extract::{ClipShape, TargetFrame};
pub use geometry::{Affine, Point, Rect};
pub use interaction::{Gesture, TransformerRelease};
pub use mode::EditMode;
pub use model::{CropArea, ExtractArea, ImageTransform, InitialStateSnapshot};
pub use render::InterpolationFilter;
pub use surface::{RasterSurfaceFactory, SurfaceFactory};
