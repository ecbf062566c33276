//! Error types for the editing engine.
//!
//! Every fallible operation returns one of these. None of them are fatal to
//! the host: the worst outcome is that extraction is unavailable until the
//! precondition (a loaded image, a valid target frame) is fixed.

use thiserror::Error;

/// Errors raised while decoding a user-supplied source image.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not a recognized image format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image data is corrupted or truncated.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The decoded image exceeds the configured size limit.
    #[error("Image dimensions {width}x{height} exceed the supported maximum")]
    DimensionsTooLarge { width: u32, height: u32 },
}

/// Errors raised when an off-screen rendering surface cannot be created.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurfaceError {
    /// One of the requested dimensions is zero.
    #[error("Cannot create a {width}x{height} surface")]
    ZeroSized { width: u32, height: u32 },

    /// The requested surface is larger than the factory allows.
    #[error("Surface {width}x{height} exceeds the maximum dimension {max}")]
    TooLarge { width: u32, height: u32, max: u32 },
}

/// Errors that can occur while encoding an extracted raster.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Umbrella error for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No image has finished loading.
    #[error("No image is loaded")]
    NotReady,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The extraction frame has a zero, negative or non-finite dimension.
    #[error("Invalid target frame {width}x{height}")]
    InvalidTarget { width: f64, height: f64 },

    /// The engine configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
