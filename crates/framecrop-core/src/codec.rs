//! Source decoding and raster encoding.
//!
//! Decoding accepts whatever the upload pipeline hands over (PNG or JPEG
//! bytes), applies the EXIF orientation so the editor shows the photo the
//! right way up, and normalizes to RGBA8.
//!
//! Encoding produces the exported raster, PNG by default so transparent
//! areas of the extraction frame survive.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use exif::{In, Reader, Tag};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageError, ImageReader, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError};

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    /// Flip horizontal + rotate 270 CW.
    Transpose = 5,
    Rotate90CW = 6,
    /// Flip horizontal + rotate 90 CW.
    Transverse = 7,
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// Decode an uploaded image, apply its EXIF orientation and convert to RGBA8.
///
/// # Errors
///
/// - `DecodeError::InvalidFormat` if the bytes are not a supported format
/// - `DecodeError::CorruptedFile` if decoding fails part-way
/// - `DecodeError::DimensionsTooLarge` if either side exceeds `max_dimension`
pub fn decode_image(bytes: &[u8], max_dimension: u32) -> Result<RgbaImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }
    let orientation = extract_orientation(bytes);

    let (width, height) = open_reader(bytes)?
        .into_dimensions()
        .map_err(decode_error)?;
    if width > max_dimension || height > max_dimension {
        return Err(DecodeError::DimensionsTooLarge { width, height });
    }

    let reader = open_reader(bytes)?;

    let img = reader.decode().map_err(decode_error)?;

    let img = apply_orientation(img, orientation).into_rgba8();
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::CorruptedFile(format!(
            "decoded image has no pixels ({width}x{height})"
        )));
    }
    Ok(img)
}

fn decode_error(e: ImageError) -> DecodeError {
    match e {
        ImageError::Unsupported(_) => DecodeError::InvalidFormat,
        other => DecodeError::CorruptedFile(other.to_string()),
    }
}

fn open_reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }
    Ok(reader)
}

/// Read the EXIF orientation, defaulting to `Normal` when absent.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

/// Encoding used for exported rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless, keeps transparency.
    #[default]
    Png,
    /// Lossy. Transparent pixels are flattened onto white.
    Jpeg { quality: u8 },
}

impl OutputFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// An encoded raster, ready to hand to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRaster {
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl EncodedRaster {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.bytes))
    }
}

/// Encode an RGBA surface.
pub fn encode_raster(image: &RgbaImage, format: OutputFormat) -> Result<EncodedRaster, EncodeError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let mut buffer = Cursor::new(Vec::new());
    match format {
        OutputFormat::Png => PngEncoder::new(&mut buffer)
            .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?,
        OutputFormat::Jpeg { quality } => {
            let rgb = flatten_on_white(image);
            JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
                .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
                .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?
        }
    }

    Ok(EncodedRaster {
        format,
        width,
        height,
        bytes: buffer.into_inner(),
    })
}

/// Drop alpha by compositing onto an opaque white background.
fn flatten_on_white(image: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.width() as usize * image.height() as usize * 3);
    for px in image.pixels() {
        let [r, g, b, a] = px.0;
        let a = a as u32;
        for c in [r, g, b] {
            out.push(((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8);
        }
    }
    out
}
