//! Serializing a canvas to a `data:` URL.
//!
//! Mirrors the browser canvas export rules: unsupported types fall back to
//! PNG, quality only matters for lossy types, and a canvas with no pixels
//! exports as `"data:,"`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::Canvas;
use crate::encode::{encode_jpeg, encode_png, encode_webp, EncodeError};

/// MIME type used when the caller does not pick one.
pub const DEFAULT_EXPORT_FORMAT: &str = "image/png";

/// Quality used when the caller does not pick one.
pub const DEFAULT_EXPORT_QUALITY: f64 = 1.0;

/// JPEG quality browsers use when the requested quality is out of range.
const FALLBACK_JPEG_QUALITY: f64 = 0.92;

/// Encodings a canvas can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
    WebP,
}

impl ExportFormat {
    /// Resolve a MIME type, falling back to PNG for anything unsupported.
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => ExportFormat::Jpeg,
            "image/webp" => ExportFormat::WebP,
            _ => ExportFormat::Png,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::WebP => "image/webp",
        }
    }
}

/// Encode `canvas` as `data:<mime>;base64,<payload>`.
///
/// `quality` is in `0.0..=1.0` and only affects JPEG; values outside that range
/// (or NaN) use the browser default of 0.92. WebP output is lossless.
pub fn canvas_to_data_url(canvas: &Canvas, format: &str, quality: f64) -> Result<String, EncodeError> {
    if canvas.is_empty() {
        return Ok("data:,".to_string());
    }

    let format = ExportFormat::from_mime(format);
    let (w, h, pixels) = (canvas.width(), canvas.height(), canvas.pixels());

    let bytes = match format {
        ExportFormat::Png => encode_png(pixels, w, h)?,
        ExportFormat::Jpeg => encode_jpeg(pixels, w, h, jpeg_quality(quality))?,
        ExportFormat::WebP => encode_webp(pixels, w, h)?,
    };

    log::debug!(
        "exported {w}x{h} canvas as {} ({} bytes)",
        format.mime_type(),
        bytes.len()
    );

    Ok(format!(
        "data:{};base64,{}",
        format.mime_type(),
        STANDARD.encode(&bytes)
    ))
}

/// Export with [`DEFAULT_EXPORT_FORMAT`] and [`DEFAULT_EXPORT_QUALITY`].
pub fn canvas_to_default_data_url(canvas: &Canvas) -> Result<String, EncodeError> {
    canvas_to_data_url(canvas, DEFAULT_EXPORT_FORMAT, DEFAULT_EXPORT_QUALITY)
}

fn jpeg_quality(quality: f64) -> u8 {
    let q = if (0.0..=1.0).contains(&quality) {
        quality
    } else {
        FALLBACK_JPEG_QUALITY
    };
    ((q * 100.0).round() as u8).clamp(1, 100)
}

/// Split a `data:` URL into its MIME type and decoded payload.
///
/// Returns `None` for anything that is not a base64 data URL.
pub fn decode_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload).ok()?;
    Some((mime.to_string(), bytes))
}
