//! Image encoding pipeline for layerkit.
//!
//! This module provides functionality for:
//! - Encoding RGBA images to PNG (lossless, alpha kept)
//! - Encoding to JPEG with configurable quality (alpha flattened onto black)
//! - Encoding to lossless WebP
//!
//! All encoders take straight RGBA pixel data, 4 bytes per pixel, row-major.
//!
//! # Examples
//!
//! ```ignore
//! use layerkit_core::encode::encode_png;
//!
//! let pixels = vec![128u8; 100 * 100 * 4];
//! let png_bytes = encode_png(&pixels, 100, 100).unwrap();
//! ```

mod jpeg;
mod png;
mod webp;

pub use jpeg::encode_jpeg;
pub use png::encode_png;
pub use webp::encode_webp;

use thiserror::Error;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying codec failed
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: &'static str,
        message: String,
    },
}

/// Check that `pixels` is a non-empty RGBA buffer for `width` x `height`.
fn validate_rgba(pixels: &[u8], width: u32, height: u32) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }

    Ok(())
}
