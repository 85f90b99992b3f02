//! Canvas WASM bindings: scaling and data-URL export.
//!
//! # Example
//!
//! ```typescript
//! import { scale_image_to_canvas, canvas_to_data_url } from '@layerkit/wasm';
//!
//! const scaled = scale_image_to_canvas(image, 800, 600, 'high');
//! const url = canvas_to_data_url(scaled, 'image/jpeg', 0.9);
//! ```

use crate::types::{to_js_error, JsDecodedImage};
use layerkit_core::canvas::{self, SmoothingQuality, DEFAULT_EXPORT_FORMAT, DEFAULT_EXPORT_QUALITY};
use wasm_bindgen::prelude::*;

/// Resample `image` to exactly `width` x `height`.
///
/// `quality` is `"low"`, `"medium"` or `"high"` (the default).
#[wasm_bindgen]
pub fn scale_image_to_canvas(
    image: &JsDecodedImage,
    width: u32,
    height: u32,
    quality: Option<String>,
) -> Result<JsDecodedImage, JsValue> {
    let quality = match quality {
        Some(q) => q.parse::<SmoothingQuality>().map_err(to_js_error)?,
        None => SmoothingQuality::default(),
    };
    let canvas = canvas::scale_image_to_canvas(&image.to_decoded()?, width, height, quality)
        .map_err(to_js_error)?;
    Ok(JsDecodedImage::from_canvas(canvas))
}

/// Export `image` as a `data:` URL.
///
/// Defaults to `"image/png"` at quality 1.0. Unsupported types fall back to PNG.
#[wasm_bindgen]
pub fn canvas_to_data_url(
    image: &JsDecodedImage,
    format: Option<String>,
    quality: Option<f64>,
) -> Result<String, JsValue> {
    let canvas = image.to_canvas()?;
    canvas::canvas_to_data_url(
        &canvas,
        format.as_deref().unwrap_or(DEFAULT_EXPORT_FORMAT),
        quality.unwrap_or(DEFAULT_EXPORT_QUALITY),
    )
    .map_err(to_js_error)
}
