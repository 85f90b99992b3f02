//! Geometry WASM bindings.
//!
//! Results are plain JS objects (`{ width, height }`, `{ x, y }`) produced
//! with `serde-wasm-bindgen`.

use crate::types::to_js_error;
use layerkit_core::geometry;
use wasm_bindgen::prelude::*;

/// Fit an image into a container, preserving its aspect ratio.
///
/// `scale_factor` defaults to 0.8.
///
/// # Example
///
/// ```typescript
/// const { width, height } = calculate_image_dimensions(4000, 3000, 1280, 720);
/// ```
#[wasm_bindgen]
pub fn calculate_image_dimensions(
    original_width: f64,
    original_height: f64,
    container_width: f64,
    container_height: f64,
    scale_factor: Option<f64>,
) -> Result<JsValue, JsValue> {
    let dims = geometry::calculate_image_dimensions(
        original_width,
        original_height,
        container_width,
        container_height,
        scale_factor.unwrap_or(geometry::DEFAULT_SCALE_FACTOR),
    );
    serde_wasm_bindgen::to_value(&dims).map_err(to_js_error)
}

/// Map a pixel position in a `width` x `height` viewport to NDC.
#[wasm_bindgen]
pub fn screen_to_ndc(x: f64, y: f64, width: f64, height: f64) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&geometry::screen_to_ndc(x, y, width, height)).map_err(to_js_error)
}

/// Orthographic camera bounds (`{ left, right, top, bottom }`) for a viewport.
#[wasm_bindgen]
pub fn viewport_bounds(width: f64, height: f64) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&geometry::viewport_bounds(width, height)).map_err(to_js_error)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use layerkit_core::geometry::{ImageDimensions, NdcPoint};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_dimensions_default_scale() {
        let value = calculate_image_dimensions(1920.0, 1080.0, 1000.0, 800.0, None).unwrap();
        let dims: ImageDimensions = serde_wasm_bindgen::from_value(value).unwrap();
        assert!((dims.width - 800.0).abs() < 1e-9);
        assert!((dims.height - 450.0).abs() < 1e-9);
    }

    #[wasm_bindgen_test]
    fn test_screen_to_ndc_centre() {
        let value = screen_to_ndc(50.0, 25.0, 100.0, 50.0).unwrap();
        let p: NdcPoint = serde_wasm_bindgen::from_value(value).unwrap();
        assert_eq!((p.x, p.y), (0.0, 0.0));
    }
}
