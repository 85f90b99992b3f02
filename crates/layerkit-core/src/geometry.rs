//! Fit and coordinate-mapping math shared by the canvas, renderer and compositor.
//!
//! # Coordinate Systems
//!
//! - **Screen space**: pixels, origin at the top-left, Y grows downward.
//! - **NDC space**: origin at the centre, Y grows upward. The longer viewport
//!   edge spans `[-1, 1]`; the shorter edge spans `[-1/aspect, 1/aspect]`
//!   (wide viewports) or `[-aspect, aspect]` (tall viewports).
//!
//! The wide/tall branch is decided once by [`viewport_bounds`] so that the
//! camera adjuster and [`screen_to_ndc`] can never disagree.

use serde::{Deserialize, Serialize};

/// Fraction of the governing container edge a fitted image occupies.
pub const DEFAULT_SCALE_FACTOR: f64 = 0.8;

/// Width and height of a fitted image, in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: f64,
    pub height: f64,
}

/// A point in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NdcPoint {
    pub x: f64,
    pub y: f64,
}

/// Visible extent of an orthographic view in NDC units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportBounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl ViewportBounds {
    /// Horizontal extent (`right - left`).
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Vertical extent (`top - bottom`).
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }
}

/// Compute display dimensions for an image inside a container.
///
/// The container's larger edge governs the fit: a container wider than it is
/// tall fits the image to `container_width * scale_factor`; any other
/// container (including a square one) fits to `container_height * scale_factor`.
/// The other edge follows the original aspect ratio.
///
/// `original_width` must be positive. A zero width yields non-finite output.
///
/// # Example
///
/// ```ignore
/// let dims = calculate_image_dimensions(400.0, 200.0, 1000.0, 500.0, 0.8);
/// assert_eq!(dims.width, 800.0);
/// assert_eq!(dims.height, 400.0);
/// ```
pub fn calculate_image_dimensions(
    original_width: f64,
    original_height: f64,
    container_width: f64,
    container_height: f64,
    scale_factor: f64,
) -> ImageDimensions {
    let image_aspect = original_height / original_width;

    if container_width > container_height {
        let width = container_width * scale_factor;
        ImageDimensions {
            width,
            height: width * image_aspect,
        }
    } else {
        let height = container_height * scale_factor;
        ImageDimensions {
            width: height / image_aspect,
            height,
        }
    }
}

/// Orthographic bounds for a `width` x `height` viewport.
///
/// Wide viewports (`aspect >= 1`) span `±1` horizontally and `±1/aspect`
/// vertically. Tall viewports span `±aspect` horizontally and `±1` vertically.
pub fn viewport_bounds(width: f64, height: f64) -> ViewportBounds {
    let aspect = width / height;

    if aspect >= 1.0 {
        ViewportBounds {
            left: -1.0,
            right: 1.0,
            top: 1.0 / aspect,
            bottom: -1.0 / aspect,
        }
    } else {
        ViewportBounds {
            left: -aspect,
            right: aspect,
            top: 1.0,
            bottom: -1.0,
        }
    }
}

/// Map a screen-space pixel position to NDC for a `width` x `height` viewport.
///
/// Both dimensions must be positive.
pub fn screen_to_ndc(x: f64, y: f64, width: f64, height: f64) -> NdcPoint {
    let aspect = width / height;
    let nx = (x / width) * 2.0 - 1.0;
    let ny = -((y / height) * 2.0 - 1.0);

    if aspect >= 1.0 {
        NdcPoint {
            x: nx,
            y: ny / aspect,
        }
    } else {
        NdcPoint {
            x: nx * aspect,
            y: ny,
        }
    }
}

/// Inverse of [`screen_to_ndc`].
pub fn ndc_to_screen(point: NdcPoint, width: f64, height: f64) -> (f64, f64) {
    let bounds = viewport_bounds(width, height);
    let x = (point.x - bounds.left) / bounds.width() * width;
    let y = (bounds.top - point.y) / bounds.height() * height;
    (x, y)
}

/// NDC units covered by one screen pixel along either axis.
///
/// The mapping is isotropic: the longer viewport edge always spans 2 units.
pub fn ndc_units_per_pixel(width: f64, height: f64) -> f64 {
    2.0 / width.max(height)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for positive pixel dimensions.
    fn dimension_strategy() -> impl Strategy<Value = f64> {
        1.0f64..=4096.0
    }

    fn scale_strategy() -> impl Strategy<Value = f64> {
        0.05f64..=2.0
    }

    proptest! {
        /// Property: wide containers fit to width.
        #[test]
        fn prop_wide_container_fits_width(
            ow in dimension_strategy(),
            oh in dimension_strategy(),
            ch in dimension_strategy(),
            extra in 0.001f64..=2048.0,
            scale in scale_strategy(),
        ) {
            let cw = ch + extra;
            let dims = calculate_image_dimensions(ow, oh, cw, ch, scale);
            prop_assert!((dims.width - cw * scale).abs() < 1e-9 * cw.max(1.0));
        }

        /// Property: tall or square containers fit to height.
        #[test]
        fn prop_tall_container_fits_height(
            ow in dimension_strategy(),
            oh in dimension_strategy(),
            cw in dimension_strategy(),
            extra in 0.0f64..=2048.0,
            scale in scale_strategy(),
        ) {
            let ch = cw + extra;
            let dims = calculate_image_dimensions(ow, oh, cw, ch, scale);
            prop_assert!((dims.height - ch * scale).abs() < 1e-9 * ch.max(1.0));
        }

        /// Property: the original aspect ratio survives the fit.
        #[test]
        fn prop_aspect_ratio_preserved(
            ow in dimension_strategy(),
            oh in dimension_strategy(),
            cw in dimension_strategy(),
            ch in dimension_strategy(),
            scale in scale_strategy(),
        ) {
            let dims = calculate_image_dimensions(ow, oh, cw, ch, scale);
            let expected = oh / ow;
            let actual = dims.height / dims.width;
            prop_assert!((actual - expected).abs() <= 1e-9 * expected.max(1.0));
        }

        /// Property: NDC mapping round-trips through its inverse.
        #[test]
        fn prop_ndc_inverse(
            w in dimension_strategy(),
            h in dimension_strategy(),
            fx in 0.0f64..=1.0,
            fy in 0.0f64..=1.0,
        ) {
            let (x, y) = (fx * w, fy * h);
            let (rx, ry) = ndc_to_screen(screen_to_ndc(x, y, w, h), w, h);
            prop_assert!((rx - x).abs() < 1e-6);
            prop_assert!((ry - y).abs() < 1e-6);
        }

        /// Property: screen points always land inside the viewport bounds.
        #[test]
        fn prop_ndc_within_bounds(
            w in dimension_strategy(),
            h in dimension_strategy(),
            fx in 0.0f64..=1.0,
            fy in 0.0f64..=1.0,
        ) {
            let b = viewport_bounds(w, h);
            let p = screen_to_ndc(fx * w, fy * h, w, h);
            prop_assert!(p.x >= b.left - 1e-9 && p.x <= b.right + 1e-9);
            prop_assert!(p.y >= b.bottom - 1e-9 && p.y <= b.top + 1e-9);
        }
    }
}
