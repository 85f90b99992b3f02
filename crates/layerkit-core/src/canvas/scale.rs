//! Scaling decoded images into fresh canvases.

use super::{Canvas, CanvasError, ImageSmoothing, SmoothingQuality};
use crate::decode::DecodedImage;

/// Resample `image` into a new `target_width` x `target_height` canvas.
///
/// Smoothing is enabled at `quality`. The result always has exactly the
/// requested dimensions regardless of the source size; a zero-sized target
/// produces an empty canvas. Fails when `image`'s pixel buffer does not
/// match its dimensions.
///
/// # Example
///
/// ```ignore
/// let canvas = scale_image_to_canvas(&photo, 1024, 768, SmoothingQuality::High)?;
/// assert_eq!((canvas.width(), canvas.height()), (1024, 768));
/// ```
pub fn scale_image_to_canvas(
    image: &DecodedImage,
    target_width: u32,
    target_height: u32,
    quality: SmoothingQuality,
) -> Result<Canvas, CanvasError> {
    let mut canvas = Canvas::new(target_width, target_height);
    canvas.set_image_smoothing(ImageSmoothing {
        enabled: true,
        quality,
    });
    canvas.draw_image(image, 0, 0, target_width, target_height)?;
    Ok(canvas)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn quality_strategy() -> impl Strategy<Value = SmoothingQuality> {
        prop_oneof![
            Just(SmoothingQuality::Low),
            Just(SmoothingQuality::Medium),
            Just(SmoothingQuality::High),
        ]
    }

    proptest! {
        /// Property: output dimensions always equal the requested target.
        #[test]
        fn prop_output_matches_target(
            (sw, sh) in (1u32..=24, 1u32..=24),
            (tw, th) in (0u32..=32, 0u32..=32),
            quality in quality_strategy(),
        ) {
            let src = DecodedImage::new(sw, sh, vec![200u8; (sw * sh * 4) as usize]);
            let canvas = scale_image_to_canvas(&src, tw, th, quality).unwrap();

            prop_assert_eq!(canvas.width(), tw);
            prop_assert_eq!(canvas.height(), th);
            prop_assert_eq!(canvas.pixels().len(), (tw * th * 4) as usize);
        }
    }
}
