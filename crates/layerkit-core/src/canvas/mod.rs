//! Canvas utilities: off-screen surfaces, scaling and export.
//!
//! A [`Canvas`] is an RGBA surface with a browser-like drawing model: images
//! are resampled with the surface's smoothing settings and composited
//! source-over. Surfaces are serialized with [`canvas_to_data_url`].

mod blend;
mod export;
mod scale;
mod surface;

pub use blend::{premultiply, source_over, unpremultiply};
pub use export::{
    canvas_to_data_url, canvas_to_default_data_url, decode_data_url, ExportFormat,
    DEFAULT_EXPORT_FORMAT, DEFAULT_EXPORT_QUALITY,
};
pub use scale::scale_image_to_canvas;
pub use surface::{check_rgba_len, Canvas, CanvasError, ImageSmoothing, SmoothingQuality};
