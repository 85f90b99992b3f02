//! Layerkit Core - Image compositing library
//!
//! This crate provides the core functionality for Layerkit: placing a
//! transformed foreground image over a background and exporting the result.
//! It covers fitting and coordinate geometry, asynchronous image loading,
//! canvas scaling and export, a small scene renderer, and the in-memory
//! editing session.

pub mod canvas;
pub mod compose;
pub mod config;
pub mod decode;
pub mod encode;
pub mod geometry;
pub mod render;
pub mod session;

pub use canvas::{canvas_to_data_url, scale_image_to_canvas, Canvas, CanvasError, SmoothingQuality};
pub use compose::{compose_files, compose_image, compose_session, ComposeError, ComposeOptions};
pub use config::{CompositorConfig, ConfigError};
pub use decode::{load_image, DecodedImage, ImageFile, LoadError, ObjectUrlRegistry};
pub use geometry::{
    calculate_image_dimensions, screen_to_ndc, ImageDimensions, NdcPoint, DEFAULT_SCALE_FACTOR,
};
pub use render::adjust_camera_viewport;
pub use session::{EditingSession, SessionEvent, Transform, TransformUpdate};
