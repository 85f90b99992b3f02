//! Image loading for layerkit.
//!
//! This module provides functionality for:
//! - File handles for user-picked images
//! - Temporary object URLs naming those files while they are decoded
//! - Asynchronous decoding to RGBA with EXIF orientation applied
//!
//! # Architecture
//!
//! Decoding runs on the single UI context. [`load_image`] is the only
//! suspension point; its object URL is an RAII guard, so it is released
//! whether the decode succeeds or fails.
//!
//! # Examples
//!
//! ```ignore
//! use layerkit_core::decode::{load_image, ImageFile, ObjectUrlRegistry};
//!
//! let registry = ObjectUrlRegistry::new();
//! let file = ImageFile::new("photo.png", "image/png", std::fs::read("photo.png")?);
//! let image = load_image(&registry, &file).await?;
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod file;
mod loader;
mod orientation;
mod types;

pub use file::{ImageFile, ObjectUrl, ObjectUrlRegistry};
pub use loader::load_image;
pub use orientation::{decode_image_bytes, read_orientation};
pub use types::{DecodeError, DecodedImage, LoadError, Orientation};
