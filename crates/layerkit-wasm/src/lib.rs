//! Layerkit WASM - WebAssembly bindings for Layerkit
//!
//! This crate provides WASM bindings to expose the layerkit-core functionality
//! to JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for image data
//! - `geometry` - Image fitting and screen-to-NDC mapping
//! - `canvas` - Image scaling and data-URL export
//! - `decode` - Asynchronous image loading
//! - `session` - The editing session store and compositing
//!
//! # Usage
//!
//! ```typescript
//! import init, { load_image, JsEditingSession } from '@layerkit/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = await load_image(file.name, file.type, bytes);
//! console.log(`Loaded ${image.width}x${image.height}`);
//! ```

use wasm_bindgen::prelude::*;

mod canvas;
mod decode;
mod geometry;
mod session;
mod types;

// Re-export public types
pub use canvas::{canvas_to_data_url, scale_image_to_canvas};
pub use decode::{live_object_urls, load_image};
pub use geometry::{calculate_image_dimensions, screen_to_ndc, viewport_bounds};
pub use session::JsEditingSession;
pub use types::JsDecodedImage;

/// Initialize the WASM module (called automatically on load)
///
/// Installs a panic hook and forwards `log` records to the browser console
/// at `info` level.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

/// Change the console log level (`"error"` through `"trace"`, or `"off"`).
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter = parse_level(level)
        .ok_or_else(|| JsValue::from_str(&format!("unknown log level: {level}")))?;
    log::set_max_level(filter);
    Ok(())
}

fn parse_level(name: &str) -> Option<log::LevelFilter> {
    name.trim().parse().ok()
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
