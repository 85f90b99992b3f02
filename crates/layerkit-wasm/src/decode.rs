//! Image loading WASM bindings.
//!
//! # Example
//!
//! ```typescript
//! import { load_image } from '@layerkit/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = await load_image(file.name, file.type, bytes);
//! console.log(`Loaded ${image.width}x${image.height}`);
//! ```

use std::rc::Rc;

use crate::types::{to_js_error, JsDecodedImage};
use layerkit_core::decode::{self, ImageFile, ObjectUrlRegistry};
use wasm_bindgen::prelude::*;

thread_local! {
    static REGISTRY: Rc<ObjectUrlRegistry> = Rc::new(ObjectUrlRegistry::new());
}

/// The module-wide object URL registry shared by every load.
pub(crate) fn registry() -> Rc<ObjectUrlRegistry> {
    REGISTRY.with(Rc::clone)
}

/// Decode a user-picked file, applying EXIF orientation.
///
/// Rejects with `"Image loading failed"` when the bytes are not a supported
/// image.
#[wasm_bindgen]
pub async fn load_image(name: String, mime_type: String, bytes: Vec<u8>) -> Result<JsDecodedImage, JsValue> {
    let registry = registry();
    let file = ImageFile::new(name, mime_type, bytes);
    decode::load_image(&registry, &file)
        .await
        .map(JsDecodedImage::from_decoded)
        .map_err(to_js_error)
}

/// Number of object URLs currently alive. Zero whenever no load is running.
#[wasm_bindgen]
pub fn live_object_urls() -> usize {
    registry().len()
}
