//! Asynchronous image loading from file handles.

use super::orientation::decode_image_bytes;
use super::{DecodeError, DecodedImage, ImageFile, LoadError, ObjectUrlRegistry};

/// Decode `file` into an in-memory image.
///
/// A temporary object URL is registered for the duration of the decode and
/// revoked on every exit path. The returned future resolves exactly once.
///
/// # Errors
///
/// Returns `LoadError` ("Image loading failed") when the bytes cannot be
/// decoded. The caller may retry with a different file.
pub async fn load_image(
    registry: &ObjectUrlRegistry,
    file: &ImageFile,
) -> Result<DecodedImage, LoadError> {
    let url = registry.create_object_url(file);

    match decode_object_url(registry, url.as_str()).await {
        Ok(image) => {
            log::debug!(
                "loaded {} ({}x{}) from {}",
                file.name(),
                image.width,
                image.height,
                url.as_str()
            );
            Ok(image)
        }
        Err(e) => {
            log::warn!("failed to load {}: {e}", file.name());
            Err(LoadError::new(e))
        }
    }
}

async fn decode_object_url(
    registry: &ObjectUrlRegistry,
    url: &str,
) -> Result<DecodedImage, DecodeError> {
    let file = registry
        .resolve(url)
        .ok_or_else(|| DecodeError::CorruptedFile(format!("object URL {url} was revoked")))?;
    decode_image_bytes(file.bytes())
}
