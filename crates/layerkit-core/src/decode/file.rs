//! File handles and the temporary object URLs that name them during a decode.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An image file picked by the user.
///
/// Cloning is cheap: the contents are shared.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl ImageFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared MIME type. Decoding sniffs the content and does not trust this.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Registry of live object URLs.
///
/// Single-threaded, like the UI context that owns it. URLs are handed out as
/// [`ObjectUrl`] guards which revoke themselves when dropped.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    entries: RefCell<HashMap<String, ImageFile>>,
    next_id: Cell<u64>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `file` under a fresh `blob:` URL.
    pub fn create_object_url(&self, file: &ImageFile) -> ObjectUrl<'_> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let url = format!("blob:layerkit/{id}");
        self.entries.borrow_mut().insert(url.clone(), file.clone());
        log::trace!("created object URL {url} for {}", file.name());

        ObjectUrl {
            registry: self,
            url,
        }
    }

    /// Look up the file behind a live URL.
    pub fn resolve(&self, url: &str) -> Option<ImageFile> {
        self.entries.borrow().get(url).cloned()
    }

    /// Release a URL. Returns `false` if it was not live.
    pub fn revoke_object_url(&self, url: &str) -> bool {
        let removed = self.entries.borrow_mut().remove(url).is_some();
        if removed {
            log::trace!("revoked object URL {url}");
        }
        removed
    }

    /// Number of live URLs.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// A live object URL, revoked on drop.
#[derive(Debug)]
pub struct ObjectUrl<'a> {
    registry: &'a ObjectUrlRegistry,
    url: String,
}

impl ObjectUrl<'_> {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// The file this URL names.
    pub fn resolve(&self) -> Option<ImageFile> {
        self.registry.resolve(&self.url)
    }
}

impl Drop for ObjectUrl<'_> {
    fn drop(&mut self) {
        self.registry.revoke_object_url(&self.url);
    }
}
