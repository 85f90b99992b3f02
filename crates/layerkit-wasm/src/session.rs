//! Editing session WASM bindings.
//!
//! [`JsEditingSession`] owns the session store for the UI. Transforms cross
//! the boundary as plain objects (`{ scaleX, scaleY, angle, left, top }`);
//! partial objects are merged field by field.
//!
//! # Example
//!
//! ```typescript
//! const session = new JsEditingSession();
//! session.subscribe((event) => console.log('changed', event));
//! session.set_background_image(bg.name, bg.type, bgBytes);
//! session.add_foreground_image(fg.name, fg.type, fgBytes);
//! session.update_transform_info({ angle: 15, left: 40 });
//! const urls = await session.compose({ exportFormat: 'image/jpeg' });
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::decode::registry;
use crate::types::to_js_error;
use layerkit_core::compose::{compose_files, ComposeError};
use layerkit_core::config::CompositorConfig;
use layerkit_core::decode::ImageFile;
use layerkit_core::session::{EditingSession, SessionEvent, TransformUpdate};
use wasm_bindgen::prelude::*;

type Listener = Rc<dyn Fn(SessionEvent)>;

/// Events the core session raised that listeners have not seen yet.
type Pending = Rc<RefCell<Vec<SessionEvent>>>;

/// The session store exposed to JavaScript.
///
/// Listeners run only after the session borrow is released, so they may read
/// or update the session from inside the callback.
#[wasm_bindgen]
pub struct JsEditingSession {
    inner: Rc<RefCell<EditingSession>>,
    pending: Pending,
    listeners: Rc<RefCell<Vec<Listener>>>,
    config: RefCell<CompositorConfig>,
}

impl Default for JsEditingSession {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl JsEditingSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let pending = Pending::default();
        let mut session = EditingSession::new();
        let queue = Rc::clone(&pending);
        session.subscribe(move |event| queue.borrow_mut().push(*event));

        Self {
            inner: Rc::new(RefCell::new(session)),
            pending,
            listeners: Rc::default(),
            config: RefCell::default(),
        }
    }

    /// Names of the foreground files, in order.
    pub fn foreground_image_names(&self) -> Vec<String> {
        self.inner
            .borrow()
            .foreground_images()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    pub fn background_image_name(&self) -> Option<String> {
        self.inner
            .borrow()
            .background_image()
            .map(|f| f.name().to_string())
    }

    /// Append a foreground file, keeping the ones already set.
    pub fn add_foreground_image(&self, name: String, mime_type: String, bytes: Vec<u8>) {
        {
            let mut session = self.inner.borrow_mut();
            let mut images = session.foreground_images().to_vec();
            images.push(ImageFile::new(name, mime_type, bytes));
            session.set_foreground_images(images);
        }
        self.dispatch();
    }

    pub fn clear_foreground_images(&self) {
        self.inner.borrow_mut().set_foreground_images(Vec::new());
        self.dispatch();
    }

    pub fn set_background_image(&self, name: String, mime_type: String, bytes: Vec<u8>) {
        self.inner
            .borrow_mut()
            .set_background_image(ImageFile::new(name, mime_type, bytes));
        self.dispatch();
    }

    /// Current transform as `{ scaleX, scaleY, angle, left, top }`.
    pub fn transform(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.borrow().transform()).map_err(to_js_error)
    }

    /// Merge the fields present in `update` into the transform.
    pub fn update_transform_info(&self, update: JsValue) -> Result<(), JsValue> {
        let update: TransformUpdate = serde_wasm_bindgen::from_value(update).map_err(to_js_error)?;
        self.inner.borrow_mut().update_transform_info(update);
        self.dispatch();
        Ok(())
    }

    pub fn composed_images(&self) -> Vec<String> {
        self.inner.borrow().composed_images().to_vec()
    }

    pub fn set_composed_images(&self, images: Vec<String>) {
        self.inner.borrow_mut().set_composed_images(images);
        self.dispatch();
    }

    pub fn clear_all(&self) {
        self.inner.borrow_mut().clear_all();
        self.dispatch();
    }

    /// Call `callback` with the changed field's name after every change.
    pub fn subscribe(&self, callback: js_sys::Function) {
        self.subscribe_with(move |event| {
            let event = serde_wasm_bindgen::to_value(&event).unwrap_or(JsValue::UNDEFINED);
            if let Err(e) = callback.call1(&JsValue::NULL, &event) {
                log::warn!("session observer threw: {e:?}");
            }
        });
    }

    /// The compositor config used by [`compose`](Self::compose) and
    /// [`fit_image`](Self::fit_image).
    pub fn config(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&*self.config.borrow()).map_err(to_js_error)
    }

    /// Replace the config with a (possibly partial) `CompositorConfig`.
    pub fn set_config(&self, config: JsValue) -> Result<(), JsValue> {
        let config = parse_config(config)?;
        *self.config.borrow_mut() = config;
        Ok(())
    }

    /// Fit an image into a container at the configured scale factor.
    /// Returns `{ width, height }`.
    pub fn fit_image(
        &self,
        original_width: f64,
        original_height: f64,
        container_width: f64,
        container_height: f64,
    ) -> Result<JsValue, JsValue> {
        let dims = self.config.borrow().fit_image(
            original_width,
            original_height,
            container_width,
            container_height,
        );
        serde_wasm_bindgen::to_value(&dims).map_err(to_js_error)
    }

    /// Compose every foreground over the background.
    ///
    /// `config` is an optional partial `CompositorConfig`; without it the
    /// session's own config is used. Resolves to the exported data URLs, which
    /// are also stored as the composed images.
    pub fn compose(&self, config: JsValue) -> Result<js_sys::Promise, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            self.config.borrow().clone()
        } else {
            parse_config(config)?
        };

        let (background, foregrounds, transform) = {
            let session = self.inner.borrow();
            (
                session.background_image().cloned(),
                session.foreground_images().to_vec(),
                session.transform(),
            )
        };
        let inner = Rc::clone(&self.inner);
        let pending = Rc::clone(&self.pending);
        let listeners = Rc::clone(&self.listeners);

        Ok(wasm_bindgen_futures::future_to_promise(async move {
            let background = background
                .ok_or(ComposeError::MissingBackground)
                .map_err(to_js_error)?;
            let registry = registry();
            let urls = compose_files(&background, &foregrounds, &transform, &registry, &config)
                .await
                .map_err(to_js_error)?;

            inner.borrow_mut().set_composed_images(urls.clone());
            dispatch(&pending, &listeners);
            serde_wasm_bindgen::to_value(&urls).map_err(to_js_error)
        }))
    }
}

impl JsEditingSession {
    /// Register a Rust listener; JavaScript callbacks go through
    /// [`subscribe`](Self::subscribe).
    pub(crate) fn subscribe_with(&self, listener: impl Fn(SessionEvent) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    fn dispatch(&self) {
        dispatch(&self.pending, &self.listeners);
    }
}

/// Deliver queued events until none are left. Listeners may queue more.
fn dispatch(pending: &RefCell<Vec<SessionEvent>>, listeners: &RefCell<Vec<Listener>>) {
    loop {
        let events = std::mem::take(&mut *pending.borrow_mut());
        if events.is_empty() {
            return;
        }
        let listeners = listeners.borrow().clone();
        for event in events {
            for listener in &listeners {
                listener(event);
            }
        }
    }
}

fn parse_config(config: JsValue) -> Result<CompositorConfig, JsValue> {
    let config: CompositorConfig = serde_wasm_bindgen::from_value(config).map_err(to_js_error)?;
    config.validate().map_err(to_js_error)?;
    Ok(config)
}
