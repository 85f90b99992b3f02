//! In-memory editing session.
//!
//! Holds the files the user picked, the foreground transform and the
//! composed results. Every setter is total and synchronous; observers
//! registered with [`EditingSession::subscribe`] are told which field changed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decode::ImageFile;

/// Placement of the foreground over the background.
///
/// `angle` is in degrees, clockwise on screen. `left` and `top` are
/// background pixels naming the top-left corner of the scaled, unrotated
/// foreground; rotation happens about the foreground's centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub angle: f64,
    pub left: f64,
    pub top: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            left: 0.0,
            top: 0.0,
        }
    }
}

impl Transform {
    /// Whether the transform leaves the foreground untouched.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the fields present in `update`.
    pub fn merge(&mut self, update: TransformUpdate) {
        if let Some(v) = update.scale_x {
            self.scale_x = v;
        }
        if let Some(v) = update.scale_y {
            self.scale_y = v;
        }
        if let Some(v) = update.angle {
            self.angle = v;
        }
        if let Some(v) = update.left {
            self.left = v;
        }
        if let Some(v) = update.top {
            self.top = v;
        }
    }
}

/// Partial [`Transform`]; absent fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformUpdate {
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    pub angle: Option<f64>,
    pub left: Option<f64>,
    pub top: Option<f64>,
}

/// Which part of the session an operation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionEvent {
    ForegroundImages,
    BackgroundImage,
    Transform,
    ComposedImages,
    Cleared,
}

type Observer = Box<dyn FnMut(&SessionEvent)>;

#[derive(Default)]
pub struct EditingSession {
    foreground_images: Vec<ImageFile>,
    background_image: Option<ImageFile>,
    composed_images: Vec<String>,
    transform: Transform,
    observers: Vec<Observer>,
}

impl fmt::Debug for EditingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditingSession")
            .field("foreground_images", &self.foreground_images)
            .field("background_image", &self.background_image)
            .field("composed_images", &self.composed_images.len())
            .field("transform", &self.transform)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl EditingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn foreground_images(&self) -> &[ImageFile] {
        &self.foreground_images
    }

    pub fn background_image(&self) -> Option<&ImageFile> {
        self.background_image.as_ref()
    }

    pub fn composed_images(&self) -> &[String] {
        &self.composed_images
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Register an observer called after every change.
    pub fn subscribe(&mut self, observer: impl FnMut(&SessionEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn set_foreground_images(&mut self, images: Vec<ImageFile>) {
        self.foreground_images = images;
        self.notify(SessionEvent::ForegroundImages);
    }

    pub fn set_background_image(&mut self, image: ImageFile) {
        self.background_image = Some(image);
        self.notify(SessionEvent::BackgroundImage);
    }

    /// Shallow-merge `update` into the current transform.
    pub fn update_transform_info(&mut self, update: TransformUpdate) {
        self.transform.merge(update);
        self.notify(SessionEvent::Transform);
    }

    pub fn set_composed_images(&mut self, images: Vec<String>) {
        self.composed_images = images;
        self.notify(SessionEvent::ComposedImages);
    }

    /// Reset every field to its initial value. Observers stay registered.
    pub fn clear_all(&mut self) {
        self.foreground_images.clear();
        self.background_image = None;
        self.composed_images.clear();
        self.transform = Transform::default();
        self.notify(SessionEvent::Cleared);
    }

    fn notify(&mut self, event: SessionEvent) {
        log::trace!("session changed: {event:?}");
        for observer in &mut self.observers {
            observer(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn file(name: &str) -> ImageFile {
        ImageFile::new(name, "image/png", vec![1u8, 2, 3])
    }

    #[test]
    fn test_initial_state() {
        let session = EditingSession::new();
        assert!(session.foreground_images().is_empty());
        assert!(session.background_image().is_none());
        assert!(session.composed_images().is_empty());
        assert_eq!(session.transform(), Transform::default());
        assert!(session.transform().is_identity());
    }

    #[test]
    fn test_transform_default_values() {
        let t = Transform::default();
        assert_eq!((t.scale_x, t.scale_y, t.angle, t.left, t.top), (1.0, 1.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut session = EditingSession::new();
        session.update_transform_info(TransformUpdate {
            angle: Some(45.0),
            ..Default::default()
        });
        session.update_transform_info(TransformUpdate {
            left: Some(10.0),
            top: Some(20.0),
            ..Default::default()
        });

        let t = session.transform();
        assert_eq!(t.angle, 45.0);
        assert_eq!((t.left, t.top), (10.0, 20.0));
        assert_eq!((t.scale_x, t.scale_y), (1.0, 1.0));
    }

    #[test]
    fn test_setters_replace() {
        let mut session = EditingSession::new();
        session.set_foreground_images(vec![file("a.png"), file("b.png")]);
        session.set_foreground_images(vec![file("c.png")]);
        assert_eq!(session.foreground_images().len(), 1);
        assert_eq!(session.foreground_images()[0].name(), "c.png");

        session.set_background_image(file("bg.png"));
        assert_eq!(session.background_image().map(ImageFile::name), Some("bg.png"));

        session.set_composed_images(vec!["data:,".to_string()]);
        assert_eq!(session.composed_images(), ["data:,"]);
    }

    #[test]
    fn test_clear_all_resets_everything() {
        let mut session = EditingSession::new();
        session.set_foreground_images(vec![file("a.png")]);
        session.set_background_image(file("bg.png"));
        session.set_composed_images(vec!["x".into()]);
        session.update_transform_info(TransformUpdate {
            scale_x: Some(2.0),
            ..Default::default()
        });

        session.clear_all();
        assert!(session.foreground_images().is_empty());
        assert!(session.background_image().is_none());
        assert!(session.composed_images().is_empty());
        assert!(session.transform().is_identity());
    }

    #[test]
    fn test_observers_receive_events() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut session = EditingSession::new();
        let sink = Rc::clone(&seen);
        session.subscribe(move |e| sink.borrow_mut().push(*e));

        session.set_background_image(file("bg.png"));
        session.update_transform_info(TransformUpdate::default());
        session.clear_all();

        assert_eq!(
            *seen.borrow(),
            vec![
                SessionEvent::BackgroundImage,
                SessionEvent::Transform,
                SessionEvent::Cleared
            ]
        );
    }

    #[test]
    fn test_transform_serde_camel_case() {
        let json = serde_json::to_value(Transform::default()).unwrap();
        assert_eq!(json["scaleX"], 1.0);
        assert_eq!(json["scaleY"], 1.0);

        let update: TransformUpdate = serde_json::from_str(r#"{"angle": 90}"#).unwrap();
        assert_eq!(update.angle, Some(90.0));
        assert_eq!(update.scale_x, None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn finite() -> impl Strategy<Value = f64> {
        -1.0e6f64..1.0e6
    }

    fn transform() -> impl Strategy<Value = Transform> {
        (finite(), finite(), finite(), finite(), finite()).prop_map(
            |(scale_x, scale_y, angle, left, top)| Transform {
                scale_x,
                scale_y,
                angle,
                left,
                top,
            },
        )
    }

    fn update() -> impl Strategy<Value = TransformUpdate> {
        (
            proptest::option::of(finite()),
            proptest::option::of(finite()),
            proptest::option::of(finite()),
            proptest::option::of(finite()),
            proptest::option::of(finite()),
        )
            .prop_map(|(scale_x, scale_y, angle, left, top)| TransformUpdate {
                scale_x,
                scale_y,
                angle,
                left,
                top,
            })
    }

    proptest! {
        /// Present fields win, absent fields keep their previous value.
        #[test]
        fn prop_merge_is_fieldwise(start in transform(), u in update()) {
            let mut t = start;
            t.merge(u);

            prop_assert_eq!(t.scale_x, u.scale_x.unwrap_or(start.scale_x));
            prop_assert_eq!(t.scale_y, u.scale_y.unwrap_or(start.scale_y));
            prop_assert_eq!(t.angle, u.angle.unwrap_or(start.angle));
            prop_assert_eq!(t.left, u.left.unwrap_or(start.left));
            prop_assert_eq!(t.top, u.top.unwrap_or(start.top));
        }

        /// Merging the same update twice changes nothing further.
        #[test]
        fn prop_merge_is_idempotent(start in transform(), u in update()) {
            let mut once = start;
            once.merge(u);
            let mut twice = once;
            twice.merge(u);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_clear_all_after_any_updates(updates in proptest::collection::vec(update(), 0..8)) {
            let mut session = EditingSession::new();
            for u in updates {
                session.update_transform_info(u);
            }
            session.clear_all();
            prop_assert!(session.transform().is_identity());
            prop_assert!(session.composed_images().is_empty());
        }
    }
}
