//! Scene rendering: an orthographic camera over textured planes.
//!
//! The model mirrors a small retained-mode 3D API. A [`Scene`] holds
//! [`Mesh`]es (a [`PlaneGeometry`] plus a [`MeshBasicMaterial`]), an
//! [`OrthographicCamera`] looks down -Z at them, and a [`Renderer`] draws the
//! result into an RGBA buffer that can be read back as a
//! [`Canvas`](crate::canvas::Canvas).

mod camera;
mod renderer;
mod scene;
mod texture;

pub use camera::{adjust_camera_viewport, create_orthographic_camera, OrthographicCamera};
pub use renderer::{create_renderer, Renderer, RendererCapabilities, RendererOptions};
pub use scene::{
    create_scene, dispose_objects, Mesh, MeshBasicMaterial, MeshId, PlaneGeometry, Scene,
};
pub use texture::{
    create_high_quality_texture, linear_to_srgb, srgb_to_linear, ColorSpace, MagFilter, MinFilter,
    Texture, TextureId,
};
