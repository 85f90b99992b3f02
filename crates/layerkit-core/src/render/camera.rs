//! Orthographic camera and viewport fitting.

use glam::{Mat4, Vec3};

use crate::geometry::{viewport_bounds, ViewportBounds};

/// Orthographic camera looking down -Z.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthographicCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    projection_matrix: Mat4,
}

impl OrthographicCamera {
    pub fn new(left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            left,
            right,
            top,
            bottom,
            near,
            far,
            position: Vec3::ZERO,
            projection_matrix: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recompute the projection after the bounds or planes changed.
    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = Mat4::orthographic_rh_gl(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        );
    }

    /// Projection as of the last [`update_projection_matrix`](Self::update_projection_matrix).
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(-self.position)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix()
    }

    /// Current bounds, relative to the camera position.
    pub fn bounds(&self) -> ViewportBounds {
        ViewportBounds {
            left: self.left as f64,
            right: self.right as f64,
            top: self.top as f64,
            bottom: self.bottom as f64,
        }
    }

    /// Whether a plane at world depth `z` lies between the near and far planes.
    pub fn contains_depth(&self, z: f32) -> bool {
        let distance = self.position.z - z;
        distance >= self.near && distance <= self.far
    }
}

/// Camera spanning `[-1, 1]` on both axes, 1 unit in front of the origin.
pub fn create_orthographic_camera() -> OrthographicCamera {
    let mut camera = OrthographicCamera::new(-1.0, 1.0, 1.0, -1.0, 0.1, 1000.0);
    camera.position.z = 1.0;
    camera
}

/// Fit the camera bounds to a `width` x `height` viewport and refresh its
/// projection. Uses the same wide/tall branch as
/// [`screen_to_ndc`](crate::geometry::screen_to_ndc).
pub fn adjust_camera_viewport(camera: &mut OrthographicCamera, width: f64, height: f64) {
    let bounds = viewport_bounds(width, height);

    camera.left = bounds.left as f32;
    camera.right = bounds.right as f32;
    camera.top = bounds.top as f32;
    camera.bottom = bounds.bottom as f32;
    camera.update_projection_matrix();
}
