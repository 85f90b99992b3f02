//! Compositing a transformed foreground over a background.
//!
//! The background fills the camera's viewport exactly, so one background
//! pixel maps to one drawing-buffer pixel. The foreground is a second plane
//! placed in front of it:
//!
//! ```text
//! units     = 2 / max(bg_w, bg_h)
//! size      = (fg_w * |scale_x| * units, fg_h * |scale_y| * units)
//! centre    = screen_to_ndc(left + fg_w * scale_x / 2, top + fg_h * scale_y / 2)
//! rotation  = -angle (degrees, clockwise on screen)
//! ```

use glam::{Vec2, Vec3};
use thiserror::Error;

use crate::canvas::{canvas_to_data_url, scale_image_to_canvas, Canvas, CanvasError, SmoothingQuality};
use crate::config::CompositorConfig;
use crate::decode::{load_image, DecodedImage, ImageFile, LoadError, ObjectUrlRegistry};
use crate::encode::EncodeError;
use crate::geometry::{ndc_units_per_pixel, screen_to_ndc, viewport_bounds};
use crate::render::{
    adjust_camera_viewport, create_high_quality_texture, create_orthographic_camera,
    create_renderer, create_scene, Mesh, MeshBasicMaterial, PlaneGeometry, Renderer,
};
use crate::session::{EditingSession, Transform};

/// Depth of the foreground plane; the background sits at 0.
const FOREGROUND_DEPTH: f32 = 0.01;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to export composed image: {0}")]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error("no background image selected")]
    MissingBackground,

    #[error("background image has no pixels")]
    EmptyBackground,
}

/// Rendering settings for [`compose_image`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposeOptions {
    /// Filter used when the foreground is pre-scaled down to its placed size.
    pub smoothing_quality: SmoothingQuality,
    /// Pixel ratio handed to [`create_renderer`]. The renderer's logical size
    /// is divided by its ratio, so this never changes the output size or
    /// pixels; composites always come out at the background's resolution.
    pub device_pixel_ratio: f64,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            smoothing_quality: SmoothingQuality::High,
            device_pixel_ratio: 1.0,
        }
    }
}

impl From<&CompositorConfig> for ComposeOptions {
    fn from(config: &CompositorConfig) -> Self {
        Self {
            smoothing_quality: config.smoothing_quality,
            device_pixel_ratio: config.device_pixel_ratio,
        }
    }
}

/// Render `foreground`, placed by `transform`, over `background`.
///
/// The result has the background's dimensions.
pub fn compose_image(
    background: &DecodedImage,
    foreground: &DecodedImage,
    transform: &Transform,
    options: &ComposeOptions,
) -> Result<DecodedImage, ComposeError> {
    if background.is_empty() {
        return Err(ComposeError::EmptyBackground);
    }
    let (width, height) = (background.width as f64, background.height as f64);

    let mut renderer = create_renderer(options.device_pixel_ratio);
    fit_renderer(&mut renderer, width, height);

    let mut camera = create_orthographic_camera();
    adjust_camera_viewport(&mut camera, width, height);

    let mut scene = create_scene();
    let bounds = viewport_bounds(width, height);
    let background_texture =
        create_high_quality_texture(&Canvas::from_image(background.clone())?, Some(&renderer));
    scene.add(Mesh::new(
        PlaneGeometry::new(bounds.width() as f32, bounds.height() as f32),
        MeshBasicMaterial::with_map(background_texture),
    ));

    match foreground_mesh(foreground, transform, options, &renderer, width, height)? {
        Some(mesh) => {
            scene.add(mesh);
        }
        None => log::debug!("foreground has no visible area, rendering background only"),
    }

    renderer.render(&scene, &camera);
    Ok(renderer.read_pixels())
}

/// Compose every foreground in `session` over its background and store the
/// exported data URLs as the session's composed images.
///
/// # Errors
///
/// Fails with [`ComposeError::MissingBackground`] before loading anything when
/// no background is set. Without foregrounds the result is empty.
pub async fn compose_session(
    session: &mut EditingSession,
    registry: &ObjectUrlRegistry,
    config: &CompositorConfig,
) -> Result<Vec<String>, ComposeError> {
    let background = session
        .background_image()
        .cloned()
        .ok_or(ComposeError::MissingBackground)?;
    let foregrounds = session.foreground_images().to_vec();
    let transform = session.transform();

    let urls = compose_files(&background, &foregrounds, &transform, registry, config).await?;
    session.set_composed_images(urls.clone());
    Ok(urls)
}

/// Load `background` and each of `foregrounds`, compose them with
/// `transform` and export every result as a data URL.
///
/// Works on owned inputs so callers can release any lock on the session
/// before awaiting. Nothing is loaded when `foregrounds` is empty.
pub async fn compose_files(
    background: &ImageFile,
    foregrounds: &[ImageFile],
    transform: &Transform,
    registry: &ObjectUrlRegistry,
    config: &CompositorConfig,
) -> Result<Vec<String>, ComposeError> {
    if foregrounds.is_empty() {
        return Ok(Vec::new());
    }

    let background_image = load_image(registry, background).await?;
    let options = ComposeOptions::from(config);

    let mut urls = Vec::with_capacity(foregrounds.len());
    for file in foregrounds {
        let foreground = load_image(registry, file).await?;
        let composed = compose_image(&background_image, &foreground, transform, &options)?;
        let url = canvas_to_data_url(
            &Canvas::from_image(composed)?,
            &config.export_format,
            config.export_quality,
        )?;
        urls.push(url);
    }

    log::info!("composed {} image(s) over {}", urls.len(), background.name());
    Ok(urls)
}

/// Size the renderer so its drawing buffer matches `width` x `height` pixels.
fn fit_renderer(renderer: &mut Renderer, width: f64, height: f64) {
    let ratio = renderer.pixel_ratio();
    renderer.set_size(width / ratio, height / ratio);
}

fn foreground_mesh(
    foreground: &DecodedImage,
    transform: &Transform,
    options: &ComposeOptions,
    renderer: &Renderer,
    width: f64,
    height: f64,
) -> Result<Option<Mesh>, ComposeError> {
    let (fw, fh) = (foreground.width as f64, foreground.height as f64);
    let (placed_w, placed_h) = (fw * transform.scale_x.abs(), fh * transform.scale_y.abs());
    if foreground.is_empty() || placed_w == 0.0 || placed_h == 0.0 {
        return Ok(None);
    }
    if !(placed_w.is_finite() && placed_h.is_finite()) {
        log::warn!("foreground scale {}x{} is not finite", transform.scale_x, transform.scale_y);
        return Ok(None);
    }

    // Downsample once on the CPU with the configured filter. Magnification is
    // left to the texture sampler, so the texture never outgrows the source.
    let (target_w, target_h) = (
        placed_w.min(fw).round().max(1.0) as u32,
        placed_h.min(fh).round().max(1.0) as u32,
    );
    let canvas = if (target_w, target_h) == (foreground.width, foreground.height) {
        Canvas::from_image(foreground.clone())?
    } else {
        scale_image_to_canvas(foreground, target_w, target_h, options.smoothing_quality)?
    };
    let texture = create_high_quality_texture(&canvas, Some(renderer));

    let units = ndc_units_per_pixel(width, height);
    let centre = screen_to_ndc(
        transform.left + fw * transform.scale_x / 2.0,
        transform.top + fh * transform.scale_y / 2.0,
        width,
        height,
    );

    let mut mesh = Mesh::new(
        PlaneGeometry::new((placed_w * units) as f32, (placed_h * units) as f32),
        MeshBasicMaterial::with_map(texture),
    );
    mesh.position = Vec3::new(centre.x as f32, centre.y as f32, FOREGROUND_DEPTH);
    mesh.rotation = -(transform.angle.to_radians() as f32);
    mesh.scale = Vec2::new(
        transform.scale_x.signum() as f32,
        transform.scale_y.signum() as f32,
    );
    Ok(Some(mesh))
}
