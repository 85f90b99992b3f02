//! Textures and their sampling parameters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::Renderer;
use crate::canvas::Canvas;
use crate::decode::DecodedImage;

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a texture, stable across clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

/// How texel values are to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorSpace {
    /// Values are passed through untouched.
    #[default]
    Unmanaged,
    /// sRGB-encoded values.
    Srgb,
    /// Linear-light values with sRGB primaries.
    LinearSrgb,
}

/// Filter used when a texel covers more than one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MagFilter {
    Nearest,
    #[default]
    Linear,
}

/// Filter used when a pixel covers more than one texel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MinFilter {
    Nearest,
    Linear,
    /// Bilinear within the nearest mip level.
    LinearMipmapNearest,
    /// Bilinear within and linear between mip levels (trilinear).
    #[default]
    LinearMipmapLinear,
}

impl MinFilter {
    pub fn uses_mipmaps(self) -> bool {
        matches!(
            self,
            MinFilter::LinearMipmapNearest | MinFilter::LinearMipmapLinear
        )
    }
}

/// An image plus the parameters the renderer samples it with.
///
/// Changing the image or parameters requires [`set_needs_update`] so the
/// renderer re-uploads it (and rebuilds its mipmaps) on the next frame.
///
/// [`set_needs_update`]: Texture::set_needs_update
#[derive(Debug, Clone)]
pub struct Texture {
    id: TextureId,
    image: DecodedImage,
    version: u64,
    pub color_space: ColorSpace,
    pub min_filter: MinFilter,
    pub mag_filter: MagFilter,
    pub anisotropy: u32,
    pub generate_mipmaps: bool,
}

impl Texture {
    pub fn new(image: DecodedImage) -> Self {
        Self {
            id: TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed)),
            image,
            version: 0,
            color_space: ColorSpace::default(),
            min_filter: MinFilter::default(),
            mag_filter: MagFilter::default(),
            anisotropy: 1,
            generate_mipmaps: true,
        }
    }

    /// Snapshot the current contents of `canvas`.
    pub fn from_canvas(canvas: &Canvas) -> Self {
        Self::new(canvas.to_image())
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn image(&self) -> &DecodedImage {
        &self.image
    }

    /// Replace the image and flag the texture for re-upload.
    pub fn set_image(&mut self, image: DecodedImage) {
        self.image = image;
        self.set_needs_update();
    }

    /// Bumped by every [`set_needs_update`](Self::set_needs_update).
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_needs_update(&mut self) {
        self.version += 1;
    }
}

/// Texture from `canvas` configured for high-quality display.
///
/// sRGB, trilinear minification with generated mipmaps, bilinear
/// magnification, and the renderer's maximum anisotropy (1 without a renderer).
pub fn create_high_quality_texture(canvas: &Canvas, renderer: Option<&Renderer>) -> Texture {
    let mut texture = Texture::from_canvas(canvas);
    texture.set_needs_update();
    texture.color_space = ColorSpace::Srgb;
    texture.min_filter = MinFilter::LinearMipmapLinear;
    texture.mag_filter = MagFilter::Linear;
    texture.anisotropy = renderer.map_or(1, |r| r.capabilities().max_anisotropy());
    texture.generate_mipmaps = true;
    texture
}

/// sRGB transfer function, decoding direction.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// sRGB transfer function, encoding direction.
pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}
