//! Off-screen drawing surface.

use image::imageops::FilterType;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::blend::{premultiply, source_over, unpremultiply};
use crate::decode::DecodedImage;

/// Errors raised when pixel data does not describe its image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    #[error("pixel buffer for {width}x{height} image has {actual} bytes, expected {expected}")]
    InvalidPixelData {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Check that `len` bytes hold exactly `width` x `height` RGBA pixels.
pub fn check_rgba_len(width: u32, height: u32, len: usize) -> Result<(), CanvasError> {
    let expected = width as usize * height as usize * 4;
    if len == expected {
        Ok(())
    } else {
        Err(CanvasError::InvalidPixelData {
            width,
            height,
            expected,
            actual: len,
        })
    }
}

/// Resampling quality used when smoothing is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingQuality {
    /// Bilinear.
    Low,
    /// Catmull-Rom bicubic.
    Medium,
    /// Lanczos3.
    #[default]
    High,
}

impl SmoothingQuality {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> FilterType {
        match self {
            SmoothingQuality::Low => FilterType::Triangle,
            SmoothingQuality::Medium => FilterType::CatmullRom,
            SmoothingQuality::High => FilterType::Lanczos3,
        }
    }
}

impl std::str::FromStr for SmoothingQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(SmoothingQuality::Low),
            "medium" => Ok(SmoothingQuality::Medium),
            "high" => Ok(SmoothingQuality::High),
            other => Err(format!("unknown smoothing quality: {other}")),
        }
    }
}

/// Smoothing state of a [`Canvas`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSmoothing {
    pub enabled: bool,
    pub quality: SmoothingQuality,
}

impl Default for ImageSmoothing {
    fn default() -> Self {
        Self {
            enabled: true,
            quality: SmoothingQuality::Low,
        }
    }
}

impl ImageSmoothing {
    /// Filter used to resample drawn images.
    pub fn filter(self) -> FilterType {
        if self.enabled {
            self.quality.to_image_filter()
        } else {
            FilterType::Nearest
        }
    }
}

/// An RGBA drawing surface, initially fully transparent.
#[derive(Debug, Clone)]
pub struct Canvas {
    buffer: RgbaImage,
    smoothing: ImageSmoothing,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: RgbaImage::new(width, height),
            smoothing: ImageSmoothing::default(),
        }
    }

    /// Wrap an existing image as a canvas.
    ///
    /// Fails when the pixel buffer length does not match the dimensions.
    pub fn from_image(image: DecodedImage) -> Result<Self, CanvasError> {
        let (width, height, len) = (image.width, image.height, image.pixels.len());
        check_rgba_len(width, height, len)?;
        match image.into_rgba_image() {
            Some(buffer) => Ok(Self::from_rgba_image(buffer)),
            None => Err(CanvasError::InvalidPixelData {
                width,
                height,
                expected: width as usize * height as usize * 4,
                actual: len,
            }),
        }
    }

    pub fn from_rgba_image(buffer: RgbaImage) -> Self {
        Self {
            buffer,
            smoothing: ImageSmoothing::default(),
        }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn image_smoothing(&self) -> ImageSmoothing {
        self.smoothing
    }

    pub fn set_image_smoothing(&mut self, smoothing: ImageSmoothing) {
        self.smoothing = smoothing;
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.buffer.get_pixel(x, y).0
    }

    pub fn as_rgba_image(&self) -> &RgbaImage {
        &self.buffer
    }

    /// Raw RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Copy the surface out as a [`DecodedImage`].
    pub fn to_image(&self) -> DecodedImage {
        DecodedImage::from_rgba_image(self.buffer.clone())
    }

    /// Draw `image` resampled into the rectangle at `(dx, dy)` sized `dw` x `dh`,
    /// composited source-over. Parts outside the surface are clipped.
    ///
    /// Fails without drawing when `image`'s buffer does not match its size.
    pub fn draw_image(
        &mut self,
        image: &DecodedImage,
        dx: i64,
        dy: i64,
        dw: u32,
        dh: u32,
    ) -> Result<(), CanvasError> {
        check_rgba_len(image.width, image.height, image.pixels.len())?;
        if image.is_empty() || dw == 0 || dh == 0 || self.is_empty() {
            return Ok(());
        }
        let Some(mut src) = image.to_rgba_image() else {
            return Ok(());
        };

        if (src.width(), src.height()) != (dw, dh) {
            premultiply(&mut src);
            src = image::imageops::resize(&src, dw, dh, self.smoothing.filter());
            unpremultiply(&mut src);
        }

        self.composite(&src, dx, dy);
        Ok(())
    }

    fn composite(&mut self, layer: &RgbaImage, dx: i64, dy: i64) {
        let (cw, ch) = (self.width() as i64, self.height() as i64);

        for (lx, ly, px) in layer.enumerate_pixels() {
            let (x, y) = (dx + lx as i64, dy + ly as i64);
            if x < 0 || y < 0 || x >= cw || y >= ch {
                continue;
            }
            let dst = self.buffer.get_pixel_mut(x as u32, y as u32);
            dst.0 = source_over(dst.0, px.0);
        }
    }
}
