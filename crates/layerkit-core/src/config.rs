//! Compositor configuration.
//!
//! Every field has a default, so a partial (or empty) JSON object
//! deserializes into a usable config.

use std::env::{self, VarError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canvas::{SmoothingQuality, DEFAULT_EXPORT_FORMAT, DEFAULT_EXPORT_QUALITY};
use crate::geometry::{calculate_image_dimensions, ImageDimensions, DEFAULT_SCALE_FACTOR};

/// Environment variable naming the path the app is served under.
pub const URL_PREFIX_PATH_VAR: &str = "URL_PREFIX_PATH";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("environment variable {0} is not valid unicode")]
    NotUnicode(&'static str),

    #[error("scale factor must be positive, got {0}")]
    InvalidScaleFactor(f64),

    #[error("device pixel ratio must be positive, got {0}")]
    InvalidPixelRatio(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompositorConfig {
    /// Share of the container an image is fitted to by
    /// [`fit_image`](Self::fit_image). Values above 1 overflow the container.
    pub scale_factor: f64,
    pub smoothing_quality: SmoothingQuality,
    /// MIME type of composed exports.
    pub export_format: String,
    pub export_quality: f64,
    pub device_pixel_ratio: f64,
    /// Path prefix the app is served under, without the leading slash.
    pub url_prefix_path: String,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            smoothing_quality: SmoothingQuality::default(),
            export_format: DEFAULT_EXPORT_FORMAT.to_string(),
            export_quality: DEFAULT_EXPORT_QUALITY,
            device_pixel_ratio: 1.0,
            url_prefix_path: String::new(),
        }
    }
}

impl CompositorConfig {
    /// Defaults, with the URL prefix taken from `URL_PREFIX_PATH` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Result<String, VarError>) -> Result<Self, ConfigError> {
        let url_prefix_path = match lookup(URL_PREFIX_PATH_VAR) {
            Ok(value) => value,
            Err(VarError::NotPresent) => String::new(),
            Err(VarError::NotUnicode(_)) => return Err(ConfigError::NotUnicode(URL_PREFIX_PATH_VAR)),
        };

        Ok(Self {
            url_prefix_path,
            ..Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(ConfigError::InvalidScaleFactor(self.scale_factor));
        }
        if !(self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0) {
            return Err(ConfigError::InvalidPixelRatio(self.device_pixel_ratio));
        }
        Ok(())
    }

    /// Fit an image into a container at this config's scale factor.
    pub fn fit_image(
        &self,
        original_width: f64,
        original_height: f64,
        container_width: f64,
        container_height: f64,
    ) -> ImageDimensions {
        calculate_image_dimensions(
            original_width,
            original_height,
            container_width,
            container_height,
            self.scale_factor,
        )
    }

    /// Public base path: `/<prefix>`, or `/` without a prefix.
    pub fn base_path(&self) -> String {
        format!("/{}", self.url_prefix_path.trim_start_matches('/'))
    }

    /// Resolve an asset path relative to [`base_path`](Self::base_path).
    pub fn asset_url(&self, relative: &str) -> String {
        let base = self.base_path();
        let relative = relative.trim_start_matches('/');
        if base.ends_with('/') {
            format!("{base}{relative}")
        } else {
            format!("{base}/{relative}")
        }
    }
}
