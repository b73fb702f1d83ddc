//! Render configuration.
//!
//! A `Config` is loaded once from JSON, validated, and then treated as an
//! immutable snapshot for the whole render pass.

use std::path::{Path, PathBuf};

use facet_math::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::light::Light;

/// Errors that can occur while loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing path to the .obj scene file")]
    MissingSceneFile,

    #[error("Output dimensions must be positive, got {width}x{height}")]
    InvalidOutputSize { width: u32, height: u32 },

    #[error("Viewport dimensions must be positive, got {width}x{height}")]
    InvalidViewportSize { width: f32, height: f32 },

    #[error("Field of view must be within (0, 180) degrees, got {0}")]
    InvalidFieldOfView(f32),

    #[error("Viewport target coincides with its position")]
    DegenerateViewport,

    #[error("Light {index} has invalid radius {radius}")]
    InvalidLightRadius { index: usize, radius: f32 },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// The world-space rectangle the image plane maps onto.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    /// Center of the viewport rectangle
    pub position: Vec3,

    /// Width in world units
    pub width: f32,

    /// Height in world units
    pub height: f32,

    /// Vertical field of view in degrees
    pub field_of_view: f32,

    /// Up direction of the viewport
    pub up: Vec3,

    /// Point the viewport faces; `None` looks down -Z
    pub target: Option<Vec3>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            width: 4.0,
            height: 3.0,
            field_of_view: 60.0,
            up: Vec3::Y,
            target: None,
        }
    }
}

impl Viewport {
    /// The point the viewport faces.
    pub fn target(&self) -> Vec3 {
        self.target.unwrap_or(self.position + Vec3::NEG_Z)
    }
}

/// Parameters for one render pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the .obj scene file
    pub obj_file: Option<PathBuf>,

    /// Output image width in pixels
    pub output_width: u32,

    /// Output image height in pixels
    pub output_height: u32,

    pub viewport: Viewport,

    /// Maximum recursion depth of traced rays
    pub max_ray_depth: u32,

    /// Shadow rays per light; 0 disables occlusion testing
    pub shadow_rays: u32,

    /// Primary-ray jitter in pixels
    pub jitter: f32,

    /// Primary rays per pixel when jitter is enabled
    pub jitter_rays: u32,

    pub lights: Vec<Light>,

    /// Interpolate vertex normals when every vertex of a triangle has one
    pub smooth_shading: bool,

    /// Seed for the per-pixel random streams
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            obj_file: None,
            output_width: 640,
            output_height: 480,
            viewport: Viewport::default(),
            max_ray_depth: 1,
            shadow_rays: 1,
            jitter: 0.0,
            jitter_rays: 1,
            lights: Vec::new(),
            smooth_shading: false,
            seed: 0,
        }
    }
}

impl Config {
    /// Load and fully validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_json(&text)?;

        // Scene paths are relative to the config file
        if let (Some(obj), Some(dir)) = (&config.obj_file, path.parent()) {
            if obj.is_relative() {
                config.obj_file = Some(dir.join(obj));
            }
        }

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and fully validate a JSON config.
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field, including the scene path.
    pub fn validate(&self) -> ConfigResult<()> {
        match &self.obj_file {
            Some(path) if !path.as_os_str().is_empty() => {}
            _ => return Err(ConfigError::MissingSceneFile),
        }
        self.validate_render_settings()
    }

    /// Check the fields a renderer needs once the scene is already loaded.
    pub fn validate_render_settings(&self) -> ConfigResult<()> {
        if self.output_width == 0 || self.output_height == 0 {
            return Err(ConfigError::InvalidOutputSize {
                width: self.output_width,
                height: self.output_height,
            });
        }

        let vp = &self.viewport;
        if !(vp.width > 0.0 && vp.height > 0.0) {
            return Err(ConfigError::InvalidViewportSize {
                width: vp.width,
                height: vp.height,
            });
        }

        if !(vp.field_of_view > 0.0 && vp.field_of_view < 180.0) {
            return Err(ConfigError::InvalidFieldOfView(vp.field_of_view));
        }

        if (vp.target() - vp.position).length_squared() == 0.0
            || vp.up.cross(vp.target() - vp.position).length_squared() == 0.0
        {
            return Err(ConfigError::DegenerateViewport);
        }

        for (index, light) in self.lights.iter().enumerate() {
            if !(light.radius >= 0.0 && light.radius.is_finite()) {
                return Err(ConfigError::InvalidLightRadius {
                    index,
                    radius: light.radius,
                });
            }
        }

        Ok(())
    }
}
