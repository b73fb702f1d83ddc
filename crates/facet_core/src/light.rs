//! Point lights with a radius for soft shadows.

use facet_math::Vec3;
use serde::{Deserialize, Serialize};

/// A spherical light source.
///
/// Shadow rays aim at random points within `radius` of `position`, so a
/// larger radius gives a wider penumbra. A radius of zero is a hard point light.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Light {
    pub position: Vec3,
    pub radius: f32,
    pub ambient_color: Vec3,
    pub diffuse_color: Vec3,
    pub specular_color: Vec3,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            radius: 0.0,
            ambient_color: Vec3::ZERO,
            diffuse_color: Vec3::ONE,
            specular_color: Vec3::ONE,
        }
    }
}

impl Light {
    /// Create a white point light.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_colors(mut self, ambient: Vec3, diffuse: Vec3, specular: Vec3) -> Self {
        self.ambient_color = ambient;
        self.diffuse_color = diffuse;
        self.specular_color = specular;
        self
    }

    /// True when shadow rays need random jitter.
    pub fn is_area(&self) -> bool {
        self.radius > 0.0
    }
}
