//! Surface materials and their per-texel overrides.
//!
//! Maps to one `newmtl` block of a material library. Every flat property can
//! be overridden by a texture map sampled at the surface's interpolated UV.

use std::sync::Arc;

use facet_math::{Vec2, Vec3, Vec4};

use crate::texture::Texture;

/// Specular exponent used when neither a map nor a flat value is given.
pub const DEFAULT_SPECULAR_EXPONENT: f32 = 1.0;

/// A material definition with optional texture maps.
#[derive(Clone, Debug)]
pub struct Material {
    /// Material name (from `newmtl`)
    pub name: String,

    /// Ambient color (Ka)
    pub ambient_color: Vec3,

    /// Diffuse color (Kd)
    pub diffuse_color: Vec3,

    /// Specular color (Ks)
    pub specular_color: Vec3,

    /// Specular exponent (Ns)
    pub specular_exponent: Option<f32>,

    /// Transparency (0=opaque, 1=fully transparent)
    pub transparency: f32,

    pub ambient_map: Option<Arc<Texture>>,
    pub diffuse_map: Option<Arc<Texture>>,
    pub specular_map: Option<Arc<Texture>>,
    pub specular_exponent_map: Option<Arc<Texture>>,
    pub alpha_map: Option<Arc<Texture>>,

    /// Loaded but not used by local shading
    pub bump_map: Option<Arc<Texture>>,
    pub displacement_map: Option<Arc<Texture>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient_color: Vec3::ZERO,
            diffuse_color: Vec3::ONE,
            specular_color: Vec3::ZERO,
            specular_exponent: None,
            transparency: 0.0,
            ambient_map: None,
            diffuse_map: None,
            specular_map: None,
            specular_exponent_map: None,
            alpha_map: None,
            bump_map: None,
            displacement_map: None,
        }
    }
}

/// Sample an optional map, treating a missing or empty map as absent.
fn sample(map: &Option<Arc<Texture>>, uv: Vec2) -> Option<Vec4> {
    map.as_deref().and_then(|t| t.sample(uv))
}

impl Material {
    /// Create a new material with just a name and diffuse color.
    pub fn new(name: impl Into<String>, diffuse_color: Vec3) -> Self {
        Self {
            name: name.into(),
            diffuse_color,
            ..Default::default()
        }
    }

    pub fn ambient_at(&self, uv: Vec2) -> Vec3 {
        sample(&self.ambient_map, uv).map_or(self.ambient_color, |t| t.truncate())
    }

    pub fn diffuse_at(&self, uv: Vec2) -> Vec3 {
        sample(&self.diffuse_map, uv).map_or(self.diffuse_color, |t| t.truncate())
    }

    pub fn specular_at(&self, uv: Vec2) -> Vec3 {
        sample(&self.specular_map, uv).map_or(self.specular_color, |t| t.truncate())
    }

    /// Specular exponent from the red channel of the exponent map, else the
    /// flat exponent, else [`DEFAULT_SPECULAR_EXPONENT`].
    pub fn specular_exponent_at(&self, uv: Vec2) -> f32 {
        sample(&self.specular_exponent_map, uv)
            .map(|t| t.x)
            .or(self.specular_exponent)
            .unwrap_or(DEFAULT_SPECULAR_EXPONENT)
    }

    /// Opacity from the red channel of the alpha map, else `1 - transparency`.
    pub fn alpha_at(&self, uv: Vec2) -> f32 {
        sample(&self.alpha_map, uv).map_or(1.0 - self.transparency, |t| t.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> Arc<Texture> {
        // Left texel dark, right texel bright
        Arc::new(Texture::new(
            2,
            1,
            vec![[0.25, 0.0, 0.0, 1.0], [0.75, 1.0, 1.0, 1.0]],
            "gradient",
        ))
    }

    #[test]
    fn test_flat_values_without_maps() {
        let mut mat = Material::new("red", Vec3::new(1.0, 0.0, 0.0));
        mat.specular_exponent = Some(32.0);
        mat.transparency = 0.25;

        let uv = Vec2::new(0.3, 0.7);
        assert_eq!(mat.diffuse_at(uv), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(mat.specular_exponent_at(uv), 32.0);
        assert!((mat.alpha_at(uv) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_default_specular_exponent() {
        let mat = Material::default();
        assert_eq!(mat.specular_exponent_at(Vec2::ZERO), DEFAULT_SPECULAR_EXPONENT);
    }

    #[test]
    fn test_maps_override_flat_values() {
        let mat = Material {
            diffuse_map: Some(gradient()),
            specular_exponent_map: Some(gradient()),
            ambient_map: Some(gradient()),
            ..Material::new("textured", Vec3::ONE)
        };

        assert_eq!(mat.diffuse_at(Vec2::new(0.1, 0.0)), Vec3::new(0.25, 0.0, 0.0));
        assert_eq!(mat.diffuse_at(Vec2::new(0.6, 0.0)), Vec3::new(0.75, 1.0, 1.0));
        assert_eq!(mat.ambient_at(Vec2::new(0.6, 0.0)), Vec3::new(0.75, 1.0, 1.0));
        assert_eq!(mat.specular_exponent_at(Vec2::new(0.1, 0.0)), 0.25);
        // Unmapped properties keep their flat value
        assert_eq!(mat.specular_at(Vec2::new(0.6, 0.0)), Vec3::ZERO);
    }

    #[test]
    fn test_empty_map_fails_closed() {
        let mat = Material {
            diffuse_map: Some(Arc::new(Texture::new(0, 0, Vec::new(), "unresolved"))),
            ..Material::new("broken", Vec3::new(0.0, 0.5, 0.0))
        };
        assert_eq!(mat.diffuse_at(Vec2::new(0.5, 0.5)), Vec3::new(0.0, 0.5, 0.0));
    }
}
