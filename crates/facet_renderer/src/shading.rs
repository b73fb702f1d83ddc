//! Local illumination: ambient, diffuse and specular terms per light with
//! soft shadows from jittered shadow rays.

use crate::hittable::{HitRecord, Hittable};
use crate::sampling::random_in_unit_sphere;
use crate::triangle::PROXIMITY_TOLERANCE;
use crate::Color;
use facet_core::{Config, Light, Scene};
use facet_math::{reflect, Interval, Ray, Vec3};
use rand::RngCore;

/// Evaluates local shading at hit points for one render pass.
pub struct Shader<'a> {
    scene: &'a Scene,
    lights: &'a [Light],
    camera_position: Vec3,
    shadow_rays: u32,
    smooth_shading: bool,
}

impl<'a> Shader<'a> {
    pub fn new(scene: &'a Scene, config: &'a Config, camera_position: Vec3) -> Self {
        Self {
            scene,
            lights: &config.lights,
            camera_position,
            shadow_rays: config.shadow_rays,
            smooth_shading: config.smooth_shading,
        }
    }

    /// Tone-mapped color at a hit.
    ///
    /// A non-finite intermediate result is returned as-is so the caller can
    /// tell it apart from a valid color.
    pub fn shade(&self, hit: &HitRecord, rng: &mut dyn RngCore) -> Color {
        let triangle = hit.triangle;
        let p = hit.p;

        let base = triangle.color_at(p);
        let albedo = base.truncate();
        let normal = if self.smooth_shading {
            triangle.smooth_normal_at(p)
        } else {
            triangle.normal()
        };
        let exponent = triangle.specular_exponent_at(p);
        let view_dir = (self.camera_position - p).normalize_or_zero();

        let mut result = Vec3::ZERO;
        for light in self.lights {
            result += light.ambient_color * albedo;

            // A light sitting exactly on the surface only contributes ambient
            let Some(light_dir) = (light.position - p).try_normalize() else {
                continue;
            };

            let diffuse_term = light_dir.dot(normal).max(0.0);
            let diffuse = albedo * light.diffuse_color * diffuse_term;

            // Negative bases are clamped so fractional exponents stay finite
            let reflected = reflect(light_dir, normal).normalize_or_zero();
            let spec_base = reflected.dot(view_dir).max(0.0);
            let specular = (light.specular_color * spec_base).powf(exponent);

            result += (diffuse + specular) * self.visibility(p, light, rng);
        }

        tone_map(result.extend(base.w))
    }

    /// Fraction of shadow rays from `point` that reach `light` unblocked.
    ///
    /// With zero shadow rays occlusion is not tested and the light is fully
    /// visible.
    pub fn visibility(&self, point: Vec3, light: &Light, rng: &mut dyn RngCore) -> f32 {
        if self.shadow_rays == 0 {
            return 1.0;
        }

        let mut unblocked = 0u32;
        for _ in 0..self.shadow_rays {
            let target = if light.is_area() {
                light.position + random_in_unit_sphere(rng) * light.radius
            } else {
                light.position
            };

            let ray = Ray::between(point, target);
            if !self
                .scene
                .occludes(&ray, Interval::new(PROXIMITY_TOLERANCE, ray.max_t()))
            {
                unblocked += 1;
            }
        }

        unblocked as f32 / self.shadow_rays as f32
    }
}

/// Hue-preserving compression of RGB into [0, 1].
///
/// RGB is divided by `max(r, g, b, 1)`, negative channels become 0 and alpha
/// is clamped to [0, 1]. Non-finite input is returned unchanged.
pub fn tone_map(color: Color) -> Color {
    if !color.is_finite() {
        return color;
    }

    let scale = color.x.max(color.y).max(color.z).max(1.0);
    let rgb = (color.truncate() / scale).max(Vec3::ZERO);
    rgb.extend(Interval::UNIT.clamp(color.w))
}
