//! Pinhole camera for primary ray generation.

use facet_core::{Config, Viewport};
use facet_math::{look_at, Mat4Ext, Ray, Vec2, Vec3};

/// Pinhole camera sitting behind a world-space viewport rectangle.
///
/// The eye is placed `output_height / (2 tan(fov / 2))` units behind the
/// viewport plane. Pixel `(x, y)` maps onto the viewport by stepping right and
/// down from its top-left corner.
#[derive(Clone, Debug)]
pub struct Camera {
    pub image_width: u32,
    pub image_height: u32,

    // Cached world-space frame
    eye: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
}

impl Camera {
    /// Build the camera for a viewport rendered at `width` x `height` pixels.
    pub fn new(viewport: &Viewport, width: u32, height: u32) -> Self {
        // Viewport-local frame: origin at the viewport center, looking down -Z
        let to_world = look_at(viewport.up, viewport.position, viewport.target()).inverse();

        let theta = viewport.field_of_view.to_radians();
        let eye_offset = height as f32 / (2.0 * (theta / 2.0).tan());
        let eye = to_world.transform_point_homogeneous(Vec3::new(0.0, 0.0, eye_offset));

        let upper_left = Vec3::new(-viewport.width / 2.0, viewport.height / 2.0, 0.0);
        let pixel00_loc = to_world.transform_point_homogeneous(upper_left);

        let pixel_delta_u = to_world.transform_vector3(Vec3::X * (viewport.width / width as f32));
        let pixel_delta_v =
            to_world.transform_vector3(Vec3::NEG_Y * (viewport.height / height as f32));

        Self {
            image_width: width,
            image_height: height,
            eye,
            pixel00_loc,
            pixel_delta_u,
            pixel_delta_v,
        }
    }

    /// Build the camera described by a render config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.viewport, config.output_width, config.output_height)
    }

    /// World-space eye position.
    pub fn position(&self) -> Vec3 {
        self.eye
    }

    /// Viewport-plane sample point for pixel coordinates (fractional allowed).
    pub fn viewport_point(&self, x: f32, y: f32) -> Vec3 {
        self.pixel00_loc + x * self.pixel_delta_u + y * self.pixel_delta_v
    }

    /// Primary ray for pixel `(x, y)`, displaced by `offset` pixels.
    pub fn get_ray(&self, x: u32, y: u32, offset: Vec2) -> Ray {
        let sample = self.viewport_point(x as f32 + offset.x, y as f32 + offset.y);
        Ray::new(self.eye, sample - self.eye)
    }
}
