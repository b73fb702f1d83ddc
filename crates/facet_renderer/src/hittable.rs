//! Hittable trait and HitRecord for ray-object intersection.

use facet_core::{Scene, Triangle};
use facet_math::{Interval, Ray, Vec3};

/// Record of a ray-triangle intersection.
#[derive(Clone, Copy, Debug)]
pub struct HitRecord<'a> {
    /// Distance along the ray
    pub t: f32,
    /// Point of intersection
    pub p: Vec3,
    /// The triangle that was hit
    pub triangle: &'a Triangle,
    /// Whether the ray hit the front face (the side the normal points to)
    pub front_face: bool,
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Test if a ray hits this object strictly inside `ray_t`.
    ///
    /// Returns the nearest such hit.
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>>;

    /// True if anything lies strictly inside `ray_t` along the ray.
    ///
    /// Shadow rays only need a yes/no answer, so implementors may stop at the
    /// first hit instead of searching for the nearest.
    fn occludes(&self, ray: &Ray, ray_t: Interval) -> bool {
        self.hit(ray, ray_t).is_some()
    }
}

/// Brute-force scan over every triangle in the scene.
impl Hittable for Scene {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let mut closest: Option<HitRecord<'a>> = None;
        let mut closest_so_far = ray_t.max;

        for triangle in self.triangles() {
            let interval = Interval::new(ray_t.min, closest_so_far);
            if let Some(rec) = triangle.hit(ray, interval) {
                closest_so_far = rec.t;
                closest = Some(rec);
            }
        }

        closest
    }

    fn occludes(&self, ray: &Ray, ray_t: Interval) -> bool {
        self.triangles().iter().any(|t| t.hit(ray, ray_t).is_some())
    }
}
