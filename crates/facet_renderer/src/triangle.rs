//! Ray-triangle intersection.
//!
//! Plane intersection followed by three same-side edge tests. Triangles are
//! two-sided: no backface culling is applied for either primary or shadow rays.

use crate::hittable::{HitRecord, Hittable};
use facet_core::Triangle;
use facet_math::{Interval, Ray, Vec3};

/// Hits closer than this to the ray origin are ignored.
///
/// Keeps rays leaving a surface from re-hitting the triangle they start on.
pub const PROXIMITY_TOLERANCE: f32 = 0.5;

/// Parameter where the ray crosses the triangle's plane.
///
/// Negative when the plane is behind the origin. Parallel rays and degenerate
/// triangles give a non-finite value.
pub fn candidate_time(ray: &Ray, triangle: &Triangle) -> f32 {
    let normal = triangle.normal();
    -(ray.origin() - triangle.p0()).dot(normal) / ray.direction().dot(normal)
}

/// Nearest forward hit time beyond [`PROXIMITY_TOLERANCE`], if any.
pub fn intersect(ray: &Ray, triangle: &Triangle) -> Option<f32> {
    triangle
        .hit(ray, Interval::new(PROXIMITY_TOLERANCE, ray.max_t()))
        .map(|rec| rec.t)
}

/// True if `point` lies on the inner side of every edge (edges inclusive).
fn inside(triangle: &Triangle, point: Vec3) -> bool {
    let [a, b, c] = [triangle.p0(), triangle.p1(), triangle.p2()];
    let normal = triangle.normal();

    [(a, b), (b, c), (c, a)]
        .into_iter()
        .all(|(from, to)| (to - from).cross(point - from).dot(normal) >= 0.0)
}

impl Hittable for Triangle {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let t = candidate_time(ray, self);

        // NaN and infinities (parallel or degenerate) fail `surrounds`
        if !t.is_finite() || !ray_t.surrounds(t) {
            return None;
        }

        let p = ray.at(t);
        if !inside(self, p) {
            return None;
        }

        Some(HitRecord {
            t,
            p,
            triangle: self,
            front_face: ray.direction().dot(self.normal()) < 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facing_x() -> Triangle {
        Triangle::from_positions(
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(2.0, 0.0, -1.0),
            Vec3::new(2.0, 0.0, 1.0),
        )
    }

    #[test]
    fn test_hit_along_x() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let t = intersect(&ray, &facing_x()).unwrap();
        assert!((t - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_reversed_ray_misses() {
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_X);
        let triangle = facing_x();

        assert!(intersect(&ray, &triangle).is_none());
        assert!((candidate_time(&ray, &triangle) + 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_hit_point_lies_on_plane() {
        let triangle = facing_x();
        let origins = [
            Vec3::new(-3.0, 0.2, 0.1),
            Vec3::new(-1.0, -2.0, 4.0),
            Vec3::new(7.0, 0.5, -0.5),
        ];
        let target = Vec3::new(2.0, 0.25, 0.1);

        for origin in origins {
            let ray = Ray::new(origin, target - origin);
            let rec = triangle.hit(&ray, Interval::new(PROXIMITY_TOLERANCE, f32::INFINITY));
            let rec = rec.expect("ray aimed inside the triangle should hit");
            let point = ray.at(rec.t);
            assert!(triangle.normal().dot(point - triangle.p0()).abs() < 1e-4);
            assert!((point - rec.p).length() < 1e-6);
        }
    }

    #[test]
    fn test_outside_edges_miss() {
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::X);
        assert!(intersect(&ray, &facing_x()).is_none());
    }

    #[test]
    fn test_parallel_ray_misses() {
        let ray = Ray::new(Vec3::new(2.0, 0.5, -5.0), Vec3::Z);
        assert!(intersect(&ray, &facing_x()).is_none());
    }

    #[test]
    fn test_degenerate_triangle_never_hits() {
        let collinear = Triangle::from_positions(
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
        );
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X);

        assert!(!candidate_time(&ray, &collinear).is_finite());
        assert!(intersect(&ray, &collinear).is_none());
    }

    #[test]
    fn test_hits_within_tolerance_are_ignored() {
        let ray = Ray::new(Vec3::new(1.75, 0.0, 0.0), Vec3::X);
        assert!(intersect(&ray, &facing_x()).is_none());
    }

    #[test]
    fn test_bounded_ray_stops_short() {
        let ray = Ray::with_max_length(Vec3::ZERO, Vec3::X, 1.5);
        assert!(intersect(&ray, &facing_x()).is_none());
    }

    #[test]
    fn test_edge_point_counts_as_hit() {
        // Aimed at the midpoint of the p1-p2 edge
        let ray = Ray::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
        assert!(intersect(&ray, &facing_x()).is_some());
    }
}
