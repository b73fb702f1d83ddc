use crate::Vec3;

/// A ray in 3D space with an origin, a unit direction and an optional length.
///
/// The direction is normalized on construction, so the parameter `t` passed to
/// [`Ray::at`] is a world-space distance from the origin. A zero direction
/// stays zero; such a ray never reports a finite hit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub max_length: Option<f32>,
}

impl Ray {
    /// Create a new unbounded ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            max_length: None,
        }
    }

    /// Create a ray that only extends `max_length` units from its origin.
    ///
    /// Used for shadow rays, where anything past the light does not occlude.
    pub fn with_max_length(origin: Vec3, direction: Vec3, max_length: f32) -> Self {
        Self {
            max_length: Some(max_length),
            ..Self::new(origin, direction)
        }
    }

    /// Create a ray from `origin` towards `target`, bounded by their distance.
    pub fn between(origin: Vec3, target: Vec3) -> Self {
        let offset = target - origin;
        Self::with_max_length(origin, offset, offset.length())
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Farthest parameter this ray reaches (infinity when unbounded).
    #[inline]
    pub fn max_t(&self) -> f32 {
        self.max_length.unwrap_or(f32::INFINITY)
    }

    /// Get the point along the ray at distance t.
    ///
    /// Returns: origin + t * direction
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
