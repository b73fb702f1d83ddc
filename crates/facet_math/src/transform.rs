// Transform utilities for Mat4
//
// Extends glam::Mat4 with the homogeneous point transform and look-at
// construction the camera needs.

use glam::{Mat4, Vec3, Vec4};

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform a vector in 3D space (applies rotation and scale, but NOT translation).
    /// Vectors have an implicit w=0 component.
    fn transform_vector3(&self, vector: Vec3) -> Vec3;

    /// Transform a point in homogeneous coordinates and divide by the resulting w.
    ///
    /// When the resulting w is zero the point is at infinity and the xyz part
    /// is returned undivided.
    fn transform_point_homogeneous(&self, point: Vec3) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn transform_vector3(&self, vector: Vec3) -> Vec3 {
        let transformed = *self * Vec4::new(vector.x, vector.y, vector.z, 0.0);
        transformed.truncate()
    }

    fn transform_point_homogeneous(&self, point: Vec3) -> Vec3 {
        let transformed = *self * point.extend(1.0);
        if transformed.w == 0.0 {
            transformed.truncate()
        } else {
            transformed.truncate() / transformed.w
        }
    }
}

/// Build a right-handed view matrix from an up vector, an eye point and a target.
///
/// The result maps world space into a frame where the eye sits at the origin
/// looking down -Z with `up` along +Y.
pub fn look_at(up: Vec3, eye: Vec3, target: Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, target, up)
}
