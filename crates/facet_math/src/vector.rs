use glam::Vec3;

/// Reflect `v` across the plane with unit normal `n`.
///
/// `reflect(v, n) = v - 2 * dot(v, n) * n`. The length of `v` is preserved
/// only when `n` is unit length.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}
