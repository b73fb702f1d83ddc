// Re-export glam for convenience
pub use glam::*;

// facet math types
mod interval;
mod matrix;
mod ray;
mod transform;
mod vector;

pub use interval::Interval;
pub use matrix::{MathError, MathResult, Matrix};
pub use ray::Ray;
pub use transform::{look_at, Mat4Ext};
pub use vector::reflect;
