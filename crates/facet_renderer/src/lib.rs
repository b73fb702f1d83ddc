//! Facet renderer: CPU ray tracing of triangle scenes.
//!
//! Every pixel is an independent unit of work on the rayon pool. Shading is
//! local (ambient, diffuse, specular) with soft shadows from area lights;
//! reflection and refraction plug in through [`SecondaryShading`].

mod camera;
mod error;
mod hittable;
mod renderer;
mod sampling;
mod shading;
mod triangle;

pub use camera::Camera;
pub use error::{PixelFault, RenderError, RenderResult};
pub use hittable::{HitRecord, Hittable};
pub use renderer::{
    color_to_rgba, CancelToken, Color, ImageBuffer, LocalOnly, Renderer, SecondaryShading,
    BACKGROUND,
};
pub use sampling::{
    gen_f32, jitter_from_config, pixel_rng, random_in_unit_sphere, stream_seed, NoJitter,
    SampleJitter, UniformJitter,
};
pub use shading::{tone_map, Shader};
pub use triangle::{candidate_time, intersect, PROXIMITY_TOLERANCE};

/// Re-export common math types from facet_math
pub use facet_math::{Interval, Ray, Vec3, Vec4};
