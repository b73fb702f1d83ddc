//! Random streams and sample jitter.
//!
//! Every unit of work owns its generator, seeded from the render seed, the
//! pixel coordinate and the sample index. Nothing random is shared between
//! threads, and renders of the same inputs are reproducible.

use facet_core::Config;
use facet_math::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Generate a random f32 in [0, 1).
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen()
}

/// Uniform random point inside the unit sphere (rejection sampled).
pub fn random_in_unit_sphere(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
        );
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// SplitMix64 finalizer.
#[inline]
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Seed for one pixel sample's random stream.
pub fn stream_seed(seed: u64, x: u32, y: u32, sample: u32) -> u64 {
    const GOLDEN: u64 = 0x9e37_79b9_7f4a_7c15;

    let mut h = mix64(seed.wrapping_add(GOLDEN));
    for word in [x, y, sample] {
        h = mix64(h ^ u64::from(word).wrapping_add(GOLDEN));
    }
    h
}

/// Random stream for one pixel sample.
pub fn pixel_rng(seed: u64, x: u32, y: u32, sample: u32) -> StdRng {
    StdRng::seed_from_u64(stream_seed(seed, x, y, sample))
}

/// Primary-ray jitter strategy.
pub trait SampleJitter: Send + Sync {
    /// Primary rays traced per pixel (at least 1).
    fn samples(&self) -> u32;

    /// Offset in pixels applied to the viewport sample of `sample`.
    fn offset(&self, sample: u32, rng: &mut dyn RngCore) -> Vec2;
}

/// One ray through the exact viewport point.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoJitter;

impl SampleJitter for NoJitter {
    fn samples(&self) -> u32 {
        1
    }

    fn offset(&self, _sample: u32, _rng: &mut dyn RngCore) -> Vec2 {
        Vec2::ZERO
    }
}

/// `rays` samples displaced uniformly within an `amount` pixel square.
#[derive(Clone, Copy, Debug)]
pub struct UniformJitter {
    pub amount: f32,
    pub rays: u32,
}

impl UniformJitter {
    pub fn new(amount: f32, rays: u32) -> Self {
        Self {
            amount,
            rays: rays.max(1),
        }
    }
}

impl SampleJitter for UniformJitter {
    fn samples(&self) -> u32 {
        self.rays
    }

    fn offset(&self, _sample: u32, rng: &mut dyn RngCore) -> Vec2 {
        let x = gen_f32(rng) - 0.5;
        let y = gen_f32(rng) - 0.5;
        Vec2::new(x, y) * self.amount
    }
}

/// Jitter strategy selected by the config's `jitter` and `jitter_rays`.
pub fn jitter_from_config(config: &Config) -> Box<dyn SampleJitter> {
    if config.jitter > 0.0 && config.jitter_rays > 1 {
        Box::new(UniformJitter::new(config.jitter, config.jitter_rays))
    } else {
        Box::new(NoJitter)
    }
}
