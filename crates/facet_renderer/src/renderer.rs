//! Parallel per-pixel renderer.
//!
//! A render pass runs in four stages:
//! - Setup: camera, shader and jitter are built from the config
//! - Dispatch: one unit of work per pixel on the rayon pool, each producing
//!   only its own slot
//! - Join: rayon's `collect` waits for every unit
//! - Assemble: slots are copied into the image on the calling thread

use crate::camera::Camera;
use crate::error::{PixelFault, RenderError, RenderResult};
use crate::hittable::{HitRecord, Hittable};
use crate::sampling::{jitter_from_config, pixel_rng, SampleJitter};
use crate::shading::Shader;
use crate::triangle::PROXIMITY_TOLERANCE;
use facet_core::{Config, Scene};
use facet_math::{Interval, Ray, Vec4};
use rand::RngCore;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Linear RGBA color.
pub type Color = Vec4;

/// Color of rays that hit nothing (transparent black).
pub const BACKGROUND: Color = Vec4::ZERO;

/// Extension point for reflection and refraction.
///
/// Called with the locally shaded color of a hit while `depth < max_ray_depth`.
/// `trace` follows a secondary ray one level deeper.
pub trait SecondaryShading: Send + Sync {
    fn shade(
        &self,
        hit: &HitRecord,
        local: Color,
        trace: &mut dyn FnMut(&Ray) -> Color,
    ) -> Color;
}

/// Pure local shading; secondary rays are never traced.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalOnly;

impl SecondaryShading for LocalOnly {
    fn shade(
        &self,
        _hit: &HitRecord,
        local: Color,
        _trace: &mut dyn FnMut(&Ray) -> Color,
    ) -> Color {
        local
    }
}

/// Cooperative cancellation flag shared with a running render.
///
/// Checked before each pixel; pixels already in flight finish.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Output of one pixel's unit of work.
enum PixelSlot {
    Shaded(Color),
    /// Shading produced a non-finite value
    Degraded,
    /// Not rendered because the pass was cancelled
    Skipped,
    Faulted(PixelFault),
}

/// Ray tracer for one scene and config.
pub struct Renderer<'a> {
    scene: &'a Scene,
    config: &'a Config,
    camera: Camera,
    shader: Shader<'a>,
    jitter: Box<dyn SampleJitter>,
    secondary: Box<dyn SecondaryShading>,
    cancel: CancelToken,
}

impl<'a> Renderer<'a> {
    /// Set up a render pass, rejecting invalid render settings.
    pub fn new(scene: &'a Scene, config: &'a Config) -> RenderResult<Self> {
        config.validate_render_settings()?;

        let camera = Camera::from_config(config);
        let shader = Shader::new(scene, config, camera.position());

        Ok(Self {
            scene,
            config,
            camera,
            shader,
            jitter: jitter_from_config(config),
            secondary: Box::new(LocalOnly),
            cancel: CancelToken::new(),
        })
    }

    pub fn with_jitter(mut self, jitter: impl SampleJitter + 'static) -> Self {
        self.jitter = Box::new(jitter);
        self
    }

    pub fn with_secondary(mut self, secondary: impl SecondaryShading + 'static) -> Self {
        self.secondary = Box::new(secondary);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Color seen along `ray` at recursion level `depth`.
    ///
    /// Hits are always shaded locally; secondary shading only runs while
    /// `depth < max_ray_depth`.
    pub fn trace(&self, ray: &Ray, depth: u32, rng: &mut dyn RngCore) -> Color {
        let Some(hit) = self
            .scene
            .hit(ray, Interval::new(PROXIMITY_TOLERANCE, ray.max_t()))
        else {
            return BACKGROUND;
        };

        let local = self.shader.shade(&hit, rng);
        if depth >= self.config.max_ray_depth {
            return local;
        }

        let mut next = |secondary: &Ray| self.trace(secondary, depth + 1, rng);
        self.secondary.shade(&hit, local, &mut next)
    }

    /// Average color of pixel `(x, y)` over its jitter samples.
    ///
    /// May be non-finite; [`Renderer::render`] degrades such pixels.
    pub fn render_pixel(&self, x: u32, y: u32) -> Color {
        let samples = self.jitter.samples().max(1);

        let mut sum = Color::ZERO;
        for sample in 0..samples {
            let mut rng = pixel_rng(self.config.seed, x, y, sample);
            let offset = self.jitter.offset(sample, &mut rng);
            let ray = self.camera.get_ray(x, y, offset);
            sum += self.trace(&ray, 0, &mut rng);
        }

        sum / samples as f32
    }

    fn render_unit(&self, x: u32, y: u32) -> PixelSlot {
        if self.cancel.is_cancelled() {
            return PixelSlot::Skipped;
        }

        match panic::catch_unwind(AssertUnwindSafe(|| self.render_pixel(x, y))) {
            Ok(color) if color.is_finite() => PixelSlot::Shaded(color),
            Ok(_) => PixelSlot::Degraded,
            Err(payload) => PixelSlot::Faulted(PixelFault {
                x,
                y,
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    /// Render the full image.
    ///
    /// Faults in individual pixels do not stop the others; all of them are
    /// returned together once every pixel has run.
    pub fn render(&self) -> RenderResult<ImageBuffer> {
        let width = self.config.output_width;
        let height = self.config.output_height;

        log::info!(
            "Rendering {}x{} ({} triangles, {} lights, {} shadow rays, {} sample(s)/pixel) on {} threads",
            width,
            height,
            self.scene.triangle_count(),
            self.config.lights.len(),
            self.config.shadow_rays,
            self.jitter.samples(),
            rayon::current_num_threads()
        );
        let start = Instant::now();

        let pixel_count = width as usize * height as usize;
        let slots: Vec<PixelSlot> = (0..pixel_count)
            .into_par_iter()
            .map(|i| {
                let (x, y) = (i % width as usize, i / width as usize);
                self.render_unit(x as u32, y as u32)
            })
            .collect();

        let mut image = ImageBuffer::new(width, height);
        let mut faults = Vec::new();
        let mut degraded = 0usize;
        let mut skipped = 0usize;

        for (pixel, slot) in image.pixels.iter_mut().zip(slots) {
            match slot {
                PixelSlot::Shaded(color) => *pixel = color_to_rgba(color),
                PixelSlot::Degraded => degraded += 1,
                PixelSlot::Skipped => skipped += 1,
                PixelSlot::Faulted(fault) => faults.push(fault),
            }
        }

        if !faults.is_empty() {
            for fault in &faults {
                log::error!("Render fault at {}", fault);
            }
            return Err(RenderError::PixelFaults(faults));
        }

        if skipped > 0 {
            log::warn!("Render cancelled with {} of {} pixels skipped", skipped, pixel_count);
            return Err(RenderError::Cancelled);
        }

        if degraded > 0 {
            log::warn!(
                "{} pixel(s) produced non-finite colors and were set to background",
                degraded
            );
        }

        log::info!("Rendered {} pixels in {:.2?}", pixel_count, start.elapsed());
        Ok(image)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Convert a tone-mapped color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let channel = |c: f32| (Interval::UNIT.clamp(c) * 255.0).round() as u8;
    [
        channel(color.x),
        channel(color.y),
        channel(color.z),
        channel(color.w),
    ]
}

/// Row-major RGBA8 image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 4]>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with the background color.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![color_to_rgba(BACKGROUND); width as usize * height as usize],
        }
    }

    /// Pixels as a flat RGBA byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_core::{Light, Material, Triangle, Vertex, Viewport};
    use facet_math::Vec3;
    use std::sync::atomic::AtomicUsize;

    /// Quad in the z = 0 plane, facing +Z.
    fn quad(half: f32, material: Option<Arc<Material>>) -> Vec<Triangle> {
        let a = Vec3::new(-half, -half, 0.0);
        let b = Vec3::new(half, -half, 0.0);
        let c = Vec3::new(half, half, 0.0);
        let d = Vec3::new(-half, half, 0.0);
        [Triangle::from_positions(a, b, c), Triangle::from_positions(a, c, d)]
            .into_iter()
            .map(|t| match &material {
                Some(m) => t.with_material(m.clone()),
                None => t,
            })
            .collect()
    }

    fn small_config(lights: Vec<Light>) -> Config {
        Config {
            output_width: 16,
            output_height: 12,
            viewport: Viewport {
                position: Vec3::new(0.0, 0.0, 10.0),
                width: 16.0,
                height: 12.0,
                field_of_view: 90.0,
                up: Vec3::Y,
                target: None,
            },
            lights,
            ..Config::default()
        }
    }

    fn scene_with_blocker() -> Scene {
        let material = Arc::new(Material::new("red", Vec3::new(0.8, 0.2, 0.2)));
        let mut scene: Scene = quad(50.0, Some(material)).into_iter().collect();
        // Small shadow caster floating above the floor
        scene.add_triangle(Triangle::from_positions(
            Vec3::new(-1.0, -1.0, 2.0),
            Vec3::new(1.0, -1.0, 2.0),
            Vec3::new(0.0, 1.0, 2.0),
        ));
        scene
    }

    fn area_light() -> Light {
        Light::new(Vec3::new(0.0, 0.0, 6.0))
            .with_radius(1.5)
            .with_colors(Vec3::splat(0.1), Vec3::ONE, Vec3::ONE)
    }

    #[test]
    fn test_zero_lights_renders_background_level() {
        let scene: Scene = quad(50.0, None).into_iter().collect();
        let config = small_config(Vec::new());

        let image = Renderer::new(&scene, &config).unwrap().render().unwrap();
        assert_eq!(image.pixels.len(), 16 * 12);
        for px in &image.pixels {
            assert_eq!(&px[..3], &[0, 0, 0]);
        }
    }

    #[test]
    fn test_miss_is_transparent_background() {
        let scene = Scene::new("empty");
        let config = small_config(vec![area_light()]);

        let image = Renderer::new(&scene, &config).unwrap().render().unwrap();
        assert!(image.pixels.iter().all(|px| *px == [0, 0, 0, 0]));
    }

    #[test]
    fn test_point_light_render_is_byte_identical() {
        let scene = scene_with_blocker();
        let light = Light::new(Vec3::new(0.0, 0.0, 6.0));
        let config = small_config(vec![light]);

        let a = Renderer::new(&scene, &config).unwrap().render().unwrap();
        let b = Renderer::new(&scene, &config).unwrap().render().unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_soft_shadows_reproducible_per_seed() {
        let scene = scene_with_blocker();
        let mut config = small_config(vec![area_light()]);
        config.shadow_rays = 8;

        let a = Renderer::new(&scene, &config).unwrap().render().unwrap();
        let b = Renderer::new(&scene, &config).unwrap().render().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_shadow_visible_under_blocker() {
        let scene = scene_with_blocker();
        let light =
            Light::new(Vec3::new(0.0, 0.0, 6.0)).with_colors(Vec3::ZERO, Vec3::ONE, Vec3::ZERO);
        let config = small_config(vec![light]);
        let renderer = Renderer::new(&scene, &config).unwrap();

        // The corner pixel sees open floor
        let corner = renderer.render_pixel(0, 0);
        assert!(corner.x > 0.0);

        // Floor directly below the blocker is in full shadow
        let mut rng = pixel_rng(0, 0, 0, 0);
        let below = Ray::new(Vec3::new(0.1, 0.2, 1.0), Vec3::NEG_Z);
        let color = renderer.trace(&below, 0, &mut rng);
        assert_eq!(color.truncate(), Vec3::ZERO);
    }

    #[test]
    fn test_invalid_config_rejected_before_rendering() {
        let scene = Scene::new("empty");
        let mut config = small_config(Vec::new());
        config.output_width = 0;

        assert!(matches!(
            Renderer::new(&scene, &config),
            Err(RenderError::Config(_))
        ));
    }

    #[test]
    fn test_cancelled_render() {
        let scene = scene_with_blocker();
        let config = small_config(vec![area_light()]);
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = Renderer::new(&scene, &config)
            .unwrap()
            .with_cancel_token(cancel)
            .render();
        assert!(matches!(result, Err(RenderError::Cancelled)));
    }

    struct Exploding;

    impl SecondaryShading for Exploding {
        fn shade(
            &self,
            hit: &HitRecord,
            local: Color,
            _trace: &mut dyn FnMut(&Ray) -> Color,
        ) -> Color {
            if hit.p.x > 0.0 {
                panic!("exploded at {:?}", hit.p);
            }
            local
        }
    }

    #[test]
    fn test_pixel_faults_are_all_collected() {
        let scene: Scene = quad(50.0, None).into_iter().collect();
        let config = small_config(vec![Light::new(Vec3::new(0.0, 0.0, 6.0))]);

        let result = Renderer::new(&scene, &config)
            .unwrap()
            .with_secondary(Exploding)
            .render();

        let Err(RenderError::PixelFaults(faults)) = result else {
            panic!("expected pixel faults");
        };

        // Every pixel right of center faulted, none left of it did
        assert!(faults.len() >= 7 * 12);
        assert!(faults.iter().all(|f| f.x >= 8));
        assert!(faults.iter().all(|f| f.message.contains("exploded")));
        assert!(faults.windows(2).all(|w| (w[0].y, w[0].x) < (w[1].y, w[1].x)));
    }

    /// Follows one mirror bounce per hit and counts invocations.
    struct Mirror {
        calls: Arc<AtomicUsize>,
    }

    impl SecondaryShading for Mirror {
        fn shade(
            &self,
            hit: &HitRecord,
            local: Color,
            trace: &mut dyn FnMut(&Ray) -> Color,
        ) -> Color {
            self.calls.fetch_add(1, Ordering::Relaxed);
            // Both mirrors face the gap between them
            let bounce = Ray::new(hit.p, hit.triangle.normal());
            (local + trace(&bounce)) * 0.5
        }
    }

    #[test]
    fn test_secondary_depth_is_bounded() {
        // Two parallel mirrors facing each other
        let mut scene: Scene = quad(50.0, None).into_iter().collect();
        for t in quad(50.0, None) {
            let [a, b, c] = [t.p0(), t.p1(), t.p2()];
            let lift = Vec3::new(0.0, 0.0, 5.0);
            scene.add_triangle(Triangle::from_positions(a + lift, c + lift, b + lift));
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let mut config = small_config(Vec::new());
        config.max_ray_depth = 4;
        let renderer = Renderer::new(&scene, &config)
            .unwrap()
            .with_secondary(Mirror { calls: calls.clone() });

        // Start between the mirrors heading down
        let mut rng = pixel_rng(0, 0, 0, 0);
        let ray = Ray::new(Vec3::new(1.0, 2.0, 2.5), Vec3::NEG_Z);
        renderer.trace(&ray, 0, &mut rng);

        assert_eq!(calls.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn test_zero_depth_still_shades_hits() {
        let scene: Scene = quad(50.0, None).into_iter().collect();
        let mut config = small_config(vec![Light::new(Vec3::new(0.0, 0.0, 6.0))]);
        config.max_ray_depth = 0;
        let renderer = Renderer::new(&scene, &config).unwrap();

        let mut rng = pixel_rng(0, 0, 0, 0);
        let ray = Ray::new(Vec3::new(1.0, 2.0, 5.0), Vec3::NEG_Z);
        let color = renderer.trace(&ray, 0, &mut rng);
        assert!(color.truncate().max_element() > 0.0);
        assert_eq!(color.w, 1.0);

        // Without secondary shading, depth does not change the image
        let shallow = renderer.render().unwrap();
        config.max_ray_depth = 1;
        let deep = Renderer::new(&scene, &config).unwrap().render().unwrap();
        assert_eq!(shallow, deep);
        assert!(shallow.pixels.iter().any(|px| px[0] > 0));
    }

    #[test]
    fn test_secondary_ray_at_limit_sees_surface() {
        // Mirror above a lit floor, bouncing straight down onto it
        let mut scene: Scene = quad(50.0, None).into_iter().collect();
        for t in quad(5.0, None) {
            let [a, b, c] = [t.p0(), t.p1(), t.p2()];
            let lift = Vec3::new(0.0, 0.0, 5.0);
            scene.add_triangle(Triangle::from_positions(a + lift, c + lift, b + lift));
        }

        let mut config = small_config(vec![Light::new(Vec3::new(20.0, 0.0, 3.0))]);
        config.max_ray_depth = 1;
        let calls = Arc::new(AtomicUsize::new(0));
        let renderer = Renderer::new(&scene, &config)
            .unwrap()
            .with_secondary(Mirror { calls: calls.clone() });

        // Hits the mirror's underside first, bounces down onto the floor
        let mut rng = pixel_rng(0, 0, 0, 0);
        let ray = Ray::new(Vec3::new(1.0, 2.0, 1.0), Vec3::Z);
        let color = renderer.trace(&ray, 0, &mut rng);

        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert!(color.truncate().max_element() > 0.0);
    }

    #[test]
    fn test_jittered_render_softens_edges() {
        // Floor only covers x >= 0, so column 8 straddles its edge
        let a = Vec3::new(0.0, -50.0, 0.0);
        let b = Vec3::new(50.0, -50.0, 0.0);
        let c = Vec3::new(50.0, 50.0, 0.0);
        let d = Vec3::new(0.0, 50.0, 0.0);
        let scene: Scene = [(a, b, c), (a, c, d)]
            .into_iter()
            .map(|(p0, p1, p2)| Triangle::from_positions(p0, p1, p2))
            .collect();

        let mut config = small_config(vec![Light::new(Vec3::new(10.0, 0.0, 6.0))]);
        config.jitter = 0.5;
        config.jitter_rays = 4;
        let renderer = Renderer::new(&scene, &config).unwrap();
        assert_eq!(renderer.jitter.samples(), 4);

        let image = renderer.render().unwrap();
        let alpha = |x: u32, y: u32| image.pixels[(y * image.width + x) as usize][3];

        assert!((0..12).all(|y| alpha(2, y) == 0));
        assert!((0..12).all(|y| alpha(14, y) == 255));
        assert!((0..12).any(|y| alpha(8, y) > 0 && alpha(8, y) < 255));

        // Same seed, same image
        let again = Renderer::new(&scene, &config).unwrap().render().unwrap();
        assert_eq!(image, again);
    }

    #[test]
    fn test_smooth_shading_uses_vertex_normals() {
        let tilted = Vec3::new(1.0, 0.0, 1.0).normalize();
        let corner = |x: f32, y: f32| Vertex::new(Vec3::new(x, y, 0.0)).with_normal(tilted);
        let scene: Scene = vec![
            Triangle::new(corner(-50.0, -50.0), corner(50.0, -50.0), corner(50.0, 50.0)),
            Triangle::new(corner(-50.0, -50.0), corner(50.0, 50.0), corner(-50.0, 50.0)),
        ]
        .into_iter()
        .collect();

        let light =
            Light::new(Vec3::new(0.0, 0.0, 100.0)).with_colors(Vec3::ZERO, Vec3::ONE, Vec3::ZERO);
        let mut config = small_config(vec![light]);

        let flat = Renderer::new(&scene, &config).unwrap().render_pixel(8, 6);
        assert!((flat.x - 1.0).abs() < 1e-3);

        config.smooth_shading = true;
        let smooth = Renderer::new(&scene, &config).unwrap().render_pixel(8, 6);
        assert!((smooth.x - tilted.z).abs() < 1e-3);
    }

    #[test]
    fn test_color_to_rgba_rounds() {
        assert_eq!(color_to_rgba(Vec4::new(1.0, 0.5, 0.0, 1.0)), [255, 128, 0, 255]);
        assert_eq!(color_to_rgba(Vec4::new(2.0, -1.0, 0.2, 0.0)), [255, 0, 51, 0]);
    }

    #[test]
    fn test_image_bytes_layout() {
        let mut image = ImageBuffer::new(2, 1);
        image.pixels[1] = [1, 2, 3, 4];
        assert_eq!(image.as_bytes(), &[0, 0, 0, 0, 1, 2, 3, 4]);
    }
}
