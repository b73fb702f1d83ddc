//! facet: render an OBJ scene described by a JSON config to an image file.
//!
//! Usage: `facet <config.json> [output.png]`

use anyhow::{bail, Context, Result};
use facet_core::{load_obj, Config, TextureCache};
use facet_renderer::Renderer;
use std::path::PathBuf;
use std::time::Instant;

const DEFAULT_OUTPUT: &str = "output.png";

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args_os().skip(1);
    let Some(config_path) = args.next().map(PathBuf::from) else {
        bail!("usage: facet <config.json> [output.png]");
    };
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let start = Instant::now();
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    log::info!("Config loaded in {:.2?}", start.elapsed());

    let obj_file = config
        .obj_file
        .clone()
        .context("Config has no scene file")?;

    let start = Instant::now();
    let mut textures = TextureCache::new();
    let scene = load_obj(&obj_file, &mut textures)
        .with_context(|| format!("Failed to load scene {}", obj_file.display()))?;
    log::info!(
        "Scene loaded in {:.2?} ({} textures, {:.1} MB)",
        start.elapsed(),
        textures.len(),
        textures.total_size_bytes() as f64 / (1024.0 * 1024.0)
    );

    let renderer = Renderer::new(&scene, &config).context("Failed to set up renderer")?;
    let image = renderer.render().context("Render failed")?;

    let start = Instant::now();
    let rgba = image::RgbaImage::from_raw(image.width, image.height, image.as_bytes().to_vec())
        .context("Rendered buffer does not match image dimensions")?;

    // JPEG has no alpha channel
    let is_jpeg = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
    let saved = if is_jpeg {
        image::DynamicImage::ImageRgba8(rgba).to_rgb8().save(&output)
    } else {
        rgba.save(&output)
    };
    saved.with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("Wrote {} in {:.2?}", output.display(), start.elapsed());

    Ok(())
}
