//! facet core - scene model, materials and configuration.
//!
//! This crate provides:
//!
//! - **Geometry**: `Vertex`, `Triangle` with per-point material queries
//! - **Materials**: `Material`, `Texture`, `TextureCache`
//! - **Scene**: a flat, read-only list of triangles
//! - **Configuration**: `Config`, `Viewport`, `Light` loaded from JSON
//! - **Loading**: OBJ/MTL files to `Scene`
//!
//! # Example
//!
//! ```ignore
//! use facet_core::{load_obj, Config, TextureCache};
//!
//! let config = Config::load("render.json")?;
//! if let Some(obj) = &config.obj_file {
//!     let scene = load_obj(obj, &mut TextureCache::new())?;
//!     println!("Loaded {} triangles", scene.triangle_count());
//! }
//! ```

pub mod config;
pub mod geometry;
pub mod light;
pub mod loader;
pub mod material;
pub mod scene;
pub mod texture;

// Re-export commonly used types
pub use config::{Config, ConfigError, ConfigResult, Viewport};
pub use geometry::{Triangle, Vertex};
pub use light::Light;
pub use loader::{load_obj, load_obj_from_reader, LoadError, LoadResult};
pub use material::Material;
pub use scene::Scene;
pub use texture::{Texture, TextureCache, TextureError};
