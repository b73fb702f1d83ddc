//! Flat triangle scene.
//!
//! The scene is built once by the loader and is read-only while rendering,
//! so it can be shared by reference across every worker thread.

use std::sync::Arc;

use crate::geometry::Triangle;
use crate::material::Material;

/// An ordered list of triangles plus the materials they reference.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Scene name (usually the source file stem)
    pub name: String,

    triangles: Vec<Triangle>,

    materials: Vec<Arc<Material>>,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            triangles: Vec::new(),
            materials: Vec::new(),
        }
    }

    /// Add a triangle, keeping insertion order.
    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Register a material and return the shared handle triangles should hold.
    pub fn add_material(&mut self, material: Material) -> Arc<Material> {
        let material = Arc::new(material);
        self.materials.push(material.clone());
        material
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn materials(&self) -> &[Arc<Material>] {
        &self.materials
    }

    /// Look up a material by name.
    pub fn material(&self, name: &str) -> Option<&Arc<Material>> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Number of zero-area triangles, which can never be hit.
    pub fn degenerate_count(&self) -> usize {
        self.triangles.iter().filter(|t| t.is_degenerate()).count()
    }
}

impl FromIterator<Triangle> for Scene {
    fn from_iter<I: IntoIterator<Item = Triangle>>(iter: I) -> Self {
        Self {
            triangles: iter.into_iter().collect(),
            ..Default::default()
        }
    }
}
