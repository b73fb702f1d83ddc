//! OBJ/MTL scene loading.
//!
//! Converts a Wavefront OBJ file and its material libraries into a flat
//! [`Scene`] of triangles. All validation happens here so the renderer only
//! ever sees a fully resolved scene:
//!
//! - faces must be triangles (`f a b c`)
//! - vertex, texcoord and normal indices must be in range
//! - every `usemtl` must name a loaded material
//! - every texture map must decode
//!
//! Texcoord and normal indices are optional per face (`f 1//5 2//6 3//7`).
//! tobj fills the gaps with a neighbouring index, so the face tokens are
//! scanned separately to know which corners really carry each attribute.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use facet_math::{Vec2, Vec3};
use thiserror::Error;

use crate::geometry::{Triangle, Vertex};
use crate::material::Material;
use crate::scene::Scene;
use crate::texture::{Texture, TextureCache, TextureError};

/// Errors that can occur while loading a scene.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("OBJ parse error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("Material library error: {0}")]
    MaterialLibrary(tobj::LoadError),

    #[error("Only triangle faces are supported, model '{model}' has a face with {arity} vertices")]
    UnsupportedFaceArity { model: String, arity: u32 },

    #[error("Model '{model}' references {kind} index {index} but only {count} exist")]
    IndexOutOfRange {
        model: String,
        kind: &'static str,
        index: usize,
        count: usize,
    },

    #[error("Model '{model}' references unknown material #{id}")]
    UnknownMaterial { model: String, id: usize },

    #[error("Material '{material}' texture: {source}")]
    Texture {
        material: String,
        #[source]
        source: TextureError,
    },
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: false,
        triangulate: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Load an OBJ file and return a Scene.
///
/// Material libraries and texture maps resolve relative to the OBJ file's
/// directory.
///
/// # Example
///
/// ```ignore
/// use facet_core::{load_obj, TextureCache};
///
/// let mut textures = TextureCache::new();
/// let scene = load_obj("scenes/cornell.obj", &mut textures)?;
/// println!("Loaded {} triangles", scene.triangle_count());
/// ```
pub fn load_obj<P: AsRef<Path>>(path: P, textures: &mut TextureCache) -> LoadResult<Scene> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed");
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    textures.set_base_dir(base_dir.clone());
    load_obj_from_reader(name, &mut reader, textures, |mtl_path| {
        tobj::load_mtl(base_dir.join(mtl_path))
    })
}

/// Load an OBJ from any buffered reader.
///
/// `material_loader` receives each `mtllib` path as written in the file.
pub fn load_obj_from_reader<B, ML>(
    name: &str,
    reader: &mut B,
    textures: &mut TextureCache,
    material_loader: ML,
) -> LoadResult<Scene>
where
    B: BufRead,
    ML: Fn(&Path) -> tobj::MTLLoadResult,
{
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|source| LoadError::Io {
            path: PathBuf::from(name),
            source,
        })?;

    let corners = scan_face_corners(&text);
    let (models, materials) =
        tobj::load_obj_buf(&mut text.as_bytes(), &load_options(), material_loader)?;

    let mut scene = Scene::new(name);

    // A broken material library only matters if a face uses it
    let materials = match materials {
        Ok(materials) => materials,
        Err(e) => {
            if models.iter().any(|m| m.mesh.material_id.is_some()) {
                return Err(LoadError::MaterialLibrary(e));
            }
            log::warn!("Ignoring material library error, no face uses a material: {}", e);
            Vec::new()
        }
    };

    let resolved: Vec<Arc<Material>> = materials
        .iter()
        .map(|m| convert_material(m, textures).map(|m| scene.add_material(m)))
        .collect::<LoadResult<_>>()?;

    // Models come out in file order, each owning the next run of corners
    let mut corners = corners.as_slice();
    for model in &models {
        let (own, rest) = corners.split_at(model.mesh.indices.len().min(corners.len()));
        add_model(&mut scene, model, &resolved, own)?;
        corners = rest;
    }

    let degenerate = scene.degenerate_count();
    if degenerate > 0 {
        log::warn!(
            "Scene '{}' has {} degenerate triangle(s); they will never be hit",
            scene.name,
            degenerate
        );
    }

    log::info!(
        "Loaded scene '{}': {} triangles, {} materials, {} textures",
        scene.name,
        scene.triangle_count(),
        scene.materials().len(),
        textures.len()
    );

    Ok(scene)
}

/// Convert one tobj model into triangles.
fn add_model(
    scene: &mut Scene,
    model: &tobj::Model,
    materials: &[Arc<Material>],
    corners: &[CornerAttributes],
) -> LoadResult<()> {
    let mesh = &model.mesh;

    // face_arities is only filled when some face is not a triangle
    if let Some(&arity) = mesh.face_arities.iter().find(|&&a| a != 3) {
        return Err(LoadError::UnsupportedFaceArity {
            model: model.name.clone(),
            arity,
        });
    }

    let material = match mesh.material_id {
        Some(id) => Some(
            materials
                .get(id)
                .cloned()
                .ok_or_else(|| LoadError::UnknownMaterial {
                    model: model.name.clone(),
                    id,
                })?,
        ),
        None => None,
    };

    let positions = Attribute::new(&model.name, "vertex", &mesh.positions, 3);
    let normals = Attribute::new(&model.name, "normal", &mesh.normals, 3);
    let texcoords = Attribute::new(&model.name, "texcoord", &mesh.texcoords, 2);

    for face in 0..mesh.indices.len() / 3 {
        let mut face_vertices = [Vertex::default(); 3];

        for (corner, vertex) in face_vertices.iter_mut().enumerate() {
            let i = face * 3 + corner;
            let p = positions.get(mesh.indices[i])?;
            vertex.position = Vec3::new(p[0], p[1], p[2]);

            let written = corners.get(i).copied().unwrap_or(CornerAttributes::ALL);

            if let Some(&ni) = mesh.normal_indices.get(i).filter(|_| written.normal) {
                let n = normals.get(ni)?;
                vertex.normal = Some(Vec3::new(n[0], n[1], n[2]));
            }
            if let Some(&ti) = mesh.texcoord_indices.get(i).filter(|_| written.texcoord) {
                let t = texcoords.get(ti)?;
                vertex.texcoord = Some(Vec2::new(t[0], t[1]));
            }
        }

        let mut triangle = Triangle::new(face_vertices[0], face_vertices[1], face_vertices[2]);
        if let Some(material) = &material {
            triangle = triangle.with_material(material.clone());
        }
        if !model.name.is_empty() {
            triangle = triangle.with_group(model.name.as_str());
        }
        scene.add_triangle(triangle);
    }

    Ok(())
}

/// Which optional attributes one face corner wrote (`v/vt/vn`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CornerAttributes {
    texcoord: bool,
    normal: bool,
}

impl CornerAttributes {
    const ALL: Self = Self {
        texcoord: true,
        normal: true,
    };

    fn parse(token: &str) -> Self {
        let mut fields = token.split('/').skip(1);
        Self {
            texcoord: fields.next().is_some_and(|vt| !vt.is_empty()),
            normal: fields.next().is_some_and(|vn| !vn.is_empty()),
        }
    }
}

/// Attribute presence for every polygon corner, in file order.
///
/// `f` lines with fewer than three corners are points or lines, which the
/// loader skips, so they contribute nothing.
fn scan_face_corners(text: &str) -> Vec<CornerAttributes> {
    let mut corners = Vec::new();
    for line in text.lines() {
        let mut words = line.split_whitespace();
        if words.next() != Some("f") {
            continue;
        }
        let tokens: Vec<&str> = words.collect();
        if tokens.len() >= 3 {
            corners.extend(tokens.iter().map(|t| CornerAttributes::parse(t)));
        }
    }
    corners
}

/// A flat attribute array viewed as fixed-size tuples.
struct Attribute<'a> {
    model: &'a str,
    kind: &'static str,
    data: &'a [f32],
    width: usize,
}

impl<'a> Attribute<'a> {
    fn new(model: &'a str, kind: &'static str, data: &'a [f32], width: usize) -> Self {
        Self {
            model,
            kind,
            data,
            width,
        }
    }

    fn get(&self, index: u32) -> LoadResult<&'a [f32]> {
        let index = index as usize;
        let start = index * self.width;
        self.data
            .get(start..start + self.width)
            .ok_or_else(|| LoadError::IndexOutOfRange {
                model: self.model.to_string(),
                kind: self.kind,
                index,
                count: self.data.len() / self.width,
            })
    }
}

/// Convert a parsed MTL entry, resolving its texture maps.
fn convert_material(mtl: &tobj::Material, textures: &mut TextureCache) -> LoadResult<Material> {
    let mut load = |path: &Option<String>| -> LoadResult<Option<Arc<Texture>>> {
        path.as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| {
                textures.load(p).map_err(|source| LoadError::Texture {
                    material: mtl.name.clone(),
                    source,
                })
            })
            .transpose()
    };

    let disp = mtl.unknown_param.get("disp").cloned();

    // Tr is transparency directly, d is opacity
    let transparency = mtl
        .unknown_param
        .get("Tr")
        .and_then(|tr| tr.split_whitespace().next())
        .and_then(|tr| tr.parse::<f32>().ok())
        .or(mtl.dissolve.map(|d| 1.0 - d))
        .unwrap_or(0.0);

    let defaults = Material::default();
    Ok(Material {
        name: mtl.name.clone(),
        ambient_color: mtl.ambient.map_or(defaults.ambient_color, Vec3::from_array),
        diffuse_color: mtl.diffuse.map_or(defaults.diffuse_color, Vec3::from_array),
        specular_color: mtl.specular.map_or(defaults.specular_color, Vec3::from_array),
        specular_exponent: mtl.shininess,
        transparency,
        ambient_map: load(&mtl.ambient_texture)?,
        diffuse_map: load(&mtl.diffuse_texture)?,
        specular_map: load(&mtl.specular_texture)?,
        specular_exponent_map: load(&mtl.shininess_texture)?,
        alpha_map: load(&mtl.dissolve_texture)?,
        bump_map: load(&mtl.normal_texture)?,
        displacement_map: load(&disp)?,
    })
}
