//! Triangle geometry with per-vertex attributes.

use std::sync::Arc;

use facet_math::{Vec2, Vec3, Vec4};

use crate::material::Material;

/// Surface color of a triangle without a material.
pub const UNSHADED_COLOR: Vec4 = Vec4::ONE;

/// A mesh vertex in world space.
///
/// Normals and texture coordinates are optional in the source data.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Option<Vec3>,
    pub texcoord: Option<Vec2>,
}

impl Vertex {
    /// Create a vertex with only a position.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            normal: None,
            texcoord: None,
        }
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn with_texcoord(mut self, texcoord: Vec2) -> Self {
        self.texcoord = Some(texcoord);
        self
    }
}

/// A triangle primitive.
///
/// Vertices are wound counter-clockwise as seen from the front face. The unit
/// face normal `normalize(cross(p2 - p1, p0 - p1))` is computed once here and
/// never recomputed. A zero-area triangle gets a zero normal; intersection
/// tests treat it as never hit.
#[derive(Clone, Debug)]
pub struct Triangle {
    vertices: [Vertex; 3],
    normal: Vec3,
    /// Area of the triangle
    area: f32,
    material: Option<Arc<Material>>,
    /// Object/group label from the source file
    group: Option<String>,
}

/// Area of the triangle spanned by three points.
#[inline]
fn area_of(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    (b - a).cross(c - a).length() * 0.5
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(p0: Vertex, p1: Vertex, p2: Vertex) -> Self {
        let face = (p2.position - p1.position).cross(p0.position - p1.position);

        Self {
            vertices: [p0, p1, p2],
            normal: face.normalize_or_zero(),
            area: face.length() * 0.5,
            material: None,
            group: None,
        }
    }

    /// Create a triangle from bare positions.
    pub fn from_positions(p0: Vec3, p1: Vec3, p2: Vec3) -> Self {
        Self::new(Vertex::new(p0), Vertex::new(p1), Vertex::new(p2))
    }

    /// Set the material for this triangle.
    pub fn with_material(mut self, material: Arc<Material>) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex; 3] {
        &self.vertices
    }

    #[inline]
    pub fn p0(&self) -> Vec3 {
        self.vertices[0].position
    }

    #[inline]
    pub fn p1(&self) -> Vec3 {
        self.vertices[1].position
    }

    #[inline]
    pub fn p2(&self) -> Vec3 {
        self.vertices[2].position
    }

    /// Unit face normal (zero for a degenerate triangle).
    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn area(&self) -> f32 {
        self.area
    }

    pub fn material(&self) -> Option<&Arc<Material>> {
        self.material.as_ref()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// True for zero-area triangles, which have no usable normal.
    pub fn is_degenerate(&self) -> bool {
        self.normal == Vec3::ZERO
    }

    /// Barycentric weights of `point` from the areas of the three sub-triangles
    /// it forms with the edges, each divided by the full area.
    ///
    /// Weight `i` belongs to vertex `i`. Degenerate triangles weight all
    /// vertices equally.
    pub fn barycentric(&self, point: Vec3) -> Vec3 {
        if self.area <= 0.0 {
            return Vec3::splat(1.0 / 3.0);
        }

        let [p0, p1, p2] = [self.p0(), self.p1(), self.p2()];
        Vec3::new(
            area_of(point, p1, p2),
            area_of(p0, point, p2),
            area_of(p0, p1, point),
        ) / self.area
    }

    /// Texture coordinate at `point`; missing vertex UVs count as (0, 0).
    pub fn texcoord_at(&self, point: Vec3) -> Vec2 {
        let w = self.barycentric(point);
        let uv = |i: usize| self.vertices[i].texcoord.unwrap_or(Vec2::ZERO);
        uv(0) * w.x + uv(1) * w.y + uv(2) * w.z
    }

    /// Surface color (RGBA) at `point`.
    ///
    /// RGB comes from the diffuse map or flat diffuse color, alpha from the
    /// alpha map or `1 - transparency`. Without a material the surface is
    /// opaque white.
    pub fn color_at(&self, point: Vec3) -> Vec4 {
        match &self.material {
            Some(material) => {
                let uv = self.texcoord_at(point);
                material.diffuse_at(uv).extend(material.alpha_at(uv))
            }
            None => UNSHADED_COLOR,
        }
    }

    /// Specular exponent at `point`, defaulting to 1 without a material.
    pub fn specular_exponent_at(&self, point: Vec3) -> f32 {
        match &self.material {
            Some(material) => material.specular_exponent_at(self.texcoord_at(point)),
            None => crate::material::DEFAULT_SPECULAR_EXPONENT,
        }
    }

    /// Interpolated vertex normal at `point`, or the face normal when any
    /// vertex lacks one (flat shading).
    pub fn smooth_normal_at(&self, point: Vec3) -> Vec3 {
        match (
            self.vertices[0].normal,
            self.vertices[1].normal,
            self.vertices[2].normal,
        ) {
            (Some(n0), Some(n1), Some(n2)) => {
                let w = self.barycentric(point);
                (n0 * w.x + n1 * w.y + n2 * w.z)
                    .try_normalize()
                    .unwrap_or(self.normal)
            }
            _ => self.normal,
        }
    }
}
