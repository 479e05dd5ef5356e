//! Indexed triangle mesh produced by the decoders.

use nalgebra::Vector3;

/// A point or vector in model space (millimeters).
pub type Vec3 = Vector3<f64>;

/// Triangle mesh in model-space millimeters.
///
/// Decoders guarantee that every coordinate is finite and every index
/// refers to an existing vertex. Normals are never stored; anything that
/// needs them recomputes them from the winding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]`.
    pub vertices: Vec<f64>,
    /// Flat array of triangle indices: `[i0, i1, i2, ...]`.
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mesh with room for `triangles` unshared triangles.
    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(triangles * 9),
            indices: Vec::with_capacity(triangles * 3),
        }
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Whether the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append a vertex and return its index.
    pub fn push_vertex(&mut self, p: [f64; 3]) -> u32 {
        let idx = self.num_vertices() as u32;
        self.vertices.extend_from_slice(&p);
        idx
    }

    /// Append a triangle with its own three vertices (triangle soup).
    pub fn push_triangle(&mut self, a: [f64; 3], b: [f64; 3], c: [f64; 3]) {
        let i0 = self.push_vertex(a);
        let i1 = self.push_vertex(b);
        let i2 = self.push_vertex(c);
        self.indices.extend_from_slice(&[i0, i1, i2]);
    }

    /// Position of vertex `i`.
    pub fn vertex(&self, i: u32) -> Vec3 {
        let i = i as usize * 3;
        Vec3::new(self.vertices[i], self.vertices[i + 1], self.vertices[i + 2])
    }

    /// Iterate over triangles as vertex triplets, in stored order.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [self.vertex(tri[0]), self.vertex(tri[1]), self.vertex(tri[2])])
    }

    /// Merge another mesh into this one.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.num_vertices() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices
            .extend(other.indices.iter().map(|&i| i + offset));
    }
}
