//! Geometric analysis: volume, surface area, bounding box, triangle count.

use serde::{Deserialize, Serialize};

use crate::mesh::{TriangleMesh, Vec3};

/// Axis-aligned bounding box extents in millimeters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Extent along X (mm).
    pub width: f64,
    /// Extent along Y (mm).
    pub height: f64,
    /// Extent along Z (mm).
    pub depth: f64,
}

/// Geometric statistics of a decoded mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    /// Enclosed volume (cm³).
    pub volume: f64,
    /// Total surface area (cm²).
    pub surface_area: f64,
    /// Bounding box extents (mm).
    pub dimensions: Dimensions,
    /// Number of triangles.
    pub triangle_count: usize,
}

/// Compute [`ModelStats`] in a single pass over the triangles.
///
/// Volume is the absolute sum of signed tetrahedra against the origin
/// (divergence theorem), so it is only meaningful for closed, consistently
/// wound meshes. Open or self-intersecting input still produces a finite
/// number. An empty mesh yields all zeros.
pub fn analyze(mesh: &TriangleMesh) -> ModelStats {
    let mut signed_volume = 0.0;
    let mut area = 0.0;
    let mut min = Vec3::repeat(f64::INFINITY);
    let mut max = Vec3::repeat(f64::NEG_INFINITY);

    for [p1, p2, p3] in mesh.triangles() {
        signed_volume += signed_tetra_volume(&p1, &p2, &p3);
        area += heron_area(&p1, &p2, &p3);
        for p in [p1, p2, p3] {
            min = min.inf(&p);
            max = max.sup(&p);
        }
    }

    let triangle_count = mesh.num_triangles();
    let dimensions = if triangle_count == 0 {
        Dimensions::default()
    } else {
        let extent = max - min;
        Dimensions {
            width: extent.x,
            height: extent.y,
            depth: extent.z,
        }
    };

    ModelStats {
        // mm³ -> cm³
        volume: finite_or_zero(signed_volume.abs() / 1000.0, "volume"),
        // mm² -> cm²
        surface_area: finite_or_zero(area / 100.0, "surface area"),
        dimensions,
        triangle_count,
    }
}

/// Signed volume of the tetrahedron formed by a triangle and the origin.
pub fn signed_tetra_volume(p1: &Vec3, p2: &Vec3, p3: &Vec3) -> f64 {
    p1.dot(&p2.cross(p3)) / 6.0
}

/// Triangle area from its edge lengths (Heron's formula).
///
/// Rounding can push the radicand slightly below zero for degenerate
/// triangles; it is clamped before the square root.
pub fn heron_area(p1: &Vec3, p2: &Vec3, p3: &Vec3) -> f64 {
    let a = (p2 - p1).norm();
    let b = (p3 - p2).norm();
    let c = (p1 - p3).norm();
    let s = (a + b + c) / 2.0;
    (s * (s - a) * (s - b) * (s - c)).max(0.0).sqrt()
}

fn finite_or_zero(value: f64, what: &str) -> f64 {
    if value.is_finite() {
        value
    } else {
        tracing::warn!(quantity = what, "non-finite mesh measurement, reporting 0");
        0.0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Vector3};

    /// Outward-wound cube triangles over corners
    /// `0..4` at z = 0 and `4..8` at z = size.
    pub(crate) const CUBE_INDICES: [u32; 36] = [
        0, 2, 1, 0, 3, 2, //
        4, 5, 6, 4, 6, 7, //
        0, 1, 5, 0, 5, 4, //
        2, 3, 7, 2, 7, 6, //
        0, 4, 7, 0, 7, 3, //
        1, 2, 6, 1, 6, 5,
    ];

    pub(crate) fn make_cube_mesh(size: f64) -> TriangleMesh {
        let vertices = vec![
            0.0, 0.0, 0.0, size, 0.0, 0.0, size, size, 0.0, 0.0, size, 0.0, //
            0.0, 0.0, size, size, 0.0, size, size, size, size, 0.0, size, size,
        ];
        TriangleMesh {
            vertices,
            indices: CUBE_INDICES.to_vec(),
        }
    }

    fn transformed(mesh: &TriangleMesh, f: impl Fn(Vector3<f64>) -> Vector3<f64>) -> TriangleMesh {
        let mut out = mesh.clone();
        for chunk in out.vertices.chunks_exact_mut(3) {
            let p = f(Vector3::new(chunk[0], chunk[1], chunk[2]));
            chunk.copy_from_slice(&[p.x, p.y, p.z]);
        }
        out
    }

    #[test]
    fn test_cube_1000mm() {
        let stats = analyze(&make_cube_mesh(1000.0));
        assert_eq!(stats.triangle_count, 12);
        assert_relative_eq!(stats.volume, 1_000_000.0, max_relative = 1e-12);
        // 6 faces of 1000 mm x 1000 mm = 6e6 mm² = 60 000 cm².
        assert_relative_eq!(stats.surface_area, 60_000.0, max_relative = 1e-9);
        assert_eq!(
            stats.dimensions,
            Dimensions {
                width: 1000.0,
                height: 1000.0,
                depth: 1000.0
            }
        );
    }

    #[test]
    fn test_cube_100mm_is_1000cm3() {
        let stats = analyze(&make_cube_mesh(100.0));
        assert_relative_eq!(stats.volume, 1000.0, max_relative = 1e-12);
        assert_relative_eq!(stats.surface_area, 600.0, max_relative = 1e-9);
    }

    #[test]
    fn test_inverted_winding_still_positive() {
        let mut mesh = make_cube_mesh(10.0);
        for tri in mesh.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
        assert_relative_eq!(analyze(&mesh).volume, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_volume_invariant_under_reordering() {
        let mesh = make_cube_mesh(37.5);
        let mut reordered = mesh.clone();
        let tris: Vec<[u32; 3]> = mesh
            .indices
            .chunks_exact(3)
            .rev()
            .map(|t| [t[0], t[1], t[2]])
            .collect();
        reordered.indices = tris.concat();
        assert_relative_eq!(
            analyze(&mesh).volume,
            analyze(&reordered).volume,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_volume_invariant_under_rigid_motion() {
        let mesh = make_cube_mesh(25.0);
        let rotation = Rotation3::from_euler_angles(0.3, -1.1, 2.4);
        let offset = Vector3::new(120.0, -45.0, 300.0);
        let moved = transformed(&mesh, |p| rotation * p + offset);

        let a = analyze(&mesh);
        let b = analyze(&moved);
        assert_relative_eq!(a.volume, b.volume, max_relative = 1e-9);
        assert_relative_eq!(a.surface_area, b.surface_area, max_relative = 1e-9);
        assert_eq!(a.triangle_count, b.triangle_count);
    }

    #[test]
    fn test_empty_mesh_is_all_zero() {
        assert_eq!(analyze(&TriangleMesh::new()), ModelStats::default());
    }

    #[test]
    fn test_degenerate_triangle() {
        let mut mesh = TriangleMesh::new();
        // Collinear points: zero area, flat in Y and Z.
        mesh.push_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]);
        let stats = analyze(&mesh);
        assert_eq!(stats.surface_area, 0.0);
        assert_eq!(stats.volume, 0.0);
        assert_eq!(stats.dimensions.width, 2.0);
        assert_eq!(stats.dimensions.height, 0.0);
        assert_eq!(stats.dimensions.depth, 0.0);
    }

    #[test]
    fn test_single_point_triangle() {
        let mut mesh = TriangleMesh::new();
        mesh.push_triangle([5.0, 5.0, 5.0], [5.0, 5.0, 5.0], [5.0, 5.0, 5.0]);
        let stats = analyze(&mesh);
        assert_eq!(stats.dimensions, Dimensions::default());
        assert_eq!(stats.triangle_count, 1);
    }

    #[test]
    fn test_open_mesh_stays_finite() {
        let mut mesh = make_cube_mesh(10.0);
        mesh.indices.truncate(30);
        let stats = analyze(&mesh);
        assert!(stats.volume.is_finite());
        assert!(stats.volume >= 0.0);
    }

    #[test]
    fn test_heron_right_triangle() {
        let area = heron_area(
            &Vec3::new(0.0, 0.0, 0.0),
            &Vec3::new(3.0, 0.0, 0.0),
            &Vec3::new(0.0, 4.0, 0.0),
        );
        assert_relative_eq!(area, 6.0, epsilon = 1e-12);
    }
}
