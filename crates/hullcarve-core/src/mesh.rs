//! Triangle mesh produced by the mesher.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Indexed triangle mesh.
///
/// Vertex stride is three `f32` (x, y, z); every three consecutive indices form one
/// triangle, wound counter-clockwise when seen from outside the surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Vertex positions in world space.
    pub positions: Vec<Vec3>,
    /// Per-vertex unit normals (accumulated from adjacent face normals).
    pub normals: Vec<Vec3>,
    /// Triangle indices.
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Floats per vertex in [`Mesh::vertex_buffer`].
    pub const VERTEX_STRIDE: usize = 3;

    /// Returns the number of vertices.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Returns the number of triangles in the mesh.
    #[must_use]
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns true if the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterates triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Flat vertex buffer `[x0, y0, z0, x1, ...]`.
    #[must_use]
    pub fn vertex_buffer(&self) -> Vec<f32> {
        self.positions.iter().flat_map(|p| p.to_array()).collect()
    }

    /// Raw bytes of the vertex positions, native endian, tightly packed.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Raw bytes of the index buffer, native endian.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Axis-aligned bounding box `(min, max)` of the vertices, or `None` if there are none.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
        )
    }

    /// Geometric (unnormalized) normal of triangle `tri`; its length is twice the area.
    #[must_use]
    pub fn face_normal(&self, tri: [u32; 3]) -> Vec3 {
        let [a, b, c] = tri.map(|i| self.positions[i as usize]);
        (b - a).cross(c - a)
    }

    /// Signed enclosed volume; positive for a closed, outward-wound surface.
    #[must_use]
    pub fn signed_volume(&self) -> f32 {
        self.triangles()
            .map(|tri| {
                let [a, b, c] = tri.map(|i| self.positions[i as usize]);
                a.dot(b.cross(c))
            })
            .sum::<f32>()
            / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> Mesh {
        Mesh {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            normals: vec![Vec3::ZERO; 4],
            indices: vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
        }
    }

    #[test]
    fn test_counts_and_buffers() {
        let mesh = tetrahedron();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_triangles(), 4);
        assert_eq!(mesh.vertex_buffer().len(), 4 * Mesh::VERTEX_STRIDE);
        assert_eq!(mesh.vertex_bytes().len(), 4 * 3 * 4);
        assert_eq!(mesh.index_bytes().len(), 12 * 4);
        assert_eq!(&mesh.vertex_buffer()[3..6], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_bounding_box() {
        let mesh = tetrahedron();
        assert_eq!(mesh.bounding_box(), Some((Vec3::ZERO, Vec3::ONE)));
        assert_eq!(Mesh::default().bounding_box(), None);
    }

    #[test]
    fn test_signed_volume_follows_winding() {
        let mesh = tetrahedron();
        assert!((mesh.signed_volume() - 1.0 / 6.0).abs() < 1e-6);

        let mut flipped = mesh.clone();
        for tri in flipped.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
        assert!(flipped.signed_volume() < 0.0);
    }
}
