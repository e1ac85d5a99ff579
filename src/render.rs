//! Render index extraction.
//!
//! Derives two `u32` index buffers from a control mesh:
//!
//! - **Triangles**: every face fan-triangulated from its first loop vertex,
//!   so arbitrary-valence faces render on triangle hardware.
//! - **Wireframe**: one line segment per undirected edge, endpoints in
//!   canonical order. The edge list is already unique, so no deduplication
//!   pass is needed.
//!
//! Both buffers are pure functions of the mesh topology; callers may keep
//! them across frames until the mesh changes.

use crate::diagnostics::ScopedTimer;
use crate::mesh::ControlMesh;

/// Extra loop steps tolerated before a face walk is abandoned.
const FACE_LOOP_SLACK: u32 = 10;

/// Triangle and wireframe index buffers extracted from a [`ControlMesh`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderIndices {
    triangles: Vec<u32>,
    wireframe: Vec<u32>,
}

impl RenderIndices {
    /// Extract both index buffers, building the mesh's topology cache if it
    /// is stale.
    pub fn build(mesh: &mut ControlMesh) -> Self {
        let _t = ScopedTimer::new("RenderIndices::build");

        mesh.build_cache();
        Self {
            triangles: build_triangles(mesh),
            wireframe: build_wireframe(mesh),
        }
    }

    /// Fan-triangulated face indices, three entries per triangle.
    #[inline]
    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    /// Wireframe indices, two entries per line segment.
    #[inline]
    pub fn wireframe(&self) -> &[u32] {
        &self.wireframe
    }

    /// Number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Number of wireframe line segments.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.wireframe.len() / 2
    }

    /// Triangle indices as tightly packed bytes.
    #[inline]
    pub fn triangles_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }

    /// Wireframe indices as tightly packed bytes.
    #[inline]
    pub fn wireframe_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.wireframe)
    }

    /// Total heap usage of both buffers in bytes.
    pub fn memory_usage(&self) -> usize {
        (self.triangles.len() + self.wireframe.len()) * std::mem::size_of::<u32>()
    }
}

fn build_triangles(mesh: &ControlMesh) -> Vec<u32> {
    let num_half_edges = mesh.num_half_edges();
    let mut indices = Vec::new();
    let mut loop_verts: Vec<u32> = Vec::new();

    for face in mesh.faces() {
        if face.valence < 3 || !face.edge.in_bounds(num_half_edges) {
            continue;
        }

        loop_verts.clear();
        let start = face.edge;
        let mut current = start;
        let mut steps = 0u32;
        loop {
            let v = mesh.from_vertex(current);
            if v.is_valid() {
                loop_verts.push(v.raw());
            }

            current = mesh.half_edges()[current.index()].next;
            steps += 1;
            if steps > face.valence + FACE_LOOP_SLACK {
                break;
            }
            if current == start || !current.in_bounds(num_half_edges) {
                break;
            }
        }

        // Fan: (v0, v1, v2), (v0, v2, v3), ...
        for i in 1..loop_verts.len().saturating_sub(1) {
            indices.push(loop_verts[0]);
            indices.push(loop_verts[i]);
            indices.push(loop_verts[i + 1]);
        }
    }

    indices
}

fn build_wireframe(mesh: &ControlMesh) -> Vec<u32> {
    let cache = mesh.cache();
    let mut indices = Vec::with_capacity(cache.num_edges() * 2);

    for [u, w] in cache.edge_vertices_array() {
        if u.is_valid() && w.is_valid() {
            indices.push(u.raw());
            indices.push(w.raw());
        }
    }

    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::VertexId;
    use nalgebra::Point3;

    fn triangle_mesh() -> ControlMesh {
        let mut mesh = ControlMesh::new();
        let v0 = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let v1 = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let v2 = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        mesh.add_face(&[v0, v1, v2]).unwrap();
        mesh
    }

    fn pentagon_mesh() -> ControlMesh {
        let mut mesh = ControlMesh::new();
        let verts: Vec<VertexId> = (0..5)
            .map(|i| {
                let a = i as f32 * std::f32::consts::TAU / 5.0;
                mesh.add_vertex(Point3::new(a.cos(), a.sin(), 0.0))
            })
            .collect();
        mesh.add_face(&verts).unwrap();
        mesh
    }

    fn cube_mesh() -> ControlMesh {
        let mut mesh = ControlMesh::new();
        let coords = [
            [-1.0, -1.0, -1.0],
            [1.0, -1.0, -1.0],
            [1.0, 1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
        ];
        let v: Vec<VertexId> = coords
            .iter()
            .map(|c| mesh.add_vertex(Point3::new(c[0], c[1], c[2])))
            .collect();
        for q in [
            [4usize, 5, 6, 7],
            [1, 0, 3, 2],
            [0, 4, 7, 3],
            [5, 1, 2, 6],
            [0, 1, 5, 4],
            [3, 7, 6, 2],
        ] {
            mesh.add_face(&[v[q[0]], v[q[1]], v[q[2]], v[q[3]]]).unwrap();
        }
        mesh
    }

    #[test]
    fn empty_mesh_yields_empty_buffers() {
        let mut mesh = ControlMesh::new();
        let indices = RenderIndices::build(&mut mesh);
        assert_eq!(indices.triangle_count(), 0);
        assert_eq!(indices.segment_count(), 0);
        assert_eq!(indices.memory_usage(), 0);
    }

    #[test]
    fn triangle_passes_through() {
        let mut mesh = triangle_mesh();
        let indices = RenderIndices::build(&mut mesh);

        assert_eq!(indices.triangles(), &[0, 1, 2]);
        assert_eq!(indices.segment_count(), 3);
    }

    #[test]
    fn pentagon_fans_into_three_triangles() {
        let mut mesh = pentagon_mesh();
        let indices = RenderIndices::build(&mut mesh);

        assert_eq!(indices.triangle_count(), 3);
        assert_eq!(indices.triangles(), &[0, 1, 2, 0, 2, 3, 0, 3, 4]);
        assert_eq!(indices.segment_count(), 5);
    }

    #[test]
    fn cube_renders_twelve_triangles_and_segments() {
        let mut mesh = cube_mesh();
        let indices = RenderIndices::build(&mut mesh);

        assert_eq!(indices.triangle_count(), 12);
        assert_eq!(indices.segment_count(), 12);

        // Every wireframe segment is a unique canonical pair.
        let mut seen = std::collections::HashSet::new();
        for pair in indices.wireframe().chunks_exact(2) {
            assert!(pair[0] < pair[1]);
            assert!(seen.insert((pair[0], pair[1])));
        }
    }

    #[test]
    fn byte_views_match_counts() {
        let mut mesh = cube_mesh();
        let indices = RenderIndices::build(&mut mesh);

        assert_eq!(indices.triangles_bytes().len(), 12 * 3 * 4);
        assert_eq!(indices.wireframe_bytes().len(), 12 * 2 * 4);
        assert_eq!(indices.memory_usage(), (36 + 24) * 4);
    }

    #[test]
    fn rebuild_is_stable() {
        let mut mesh = pentagon_mesh();
        let first = RenderIndices::build(&mut mesh);
        let second = RenderIndices::build(&mut mesh);
        assert_eq!(first, second);
    }
}
