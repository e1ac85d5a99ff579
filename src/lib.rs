//! # Cage
//!
//! A control-mesh library for Catmull-Clark-style subdivision pipelines.
//!
//! Cage represents polygonal control meshes as a manifold half-edge
//! structure, answers neighborhood queries in O(1) through a precomputed
//! topology cache, and exposes flat, tightly packed buffers ready for GPU
//! upload — including fan-triangulated and wireframe index lists for
//! rendering.
//!
//! ## Features
//!
//! - **Incremental half-edge builder**: push vertices and face loops;
//!   twins link online and non-manifold faces are rejected before any
//!   state changes
//! - **Topology cache**: valences, boundary flags, canonical edge
//!   endpoints, and five CSR incidence tables in GPU-uploadable layouts
//! - **Crease attributes**: per-edge smooth / crease / semi-sharp tags for
//!   subdivision weighting
//! - **Render indices**: fan triangulation and unique-edge wireframe
//! - **OBJ import/export** with `# crease` comments and face groups
//! - **Diagnostics sink**: process-wide structured error records and
//!   scoped timers
//!
//! ## Quick start
//!
//! ```
//! use cage::prelude::*;
//! use nalgebra::Point3;
//!
//! let mut mesh = ControlMesh::new();
//! let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
//! let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
//! let c = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
//! let d = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
//! mesh.add_face(&[a, b, c, d]).unwrap();
//!
//! // Topology queries are O(1) once the cache is built.
//! assert_eq!(mesh.get_valence(a), 2);
//! assert_eq!(mesh.get_one_ring(a).len(), 2);
//! assert!(mesh.is_boundary_vertex(a));
//!
//! // Index buffers for a renderer.
//! let indices = RenderIndices::build(&mut mesh);
//! assert_eq!(indices.triangle_count(), 2);
//! assert_eq!(indices.segment_count(), 4);
//! ```
//!
//! ## Crease tags
//!
//! ```
//! use cage::prelude::*;
//! use nalgebra::Point3;
//!
//! # let mut mesh = ControlMesh::new();
//! # let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
//! # let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
//! # let c = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
//! # mesh.add_face(&[a, b, c]).unwrap();
//! let e = mesh.find_edge(a, b);
//! mesh.set_edge_sharpness(e, 0.8).unwrap();
//! assert_eq!(mesh.edges()[e.index()].tag, EdgeTag::Semi);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diagnostics;
pub mod error;
pub mod io;
pub mod mesh;
pub mod render;

/// Prelude module for convenient imports.
///
/// ```
/// use cage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        ControlMesh, Edge, EdgeId, EdgeTag, Face, FaceGroup, FaceId, HalfEdge, HalfEdgeId,
        TopologyCache, Vertex, VertexId, INVALID_INDEX,
    };
    pub use crate::render::RenderIndices;
}

// Re-export nalgebra so downstream code can name the math types without a
// separate dependency.
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn tetrahedron_is_closed() {
        let mut mesh = ControlMesh::new();
        let v: Vec<VertexId> = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.5, 1.0, 0.0],
            [0.5, 0.5, 1.0],
        ]
        .iter()
        .map(|p| mesh.add_vertex(Point3::new(p[0], p[1], p[2])))
        .collect();

        for tri in [[0usize, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]] {
            mesh.add_face(&[v[tri[0]], v[tri[1]], v[tri[2]]]).unwrap();
        }

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_half_edges(), 12);
        assert_eq!(mesh.num_edges(), 6);
        assert!(mesh.validate());

        mesh.build_cache();
        assert_eq!(mesh.cache().num_boundary_vertices(), 0);
        assert_eq!(mesh.cache().num_boundary_edges(), 0);
        for i in 0..4 {
            assert_eq!(mesh.get_valence(v[i]), 3);
            assert!(!mesh.is_boundary_vertex(v[i]));
        }
    }
}
