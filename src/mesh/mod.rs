//! Core mesh data structures.
//!
//! The primary type is [`ControlMesh`], a half-edge representation of a
//! polygonal control mesh with per-vertex attributes in parallel arrays.
//! Neighborhood queries are answered by a [`TopologyCache`] built lazily
//! from the half-edge arrays.
//!
//! # Index types
//!
//! Elements are identified by typed `u32` indices — [`VertexId`],
//! [`HalfEdgeId`], [`EdgeId`], [`FaceId`] — sharing the [`INVALID_INDEX`]
//! sentinel.
//!
//! # Construction
//!
//! ```
//! use cage::mesh::ControlMesh;
//! use nalgebra::Point3;
//!
//! let mut mesh = ControlMesh::new();
//! let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
//! let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
//! let c = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
//! let face = mesh.add_face(&[a, b, c]).unwrap();
//! assert_eq!(mesh.faces()[face.index()].valence, 3);
//! ```

mod cache;
mod control;
mod elements;
mod index;

pub use cache::TopologyCache;
pub use control::ControlMesh;
pub use elements::{Edge, EdgeTag, Face, FaceGroup, HalfEdge, Vertex};
pub use index::{
    directed_edge_key, is_valid_index, undirected_edge_key, EdgeId, FaceId, HalfEdgeId, VertexId,
    INVALID_INDEX,
};
