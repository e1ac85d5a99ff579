//! Element records of the half-edge mesh.
//!
//! All records are plain index data. Positions, normals, and UVs live in
//! parallel attribute arrays on [`ControlMesh`](super::ControlMesh), indexed
//! by vertex id, so each attribute can be uploaded as its own GPU buffer.

use bytemuck::{Pod, Zeroable};

use super::index::{EdgeId, FaceId, HalfEdgeId, VertexId};

/// Edge sharpness classification for subdivision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum EdgeTag {
    /// Smooth edge (default).
    #[default]
    Smooth = 0,
    /// Hard crease, effectively infinite sharpness.
    Crease = 1,
    /// Semi-sharp; sharpness decays under subdivision.
    Semi = 2,
}

/// A vertex: one outgoing half-edge plus corner data for subdivision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// One outgoing half-edge, invalid for isolated vertices.
    pub outgoing: HalfEdgeId,
    /// Corner sharpness.
    pub sharpness: f32,
    /// Dart/corner vertex flag.
    pub is_corner: bool,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            outgoing: HalfEdgeId::invalid(),
            sharpness: 0.0,
            is_corner: false,
        }
    }
}

/// A half-edge: six tightly packed index fields.
///
/// Directed from [`from`](super::ControlMesh::from_vertex) (the `to` of
/// `prev`) toward `to`, belonging to exactly one face loop. `twin` is
/// invalid on the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct HalfEdge {
    /// Destination vertex.
    pub to: VertexId,
    /// Next half-edge in the face loop.
    pub next: HalfEdgeId,
    /// Previous half-edge in the face loop.
    pub prev: HalfEdgeId,
    /// Opposite half-edge, invalid on the boundary.
    pub twin: HalfEdgeId,
    /// Parent undirected edge.
    pub edge: EdgeId,
    /// Adjacent face.
    pub face: FaceId,
}

// One record per half-edge, no padding beyond natural alignment.
const _: () = assert!(std::mem::size_of::<HalfEdge>() == 24);

impl HalfEdge {
    /// Check whether this half-edge lies on the mesh boundary.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.twin.is_valid()
    }
}

impl Default for HalfEdge {
    fn default() -> Self {
        Self {
            to: VertexId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            twin: HalfEdgeId::invalid(),
            edge: EdgeId::invalid(),
            face: FaceId::invalid(),
        }
    }
}

/// Undirected edge attributes, shared by a twin pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edge {
    /// Sharpness classification.
    pub tag: EdgeTag,
    /// Sharpness value; authoritative only for [`EdgeTag::Semi`].
    pub sharpness: f32,
}

impl Edge {
    /// Check whether this edge participates in crease rules.
    #[inline]
    pub fn is_sharp(&self) -> bool {
        self.tag != EdgeTag::Smooth
    }
}

/// A face: one half-edge of its loop and a cached vertex count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    /// One half-edge on the face loop.
    pub edge: HalfEdgeId,
    /// Number of vertices (loop length), at least 3.
    pub valence: u32,
}

impl Default for Face {
    fn default() -> Self {
        Self {
            edge: HalfEdgeId::invalid(),
            valence: 0,
        }
    }
}

/// A named set of faces, as produced by `g`/`o` directives of an OBJ file.
///
/// Group bookkeeping sits outside the core mesh; importers return groups
/// beside the mesh they built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaceGroup {
    /// Group name.
    pub name: String,
    /// Member faces, in import order.
    pub faces: Vec<FaceId>,
}
