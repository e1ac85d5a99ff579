//! The control mesh: half-edge topology plus per-vertex attributes.
//!
//! [`ControlMesh`] is built incrementally: push vertices, then push face
//! vertex loops. Twin half-edges are linked online through a directed-edge
//! map, which also enforces manifoldness — a face that would give any edge
//! more than two incident faces is rejected before a single array is
//! touched.
//!
//! Topology queries go through a lazily built [`TopologyCache`]; any
//! successful mutation invalidates it.
//!
//! ```
//! use cage::prelude::*;
//! use nalgebra::Point3;
//!
//! let mut mesh = ControlMesh::new();
//! let v0 = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
//! let v1 = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
//! let v2 = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
//! mesh.add_face(&[v0, v1, v2]).unwrap();
//!
//! assert_eq!(mesh.num_edges(), 3);
//! assert_eq!(mesh.get_valence(v0), 2);
//! assert!(mesh.validate());
//! ```

use std::collections::HashMap;

use nalgebra::{Point3, Vector2, Vector3};
use rayon::prelude::*;

use super::cache::TopologyCache;
use super::elements::{Edge, EdgeTag, Face, HalfEdge, Vertex};
use super::index::{directed_edge_key, EdgeId, FaceId, HalfEdgeId, VertexId};
use crate::diagnostics::{self, ScopedTimer, Severity};
use crate::error::{MeshError, Result};

/// Extra loop steps tolerated before a face walk is declared corrupt.
const FACE_LOOP_SLACK: u32 = 10;

/// A polygonal control mesh for Catmull-Clark-style subdivision.
///
/// Topology (vertices, half-edges, edges, faces) and attributes (positions,
/// normals, UVs) live in flat parallel arrays addressed by typed ids, ready
/// for direct GPU upload.
#[derive(Debug, Clone, Default)]
pub struct ControlMesh {
    vertices: Vec<Vertex>,
    half_edges: Vec<HalfEdge>,
    edges: Vec<Edge>,
    faces: Vec<Face>,

    positions: Vec<Point3<f32>>,
    normals: Vec<Vector3<f32>>,
    uvs: Vec<Vector2<f32>>,

    // Directed (from, to) -> first half-edge created for that edge.
    edge_map: HashMap<u64, HalfEdgeId>,

    cache: TopologyCache,
}

impl ControlMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Quads dominate control meshes: ~4 half-edges per face, ~2 edges.
        let num_half_edges = num_faces * 4;
        Self {
            vertices: Vec::with_capacity(num_vertices),
            half_edges: Vec::with_capacity(num_half_edges),
            edges: Vec::with_capacity(num_half_edges / 2 + num_faces),
            faces: Vec::with_capacity(num_faces),
            positions: Vec::with_capacity(num_vertices),
            normals: Vec::with_capacity(num_vertices),
            uvs: Vec::with_capacity(num_vertices),
            edge_map: HashMap::with_capacity(num_half_edges),
            cache: TopologyCache::default(),
        }
    }

    // ==================== Counts ====================

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of half-edges.
    #[inline]
    pub fn num_half_edges(&self) -> usize {
        self.half_edges.len()
    }

    /// Number of undirected edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Whether the mesh has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    // ==================== Element access ====================

    /// All vertex records.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// All half-edge records.
    #[inline]
    pub fn half_edges(&self) -> &[HalfEdge] {
        &self.half_edges
    }

    /// All undirected edge records.
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// All face records.
    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Vertex positions, parallel to the vertex array.
    #[inline]
    pub fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    /// Vertex normals, parallel to the vertex array.
    #[inline]
    pub fn normals(&self) -> &[Vector3<f32>] {
        &self.normals
    }

    /// Vertex UVs, parallel to the vertex array.
    #[inline]
    pub fn uvs(&self) -> &[Vector2<f32>] {
        &self.uvs
    }

    // ==================== Construction & editing ====================

    /// Append a vertex and one entry to each parallel attribute array.
    ///
    /// Never fails. Invalidates the topology cache.
    pub fn add_vertex(&mut self, position: Point3<f32>) -> VertexId {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::default());
        self.positions.push(position);
        self.normals.push(Vector3::zeros());
        self.uvs.push(Vector2::zeros());
        self.invalidate_cache();
        id
    }

    /// Append a face over an ordered vertex loop.
    ///
    /// Every check runs before any array is appended, so a rejected face
    /// leaves the mesh exactly as it was. Failures are also recorded in the
    /// diagnostics sink. Invalidates the topology cache on success.
    pub fn add_face(&mut self, verts: &[VertexId]) -> Result<FaceId> {
        let _t = ScopedTimer::new("ControlMesh::add_face");

        let n = verts.len();
        if n < 3 {
            return Err(self.report(
                MeshError::FaceTooFewVertices { count: n },
                format!("vertex count: {n}"),
            ));
        }

        for &v in verts {
            if !v.in_bounds(self.vertices.len()) {
                return Err(self.report(
                    MeshError::InvalidVertexIndex {
                        vertex: v.raw(),
                        count: self.vertices.len(),
                    },
                    String::new(),
                ));
            }
        }

        for i in 0..n {
            for j in i + 1..n {
                if verts[i] == verts[j] {
                    return Err(self.report(
                        MeshError::DuplicateVertexInFace {
                            vertex: verts[i].raw(),
                        },
                        format!("positions {i} and {j}"),
                    ));
                }
            }
        }

        // Manifold enforcement: the same directed edge may never be emitted
        // twice, and a twin may only be claimed while still unset.
        for i in 0..n {
            let a = verts[i];
            let b = verts[(i + 1) % n];

            if self.edge_map.contains_key(&directed_edge_key(a, b)) {
                return Err(self.report(
                    MeshError::NonManifoldEdge {
                        from: a.raw(),
                        to: b.raw(),
                    },
                    "directed edge already exists".to_string(),
                ));
            }
            if let Some(&t) = self.edge_map.get(&directed_edge_key(b, a)) {
                if self.half_edges[t.index()].twin.is_valid() {
                    return Err(self.report(
                        MeshError::NonManifoldEdge {
                            from: a.raw(),
                            to: b.raw(),
                        },
                        "edge already has two faces".to_string(),
                    ));
                }
            }
        }

        // All checks passed; from here on nothing can fail.
        let face_id = FaceId::new(self.faces.len());
        let first = self.half_edges.len();
        self.faces.push(Face {
            edge: HalfEdgeId::new(first),
            valence: n as u32,
        });

        for i in 0..n {
            let a = verts[i];
            let b = verts[(i + 1) % n];
            let h = HalfEdgeId::new(first + i);
            let next = HalfEdgeId::new(first + (i + 1) % n);
            let prev = HalfEdgeId::new(first + (i + n - 1) % n);

            let (twin, edge) = match self.edge_map.get(&directed_edge_key(b, a)) {
                Some(&t) => {
                    let e = self.half_edges[t.index()].edge;
                    self.half_edges[t.index()].twin = h;
                    (t, e)
                }
                None => {
                    let e = EdgeId::new(self.edges.len());
                    self.edges.push(Edge::default());
                    // The map keeps only the first half-edge of each edge;
                    // the other direction is reached through `twin`.
                    self.edge_map.insert(directed_edge_key(a, b), h);
                    (HalfEdgeId::invalid(), e)
                }
            };

            self.half_edges.push(HalfEdge {
                to: b,
                next,
                prev,
                twin,
                edge,
                face: face_id,
            });

            let vert = &mut self.vertices[a.index()];
            if !vert.outgoing.is_valid() {
                vert.outgoing = h;
            }
        }

        self.invalidate_cache();
        Ok(face_id)
    }

    fn report(&self, err: MeshError, context: String) -> MeshError {
        diagnostics::record(Severity::Error, err.code(), err.to_string(), context);
        err
    }

    /// Move a vertex. Invalidates the topology cache.
    pub fn set_position(&mut self, v: VertexId, position: Point3<f32>) -> Result<()> {
        self.check_vertex(v)?;
        self.positions[v.index()] = position;
        self.invalidate_cache();
        Ok(())
    }

    /// Assign a vertex UV. Invalidates the topology cache.
    pub fn set_uv(&mut self, v: VertexId, uv: Vector2<f32>) -> Result<()> {
        self.check_vertex(v)?;
        self.uvs[v.index()] = uv;
        self.invalidate_cache();
        Ok(())
    }

    /// Set an edge's sharpness, clamped to be non-negative.
    ///
    /// A positive value tags the edge [`EdgeTag::Semi`]; zero resets it to
    /// [`EdgeTag::Smooth`]. Invalidates the topology cache.
    pub fn set_edge_sharpness(&mut self, e: EdgeId, sharpness: f32) -> Result<()> {
        self.check_edge(e)?;
        let sharpness = sharpness.max(0.0);
        let edge = &mut self.edges[e.index()];
        edge.sharpness = sharpness;
        edge.tag = if sharpness > 0.0 {
            EdgeTag::Semi
        } else {
            EdgeTag::Smooth
        };
        self.invalidate_cache();
        Ok(())
    }

    /// Mark or unmark an edge as a hard crease.
    ///
    /// Creasing forces sharpness to 1.0. Clearing resets the tag to
    /// [`EdgeTag::Smooth`] but leaves the sharpness value in place.
    /// Invalidates the topology cache.
    pub fn set_edge_crease(&mut self, e: EdgeId, crease: bool) -> Result<()> {
        self.check_edge(e)?;
        let edge = &mut self.edges[e.index()];
        if crease {
            edge.tag = EdgeTag::Crease;
            edge.sharpness = 1.0;
        } else {
            edge.tag = EdgeTag::Smooth;
        }
        self.invalidate_cache();
        Ok(())
    }

    fn check_vertex(&self, v: VertexId) -> Result<()> {
        if v.in_bounds(self.vertices.len()) {
            Ok(())
        } else {
            Err(self.report(
                MeshError::InvalidVertexIndex {
                    vertex: v.raw(),
                    count: self.vertices.len(),
                },
                String::new(),
            ))
        }
    }

    fn check_edge(&self, e: EdgeId) -> Result<()> {
        if e.in_bounds(self.edges.len()) {
            Ok(())
        } else {
            Err(self.report(
                MeshError::InvalidEdgeIndex {
                    edge: e.raw(),
                    count: self.edges.len(),
                },
                String::new(),
            ))
        }
    }

    /// Release every element, attribute, and the directed-edge map.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.half_edges.clear();
        self.edges.clear();
        self.faces.clear();
        self.positions.clear();
        self.normals.clear();
        self.uvs.clear();
        self.edge_map.clear();
        self.cache.clear();
    }

    /// Regenerate the directed-edge map from the half-edge array.
    ///
    /// After a rebuild the map holds every directed half-edge, not only the
    /// first of each twin pair; lookups behave identically.
    pub fn rebuild_edge_map(&mut self) {
        self.edge_map.clear();
        for (i, he) in self.half_edges.iter().enumerate() {
            if !he.prev.in_bounds(self.half_edges.len()) {
                continue;
            }
            let from = self.half_edges[he.prev.index()].to;
            self.edge_map
                .insert(directed_edge_key(from, he.to), HalfEdgeId::new(i));
        }
    }

    // ==================== Topology lookups ====================

    /// The source vertex of a half-edge: `to` of its `prev`.
    #[inline]
    pub fn from_vertex(&self, h: HalfEdgeId) -> VertexId {
        from_vertex_in(&self.half_edges, h)
    }

    /// Find the half-edge directed `a -> b`.
    ///
    /// The directed-edge map stores only the half-edge first created for
    /// each edge; when `(a, b)` is absent but `(b, a)` is present the result
    /// is the stored half-edge's twin — which is itself invalid when that
    /// edge is a boundary.
    pub fn find_half_edge(&self, a: VertexId, b: VertexId) -> HalfEdgeId {
        if let Some(&h) = self.edge_map.get(&directed_edge_key(a, b)) {
            return h;
        }
        if let Some(&h) = self.edge_map.get(&directed_edge_key(b, a)) {
            return self.half_edges[h.index()].twin;
        }
        HalfEdgeId::invalid()
    }

    /// Find the undirected edge between two vertices, either direction.
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> EdgeId {
        for key in [directed_edge_key(a, b), directed_edge_key(b, a)] {
            if let Some(&h) = self.edge_map.get(&key) {
                return self.half_edges[h.index()].edge;
            }
        }
        EdgeId::invalid()
    }

    // ==================== Topology cache ====================

    /// Build the topology cache if it is stale. Idempotent.
    pub fn build_cache(&mut self) {
        if self.cache.is_valid() {
            return;
        }
        let mut cache = std::mem::take(&mut self.cache);
        cache.build(self);
        self.cache = cache;
    }

    /// The topology cache. Empty until [`Self::build_cache`] (or any lazy
    /// query) has run since the last mutation.
    #[inline]
    pub fn cache(&self) -> &TopologyCache {
        &self.cache
    }

    #[inline]
    fn invalidate_cache(&mut self) {
        self.cache.clear();
    }

    /// Vertex valence (number of incident undirected edges).
    pub fn get_valence(&mut self, v: VertexId) -> u16 {
        self.build_cache();
        self.cache.valence(v)
    }

    /// Whether a vertex lies on the boundary. Isolated vertices do.
    pub fn is_boundary_vertex(&mut self, v: VertexId) -> bool {
        self.build_cache();
        if !v.in_bounds(self.vertices.len()) {
            return false;
        }
        if !self.vertices[v.index()].outgoing.is_valid() {
            return true;
        }
        self.cache.is_boundary_vertex(v)
    }

    /// Whether an edge has fewer than two adjacent faces.
    pub fn is_boundary_edge(&mut self, e: EdgeId) -> bool {
        self.build_cache();
        self.cache.is_boundary_edge(e)
    }

    /// Neighboring vertices of `v` in consistent angular order.
    pub fn get_one_ring(&mut self, v: VertexId) -> &[VertexId] {
        self.build_cache();
        self.cache.vertex_one_ring(v)
    }

    /// Faces incident to `v`.
    pub fn get_vertex_faces(&mut self, v: VertexId) -> &[FaceId] {
        self.build_cache();
        self.cache.vertex_faces(v)
    }

    /// The two endpoints of an edge in canonical order (`u < w`).
    pub fn get_edge_vertices(&mut self, e: EdgeId) -> [VertexId; 2] {
        self.build_cache();
        self.cache.edge_vertices(e)
    }

    /// Faces incident to an edge: one for boundary, two for interior.
    pub fn get_edge_faces(&mut self, e: EdgeId) -> &[FaceId] {
        self.build_cache();
        self.cache.edge_faces(e)
    }

    /// Vertices of a face in loop order.
    pub fn get_face_vertices(&mut self, f: FaceId) -> &[VertexId] {
        self.build_cache();
        self.cache.face_vertices(f)
    }

    /// Edges of a face in loop order.
    pub fn get_face_edges(&mut self, f: FaceId) -> &[EdgeId] {
        self.build_cache();
        self.cache.face_edges(f)
    }

    // ==================== Derived attributes ====================

    /// Recompute per-vertex normals as the normalized, area-weighted sum of
    /// incident face normals. Degenerate results fall back to +Y.
    pub fn compute_normals(&mut self) {
        let _t = ScopedTimer::new("ControlMesh::compute_normals");

        let faces = &self.faces;
        let half_edges = &self.half_edges;
        let positions = &self.positions;
        let normals = &mut self.normals;

        let face_normals: Vec<Vector3<f32>> = (0..faces.len())
            .into_par_iter()
            .map(|f| face_normal(faces, half_edges, positions, f))
            .collect();

        for n in normals.iter_mut() {
            *n = Vector3::zeros();
        }

        for (f, face) in faces.iter().enumerate() {
            let start = face.edge;
            if !start.in_bounds(half_edges.len()) {
                continue;
            }
            let mut current = start;
            let mut steps = 0u32;
            loop {
                let v = from_vertex_in(half_edges, current);
                if v.in_bounds(normals.len()) {
                    normals[v.index()] += face_normals[f];
                }
                current = half_edges[current.index()].next;
                steps += 1;
                if !current.in_bounds(half_edges.len())
                    || current == start
                    || steps > face.valence + FACE_LOOP_SLACK
                {
                    break;
                }
            }
        }

        for n in normals.iter_mut() {
            let len = n.norm();
            if len > 1e-6 {
                *n /= len;
            } else {
                *n = Vector3::y();
            }
        }
    }

    // ==================== Validation ====================

    /// Check every structural invariant.
    ///
    /// Returns `true` exactly when the mesh is consistent; each violation is
    /// recorded in the diagnostics sink with its code.
    pub fn validate(&self) -> bool {
        let _t = ScopedTimer::new("ControlMesh::validate");

        let mut valid = true;
        let fail = |code: &'static str, message: &str, context: String| {
            diagnostics::record(Severity::Error, code, message, context);
        };

        let nh = self.half_edges.len();
        let nv = self.vertices.len();
        let ne = self.edges.len();
        let nf = self.faces.len();

        for (i, he) in self.half_edges.iter().enumerate() {
            let ctx = || format!("half-edge {i}");

            if !he.to.in_bounds(nv) {
                valid = false;
                fail("INVALID_HALFEDGE_TO", "half-edge 'to' vertex out of bounds", ctx());
                continue;
            }

            if he.twin.is_valid() {
                if !he.twin.in_bounds(nh) {
                    valid = false;
                    fail("INVALID_HALFEDGE_TWIN", "half-edge twin out of bounds", ctx());
                } else {
                    let twin = &self.half_edges[he.twin.index()];
                    if twin.twin != HalfEdgeId::new(i) {
                        valid = false;
                        fail(
                            "HALFEDGE_TWIN_MISMATCH",
                            "twin half-edge does not point back",
                            ctx(),
                        );
                    }
                    if he.edge.is_valid() && twin.edge != he.edge {
                        valid = false;
                        fail(
                            "HALFEDGE_TWIN_MISMATCH",
                            "twin half-edges disagree on parent edge",
                            ctx(),
                        );
                    }
                    let from = self.from_vertex(HalfEdgeId::new(i));
                    if from.is_valid() && twin.to != from {
                        valid = false;
                        fail(
                            "HALFEDGE_TWIN_MISMATCH",
                            "twin destination is not this half-edge's source",
                            ctx(),
                        );
                    }
                }
            }

            if he.next.is_valid() && !he.next.in_bounds(nh) {
                valid = false;
                fail("INVALID_HALFEDGE_NEXT", "half-edge next out of bounds", ctx());
            }
            if he.prev.is_valid() && !he.prev.in_bounds(nh) {
                valid = false;
                fail("INVALID_HALFEDGE_PREV", "half-edge prev out of bounds", ctx());
            }
            if he.edge.is_valid() && !he.edge.in_bounds(ne) {
                valid = false;
                fail("INVALID_HALFEDGE_EDGE", "half-edge parent edge out of bounds", ctx());
            }
            if he.face.is_valid() && !he.face.in_bounds(nf) {
                valid = false;
                fail("INVALID_HALFEDGE_FACE", "half-edge face out of bounds", ctx());
            }

            if he.next.in_bounds(nh) && self.half_edges[he.next.index()].prev != HalfEdgeId::new(i)
            {
                valid = false;
                fail(
                    "HALFEDGE_NEXT_PREV_MISMATCH",
                    "next->prev does not point back",
                    ctx(),
                );
            }
            if he.prev.in_bounds(nh) && self.half_edges[he.prev.index()].next != HalfEdgeId::new(i)
            {
                valid = false;
                fail(
                    "HALFEDGE_PREV_NEXT_MISMATCH",
                    "prev->next does not point back",
                    ctx(),
                );
            }
        }

        for (i, face) in self.faces.iter().enumerate() {
            if !face.edge.in_bounds(nh) {
                valid = false;
                fail("INVALID_FACE_EDGE", "face half-edge out of bounds", format!("face {i}"));
                continue;
            }

            let start = face.edge;
            let mut current = start;
            let mut count = 0u32;
            loop {
                if !current.in_bounds(nh) {
                    break;
                }
                if self.half_edges[current.index()].face != FaceId::new(i) {
                    valid = false;
                    fail(
                        "FACE_LOOP_WRONG_FACE",
                        "face loop half-edge points at another face",
                        format!("face {i}"),
                    );
                }
                current = self.half_edges[current.index()].next;
                count += 1;
                if count > face.valence + 1 {
                    valid = false;
                    fail("FACE_LOOP_TOO_LONG", "face loop exceeds stored valence", format!("face {i}"));
                    break;
                }
                if current == start {
                    break;
                }
            }

            if count != face.valence {
                valid = false;
                fail(
                    "FACE_VALENCE_MISMATCH",
                    "face valence does not match loop length",
                    format!("face {i}: expected {}, got {count}", face.valence),
                );
            }
        }

        // Manifoldness: every edge is held by one or two half-edges.
        let mut edge_use = vec![0u32; ne];
        for he in &self.half_edges {
            if he.edge.in_bounds(ne) {
                edge_use[he.edge.index()] += 1;
            }
        }
        for (e, &uses) in edge_use.iter().enumerate() {
            if uses > 2 {
                valid = false;
                fail(
                    "NON_MANIFOLD_EDGE",
                    "edge referenced by more than two half-edges",
                    format!("edge {e}: {uses} half-edges"),
                );
            }
            if uses == 0 {
                valid = false;
                fail("ORPHANED_EDGE", "edge referenced by no half-edge", format!("edge {e}"));
            }
        }

        for (name, len) in [
            ("positions", self.positions.len()),
            ("normals", self.normals.len()),
            ("uvs", self.uvs.len()),
        ] {
            if len != nv {
                valid = false;
                fail(
                    "ATTRIBUTE_SIZE_MISMATCH",
                    "attribute array length differs from vertex count",
                    format!("{name}: {len} entries for {nv} vertices"),
                );
            }
        }

        for (&key, &h) in &self.edge_map {
            let from = VertexId::from_raw((key >> 32) as u32);
            let to = VertexId::from_raw(key as u32);
            if !h.in_bounds(nh)
                || self.half_edges[h.index()].to != to
                || self.from_vertex(h) != from
            {
                valid = false;
                fail(
                    "EDGE_MAP_MISMATCH",
                    "directed-edge map entry disagrees with half-edge arrays",
                    format!("key ({}, {})", from.raw(), to.raw()),
                );
            }
        }

        valid
    }

    // ==================== Memory & GPU access ====================

    /// Total heap usage in bytes: topology, attributes, map, and cache.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;
        self.vertices.len() * size_of::<Vertex>()
            + self.half_edges.len() * size_of::<HalfEdge>()
            + self.edges.len() * size_of::<Edge>()
            + self.faces.len() * size_of::<Face>()
            + self.positions.len() * size_of::<Point3<f32>>()
            + self.normals.len() * size_of::<Vector3<f32>>()
            + self.uvs.len() * size_of::<Vector2<f32>>()
            + self.edge_map.len() * (size_of::<u64>() + size_of::<HalfEdgeId>())
            + self.cache.memory_usage()
    }

    /// Positions as tightly packed bytes (three `f32` per vertex).
    #[inline]
    pub fn positions_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Normals as tightly packed bytes (three `f32` per vertex).
    #[inline]
    pub fn normals_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// UVs as tightly packed bytes (two `f32` per vertex).
    #[inline]
    pub fn uvs_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }

    /// Cached valences as bytes (`u16` per vertex). Empty until the cache is
    /// built.
    #[inline]
    pub fn valences_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.cache.valences())
    }

    /// Cached one-ring values as bytes (`u32` per entry). Empty until the
    /// cache is built.
    #[inline]
    pub fn one_rings_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.cache.one_rings())
    }

    /// Cached one-ring CSR offsets as bytes (`u32`, length `V + 1`). Empty
    /// until the cache is built.
    #[inline]
    pub fn one_ring_offsets_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.cache.one_ring_offsets())
    }
}

fn from_vertex_in(half_edges: &[HalfEdge], h: HalfEdgeId) -> VertexId {
    if !h.in_bounds(half_edges.len()) {
        return VertexId::invalid();
    }
    let prev = half_edges[h.index()].prev;
    if !prev.in_bounds(half_edges.len()) {
        return VertexId::invalid();
    }
    half_edges[prev.index()].to
}

fn face_normal(
    faces: &[Face],
    half_edges: &[HalfEdge],
    positions: &[Point3<f32>],
    f: usize,
) -> Vector3<f32> {
    let fallback = Vector3::y();

    let he0 = faces[f].edge;
    if !he0.in_bounds(half_edges.len()) {
        return fallback;
    }
    let he1 = half_edges[he0.index()].next;
    let prev = half_edges[he0.index()].prev;
    if !he1.in_bounds(half_edges.len()) || !prev.in_bounds(half_edges.len()) {
        return fallback;
    }

    let v0 = half_edges[prev.index()].to;
    let v1 = half_edges[he0.index()].to;
    let v2 = half_edges[he1.index()].to;
    if !v0.in_bounds(positions.len())
        || !v1.in_bounds(positions.len())
        || !v2.in_bounds(positions.len())
    {
        return fallback;
    }

    let p0 = positions[v0.index()];
    let e1 = positions[v1.index()] - p0;
    let e2 = positions[v2.index()] - p0;
    let n = e1.cross(&e2);
    let len = n.norm();
    if len > 1e-6 {
        n / len
    } else {
        fallback
    }
}
