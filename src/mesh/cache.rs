//! Precomputed topology cache.
//!
//! [`TopologyCache`] converts the half-edge graph into dense arrays that
//! answer neighborhood queries in O(1) and upload to the GPU verbatim:
//!
//! - SOA per-vertex data: valences (`u16`) and boundary flags (`u8`).
//! - Per-edge data: canonical endpoints (`u < w`) and boundary flags.
//! - Five CSR tables: vertex one-rings (consistent angular order),
//!   vertex-face, edge-face, face-vertex, and face-edge incidence.
//!
//! The build is a one-shot, total pass over the mesh; it is rebuilt from
//! scratch after any mutation. Problems found while building are recorded as
//! warnings — a malformed mesh should still yield whatever arrays can be
//! extracted.

use super::control::ControlMesh;
use super::index::{EdgeId, FaceId, HalfEdgeId, VertexId};
use crate::diagnostics::{self, ScopedTimer, Severity};

/// Dense neighborhood tables derived from a [`ControlMesh`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologyCache {
    // Per-vertex SOA data.
    valences: Vec<u16>,
    boundary_flags: Vec<u8>,

    // Vertex one-rings, CSR.
    one_rings: Vec<VertexId>,
    one_ring_offsets: Vec<u32>,

    // Vertex-face incidence, CSR.
    vertex_faces: Vec<FaceId>,
    vertex_face_offsets: Vec<u32>,

    // Per-edge data, canonical endpoint order.
    edge_vertices: Vec<[VertexId; 2]>,
    edge_boundary_flags: Vec<u8>,

    // Edge-face incidence, CSR.
    edge_faces: Vec<FaceId>,
    edge_face_offsets: Vec<u32>,

    // Face vertices and edges in loop order, CSR.
    face_vertices: Vec<VertexId>,
    face_vertex_offsets: Vec<u32>,
    face_edges: Vec<EdgeId>,
    face_edge_offsets: Vec<u32>,

    num_boundary_vertices: usize,
    num_boundary_edges: usize,

    valid: bool,
}

/// Reusable visited bitset with targeted reset, for cycle guards.
struct VisitedSet {
    flags: Vec<bool>,
    touched: Vec<u32>,
}

impl VisitedSet {
    fn new(len: usize) -> Self {
        Self {
            flags: vec![false; len],
            touched: Vec::new(),
        }
    }

    /// Mark `h`; returns false when it was already marked.
    fn insert(&mut self, h: HalfEdgeId) -> bool {
        let slot = &mut self.flags[h.index()];
        if *slot {
            return false;
        }
        *slot = true;
        self.touched.push(h.raw());
        true
    }

    fn reset(&mut self) {
        for i in self.touched.drain(..) {
            self.flags[i as usize] = false;
        }
    }
}

impl TopologyCache {
    /// Whether the cache reflects the mesh it was last built from.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Drop all cached data.
    pub fn clear(&mut self) {
        self.valences.clear();
        self.boundary_flags.clear();
        self.one_rings.clear();
        self.one_ring_offsets.clear();
        self.vertex_faces.clear();
        self.vertex_face_offsets.clear();
        self.edge_vertices.clear();
        self.edge_boundary_flags.clear();
        self.edge_faces.clear();
        self.edge_face_offsets.clear();
        self.face_vertices.clear();
        self.face_vertex_offsets.clear();
        self.face_edges.clear();
        self.face_edge_offsets.clear();
        self.num_boundary_vertices = 0;
        self.num_boundary_edges = 0;
        self.valid = false;
    }

    /// Build every table from the mesh in one pass over each element kind.
    ///
    /// Complexity O(V + E + F + H).
    pub fn build(&mut self, mesh: &ControlMesh) {
        let _t = ScopedTimer::new("TopologyCache::build");

        self.clear();

        let num_verts = mesh.num_vertices();
        let num_edges = mesh.num_edges();
        let num_faces = mesh.num_faces();
        let num_half_edges = mesh.num_half_edges();
        let half_edges = mesh.half_edges();

        if num_verts == 0 {
            self.valid = true;
            return;
        }

        self.edge_vertices
            .resize(num_edges, [VertexId::invalid(), VertexId::invalid()]);
        self.edge_boundary_flags.resize(num_edges, 1);

        // Phase 1: edge endpoints, face counts, boundary flags, one pass
        // over the half-edges.
        let mut edge_face_counts = vec![0u32; num_edges];
        for (i, he) in half_edges.iter().enumerate() {
            if !he.edge.in_bounds(num_edges) {
                continue;
            }
            let e = he.edge.index();

            if !self.edge_vertices[e][0].is_valid() {
                let mut u = mesh.from_vertex(HalfEdgeId::new(i));
                let mut w = he.to;
                if u.raw() > w.raw() {
                    std::mem::swap(&mut u, &mut w);
                }
                self.edge_vertices[e] = [u, w];
            }

            if he.face.is_valid() {
                edge_face_counts[e] += 1;
            }
            if he.twin.is_valid() {
                self.edge_boundary_flags[e] = 0;
            }
        }

        for (e, &count) in edge_face_counts.iter().enumerate() {
            if count > 2 {
                diagnostics::record(
                    Severity::Warning,
                    "NON_MANIFOLD_EDGE_DETECTED",
                    "edge has more than two adjacent faces",
                    format!("edge {e}: {count} faces"),
                );
            }
        }

        self.num_boundary_edges = self
            .edge_boundary_flags
            .iter()
            .filter(|&&f| f != 0)
            .count();

        // Phase 2: valence = number of incident undirected edges.
        self.valences.resize(num_verts, 0);
        for [u, w] in &self.edge_vertices {
            if u.in_bounds(num_verts) {
                self.valences[u.index()] = self.valences[u.index()].saturating_add(1);
            }
            if w.in_bounds(num_verts) {
                self.valences[w.index()] = self.valences[w.index()].saturating_add(1);
            }
        }

        // Phase 3: a vertex is boundary when any incident edge is.
        self.boundary_flags.resize(num_verts, 0);
        for (e, [u, w]) in self.edge_vertices.iter().enumerate() {
            if self.edge_boundary_flags[e] == 0 {
                continue;
            }
            if u.in_bounds(num_verts) {
                self.boundary_flags[u.index()] = 1;
            }
            if w.in_bounds(num_verts) {
                self.boundary_flags[w.index()] = 1;
            }
        }
        self.num_boundary_vertices = self.boundary_flags.iter().filter(|&&f| f != 0).count();

        // Phase 4: count vertex-face incidences by walking each face loop.
        let mut visited = VisitedSet::new(num_half_edges);
        let mut vertex_face_counts = vec![0u32; num_verts];
        for (f, face) in mesh.faces().iter().enumerate() {
            let start = face.edge;
            if !start.in_bounds(num_half_edges) {
                continue;
            }
            let mut current = start;
            loop {
                if !visited.insert(current) {
                    diagnostics::record(
                        Severity::Warning,
                        "CYCLE_IN_FACE",
                        "cycle detected in face loop",
                        format!("face {f}"),
                    );
                    break;
                }
                let v = mesh.from_vertex(current);
                if v.in_bounds(num_verts) {
                    vertex_face_counts[v.index()] += 1;
                }
                current = half_edges[current.index()].next;
                if current == start || !current.in_bounds(num_half_edges) {
                    break;
                }
            }
            visited.reset();
        }

        // Phase 5: CSR prefix sums.
        self.one_ring_offsets = prefix_sums(num_verts, |v| self.valences[v] as u32);
        self.vertex_face_offsets = prefix_sums(num_verts, |v| vertex_face_counts[v]);
        self.edge_face_offsets = prefix_sums(num_edges, |e| edge_face_counts[e]);
        self.face_vertex_offsets = prefix_sums(num_faces, |f| mesh.faces()[f].valence);
        self.face_edge_offsets = prefix_sums(num_faces, |f| mesh.faces()[f].valence);

        // Phase 6: allocate the flattened value arrays.
        self.one_rings
            .resize(*self.one_ring_offsets.last().unwrap() as usize, VertexId::invalid());
        self.vertex_faces
            .resize(*self.vertex_face_offsets.last().unwrap() as usize, FaceId::invalid());
        self.edge_faces
            .resize(*self.edge_face_offsets.last().unwrap() as usize, FaceId::invalid());
        self.face_vertices
            .resize(*self.face_vertex_offsets.last().unwrap() as usize, VertexId::invalid());
        self.face_edges
            .resize(*self.face_edge_offsets.last().unwrap() as usize, EdgeId::invalid());

        // Phase 7: fill one-rings in consistent angular order.
        self.fill_one_rings(mesh, &mut visited);

        // Phase 8: fill face loops and the vertex/edge incidence tables.
        let mut vertex_face_pos = self.vertex_face_offsets.clone();
        let mut edge_face_pos = self.edge_face_offsets.clone();

        for (f, face) in mesh.faces().iter().enumerate() {
            let start = face.edge;
            if !start.in_bounds(num_half_edges) {
                continue;
            }

            let mut face_vert_pos = self.face_vertex_offsets[f];
            let mut face_edge_pos = self.face_edge_offsets[f];
            let face_vert_end = self.face_vertex_offsets[f + 1];
            let face_edge_end = self.face_edge_offsets[f + 1];

            let mut current = start;
            loop {
                if !visited.insert(current) {
                    break;
                }
                let he = &half_edges[current.index()];

                let v = mesh.from_vertex(current);
                if v.in_bounds(num_verts) {
                    if face_vert_pos < face_vert_end {
                        self.face_vertices[face_vert_pos as usize] = v;
                        face_vert_pos += 1;
                    }
                    let cursor = &mut vertex_face_pos[v.index()];
                    if *cursor < self.vertex_face_offsets[v.index() + 1] {
                        self.vertex_faces[*cursor as usize] = FaceId::new(f);
                        *cursor += 1;
                    }
                }

                if he.edge.in_bounds(num_edges) {
                    if face_edge_pos < face_edge_end {
                        self.face_edges[face_edge_pos as usize] = he.edge;
                        face_edge_pos += 1;
                    }
                    let cursor = &mut edge_face_pos[he.edge.index()];
                    if *cursor < self.edge_face_offsets[he.edge.index() + 1] {
                        self.edge_faces[*cursor as usize] = FaceId::new(f);
                        *cursor += 1;
                    }
                }

                current = he.next;
                if current == start || !current.in_bounds(num_half_edges) {
                    break;
                }
            }
            visited.reset();
        }

        // Phase 9: every write cursor must have reached the next offset.
        for v in 0..num_verts {
            if vertex_face_pos[v] != self.vertex_face_offsets[v + 1] {
                diagnostics::record(
                    Severity::Warning,
                    "VERTEX_FACE_CSR_INCOMPLETE",
                    "vertex-face table not fully filled",
                    format!("vertex {v}"),
                );
            }
        }
        for e in 0..num_edges {
            if edge_face_pos[e] != self.edge_face_offsets[e + 1] {
                diagnostics::record(
                    Severity::Warning,
                    "EDGE_FACE_CSR_INCOMPLETE",
                    "edge-face table not fully filled",
                    format!("edge {e}"),
                );
            }
        }

        tracing::debug!(
            vertices = num_verts,
            edges = num_edges,
            faces = num_faces,
            boundary_vertices = self.num_boundary_vertices,
            boundary_edges = self.num_boundary_edges,
            "topology cache built"
        );

        self.valid = true;
    }

    /// One-ring fill: rotate forward (`next` of `twin`) from the stored
    /// outgoing half-edge; when that hits a boundary, walk backward from the
    /// original start (`twin` of `prev`) to pick up the other side of the
    /// fan, ending with the source of the far boundary half-edge.
    fn fill_one_rings(&mut self, mesh: &ControlMesh, visited: &mut VisitedSet) {
        let num_verts = mesh.num_vertices();
        let num_half_edges = mesh.num_half_edges();
        let half_edges = mesh.half_edges();

        for v in 0..num_verts {
            let start = mesh.vertices()[v].outgoing;
            if !start.in_bounds(num_half_edges) {
                continue;
            }

            let mut write = self.one_ring_offsets[v];
            let write_start = write;
            let write_end = self.one_ring_offsets[v + 1];
            let push = |ring: &mut Vec<VertexId>, write: &mut u32, n: VertexId| {
                if *write < write_end {
                    ring[*write as usize] = n;
                    *write += 1;
                }
            };

            let mut current = start;
            let mut hit_boundary = false;
            loop {
                if !visited.insert(current) {
                    break;
                }
                let he = &half_edges[current.index()];
                push(&mut self.one_rings, &mut write, he.to);

                if !he.twin.is_valid() {
                    hit_boundary = true;
                    break;
                }
                if !he.twin.in_bounds(num_half_edges) {
                    break;
                }
                current = half_edges[he.twin.index()].next;
                if current == start || !current.in_bounds(num_half_edges) {
                    break;
                }
            }

            if hit_boundary {
                let mut h = start;
                loop {
                    let prev = half_edges[h.index()].prev;
                    if !prev.in_bounds(num_half_edges) {
                        break;
                    }
                    let prev_twin = half_edges[prev.index()].twin;
                    if !prev_twin.is_valid() {
                        push(&mut self.one_rings, &mut write, mesh.from_vertex(prev));
                        break;
                    }
                    if !prev_twin.in_bounds(num_half_edges) || !visited.insert(prev_twin) {
                        break;
                    }
                    push(&mut self.one_rings, &mut write, half_edges[prev_twin.index()].to);
                    h = prev_twin;
                }
            }

            let written = write - write_start;
            if written != self.valences[v] as u32 {
                diagnostics::record(
                    Severity::Warning,
                    "ONE_RING_COUNT_MISMATCH",
                    "one-ring length does not match valence",
                    format!("vertex {v}: expected {}, got {written}", self.valences[v]),
                );
            }
            visited.reset();
        }
    }

    // ==================== Vertex queries ====================

    /// Vertex valence (incident undirected edges); 0 for out-of-range ids.
    #[inline]
    pub fn valence(&self, v: VertexId) -> u16 {
        self.valences.get(v.index()).copied().unwrap_or(0)
    }

    /// Whether a vertex touches a boundary edge.
    #[inline]
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        self.boundary_flags.get(v.index()).copied().unwrap_or(0) != 0
    }

    /// Neighbors of `v` in consistent angular order. For boundary vertices
    /// the first and last entries are the two boundary neighbors.
    pub fn vertex_one_ring(&self, v: VertexId) -> &[VertexId] {
        csr_slice(&self.one_rings, &self.one_ring_offsets, v.index())
    }

    /// Faces incident to `v`.
    pub fn vertex_faces(&self, v: VertexId) -> &[FaceId] {
        csr_slice(&self.vertex_faces, &self.vertex_face_offsets, v.index())
    }

    // ==================== Edge queries ====================

    /// Whether an edge has fewer than two adjacent faces.
    #[inline]
    pub fn is_boundary_edge(&self, e: EdgeId) -> bool {
        self.edge_boundary_flags.get(e.index()).copied().unwrap_or(0) != 0
    }

    /// Edge endpoints in canonical order (`u < w`); invalid pair for
    /// out-of-range ids.
    #[inline]
    pub fn edge_vertices(&self, e: EdgeId) -> [VertexId; 2] {
        self.edge_vertices
            .get(e.index())
            .copied()
            .unwrap_or([VertexId::invalid(), VertexId::invalid()])
    }

    /// Faces incident to an edge: one for boundary, two for interior.
    pub fn edge_faces(&self, e: EdgeId) -> &[FaceId] {
        csr_slice(&self.edge_faces, &self.edge_face_offsets, e.index())
    }

    // ==================== Face queries ====================

    /// Vertices of a face in loop order.
    pub fn face_vertices(&self, f: FaceId) -> &[VertexId] {
        csr_slice(&self.face_vertices, &self.face_vertex_offsets, f.index())
    }

    /// Edges of a face in loop order.
    pub fn face_edges(&self, f: FaceId) -> &[EdgeId] {
        csr_slice(&self.face_edges, &self.face_edge_offsets, f.index())
    }

    // ==================== Totals ====================

    /// Number of vertices covered by the cache.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.valences.len()
    }

    /// Number of edges covered by the cache.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edge_vertices.len()
    }

    /// Number of faces covered by the cache.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.face_vertex_offsets.len().saturating_sub(1)
    }

    /// Number of boundary vertices.
    #[inline]
    pub fn num_boundary_vertices(&self) -> usize {
        self.num_boundary_vertices
    }

    /// Number of boundary edges.
    #[inline]
    pub fn num_boundary_edges(&self) -> usize {
        self.num_boundary_edges
    }

    /// Total heap usage of all cached arrays in bytes.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;
        self.valences.len() * size_of::<u16>()
            + self.boundary_flags.len() * size_of::<u8>()
            + self.one_rings.len() * size_of::<VertexId>()
            + self.one_ring_offsets.len() * size_of::<u32>()
            + self.vertex_faces.len() * size_of::<FaceId>()
            + self.vertex_face_offsets.len() * size_of::<u32>()
            + self.edge_vertices.len() * size_of::<[VertexId; 2]>()
            + self.edge_boundary_flags.len() * size_of::<u8>()
            + self.edge_faces.len() * size_of::<FaceId>()
            + self.edge_face_offsets.len() * size_of::<u32>()
            + self.face_vertices.len() * size_of::<VertexId>()
            + self.face_vertex_offsets.len() * size_of::<u32>()
            + self.face_edges.len() * size_of::<EdgeId>()
            + self.face_edge_offsets.len() * size_of::<u32>()
    }

    // ==================== Direct array access (GPU upload) ====================

    /// Valence per vertex.
    #[inline]
    pub fn valences(&self) -> &[u16] {
        &self.valences
    }

    /// Boundary flag per vertex (1 = boundary).
    #[inline]
    pub fn boundary_flags(&self) -> &[u8] {
        &self.boundary_flags
    }

    /// Flattened one-ring values.
    #[inline]
    pub fn one_rings(&self) -> &[VertexId] {
        &self.one_rings
    }

    /// One-ring CSR offsets, length `V + 1`.
    #[inline]
    pub fn one_ring_offsets(&self) -> &[u32] {
        &self.one_ring_offsets
    }

    /// Canonical endpoint pair per edge.
    #[inline]
    pub fn edge_vertices_array(&self) -> &[[VertexId; 2]] {
        &self.edge_vertices
    }

    /// Boundary flag per edge (1 = boundary).
    #[inline]
    pub fn edge_boundary_flags(&self) -> &[u8] {
        &self.edge_boundary_flags
    }
}

fn prefix_sums(n: usize, count: impl Fn(usize) -> u32) -> Vec<u32> {
    let mut offsets = vec![0u32; n + 1];
    for i in 0..n {
        offsets[i + 1] = offsets[i] + count(i);
    }
    offsets
}

fn csr_slice<'a, T>(values: &'a [T], offsets: &[u32], i: usize) -> &'a [T] {
    if offsets.len() < 2 || i + 1 >= offsets.len() {
        return &[];
    }
    &values[offsets[i] as usize..offsets[i + 1] as usize]
}
