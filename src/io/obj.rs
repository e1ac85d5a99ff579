//! Wavefront OBJ import and export.
//!
//! The importer understands the subset of OBJ relevant to control meshes:
//!
//! - `v x y z` appends a vertex, `vt u v` assigns a UV positionally.
//! - `f i j k ...` appends a face of arbitrary valence. Indices are 1-based;
//!   negative indices count backward from the current vertex list; the
//!   `i/t/n` triplet syntax is accepted (only the vertex index is used).
//! - `g name` / `o name` collect subsequent faces into a named group.
//! - `#` starts a comment. The special comment `# crease a b s` is recorded
//!   during parsing and applied once all topology is built, tagging the edge
//!   `(a, b)` with sharpness `s` (a full crease when `s >= 1`).
//!
//! Faces the mesh builder rejects (non-manifold, degenerate) are skipped
//! with a warning so one bad polygon does not abort the whole import.

use std::collections::HashMap;
use std::fs;
use std::io::Write as _;
use std::path::Path;

use nalgebra::{Point3, Vector2};

use crate::diagnostics::{self, ScopedTimer, Severity};
use crate::error::{MeshError, Result};
use crate::mesh::{undirected_edge_key, ControlMesh, EdgeTag, FaceGroup, VertexId};

/// Load an OBJ file into a control mesh, discarding group information.
pub fn load<P: AsRef<Path>>(path: P) -> Result<ControlMesh> {
    load_with_groups(path).map(|(mesh, _)| mesh)
}

/// Load an OBJ file into a control mesh, keeping `g`/`o` face groups.
pub fn load_with_groups<P: AsRef<Path>>(path: P) -> Result<(ControlMesh, Vec<FaceGroup>)> {
    let _t = ScopedTimer::new("obj::load");
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;

    let parse_error = |line: usize, message: String| {
        let err = MeshError::Parse {
            path: path.to_path_buf(),
            line,
            message,
        };
        diagnostics::record(Severity::Error, err.code(), err.to_string(), String::new());
        err
    };

    let mut mesh = ControlMesh::new();
    let mut groups: Vec<FaceGroup> = Vec::new();
    let mut current_group: Option<usize> = None;
    let mut uv_cursor = 0usize;
    // Raw 1-based/negative crease directives, resolved after the topology
    // exists. Last directive per undirected edge wins.
    let mut creases: Vec<(i64, i64, f32)> = Vec::new();

    for (line_index, line) in text.lines().enumerate() {
        let line_no = line_index + 1;
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let mut coords = [0.0f32; 3];
                for c in &mut coords {
                    let token = tokens
                        .next()
                        .ok_or_else(|| parse_error(line_no, "vertex needs 3 coordinates".into()))?;
                    *c = token.parse().map_err(|_| {
                        parse_error(line_no, format!("bad vertex coordinate '{token}'"))
                    })?;
                }
                mesh.add_vertex(Point3::new(coords[0], coords[1], coords[2]));
            }
            "vt" => {
                let mut uv = [0.0f32; 2];
                for c in &mut uv {
                    let token = tokens
                        .next()
                        .ok_or_else(|| parse_error(line_no, "uv needs 2 coordinates".into()))?;
                    *c = token.parse().map_err(|_| {
                        parse_error(line_no, format!("bad uv coordinate '{token}'"))
                    })?;
                }
                // UVs are assigned positionally: the i-th `vt` belongs to
                // the i-th vertex.
                if uv_cursor < mesh.num_vertices() {
                    mesh.set_uv(VertexId::new(uv_cursor), Vector2::new(uv[0], uv[1]))?;
                }
                uv_cursor += 1;
            }
            "f" => {
                let mut verts = Vec::new();
                for token in tokens {
                    let index_text = token.split('/').next().unwrap_or(token);
                    let raw: i64 = index_text.parse().map_err(|_| {
                        parse_error(line_no, format!("bad face index '{token}'"))
                    })?;
                    let v = resolve_index(raw, mesh.num_vertices())
                        .ok_or_else(|| {
                            parse_error(line_no, format!("face index {raw} out of range"))
                        })?;
                    verts.push(v);
                }

                match mesh.add_face(&verts) {
                    Ok(face) => {
                        if let Some(g) = current_group {
                            groups[g].faces.push(face);
                        }
                    }
                    Err(err) => {
                        tracing::warn!(
                            line = line_no,
                            code = err.code(),
                            "skipping rejected face: {err}"
                        );
                        diagnostics::record(
                            Severity::Warning,
                            err.code(),
                            format!("skipping rejected face: {err}"),
                            format!("{}:{line_no}", path.display()),
                        );
                    }
                }
            }
            "g" | "o" => {
                let name = tokens.collect::<Vec<_>>().join(" ");
                let name = if name.is_empty() {
                    "default".to_string()
                } else {
                    name
                };
                groups.push(FaceGroup {
                    name,
                    faces: Vec::new(),
                });
                current_group = Some(groups.len() - 1);
            }
            "#" => {
                // `# crease a b s` defers edge sharpness until after build.
                let rest: Vec<&str> = tokens.collect();
                if rest.first() == Some(&"crease") {
                    if rest.len() != 4 {
                        diagnostics::record(
                            Severity::Warning,
                            "PARSE_ERROR",
                            "malformed crease comment",
                            format!("{}:{line_no}", path.display()),
                        );
                        continue;
                    }
                    match (
                        rest[1].parse::<i64>(),
                        rest[2].parse::<i64>(),
                        rest[3].parse::<f32>(),
                    ) {
                        (Ok(a), Ok(b), Ok(s)) => creases.push((a, b, s)),
                        _ => diagnostics::record(
                            Severity::Warning,
                            "PARSE_ERROR",
                            "malformed crease comment",
                            format!("{}:{line_no}", path.display()),
                        ),
                    }
                }
            }
            // Normals, smoothing groups, and material references have no
            // counterpart in the control mesh.
            "vn" | "s" | "usemtl" | "mtllib" => {}
            k if k.starts_with('#') => {}
            _ => {
                tracing::debug!(line = line_no, keyword, "ignoring unknown OBJ record");
            }
        }
    }

    apply_creases(&mut mesh, &creases);

    tracing::debug!(
        path = %path.display(),
        vertices = mesh.num_vertices(),
        faces = mesh.num_faces(),
        groups = groups.len(),
        creases = creases.len(),
        "obj loaded"
    );

    Ok((mesh, groups))
}

/// Resolve a 1-based, possibly negative OBJ index.
fn resolve_index(raw: i64, count: usize) -> Option<VertexId> {
    let idx = if raw > 0 {
        raw - 1
    } else if raw < 0 {
        count as i64 + raw
    } else {
        return None;
    };
    if (0..count as i64).contains(&idx) {
        Some(VertexId::new(idx as usize))
    } else {
        None
    }
}

fn apply_creases(mesh: &mut ControlMesh, creases: &[(i64, i64, f32)]) {
    // Deduplicate per undirected edge, last directive wins.
    let mut resolved: HashMap<u64, (VertexId, VertexId, f32)> = HashMap::new();
    for &(a, b, s) in creases {
        let (Some(va), Some(vb)) = (
            resolve_index(a, mesh.num_vertices()),
            resolve_index(b, mesh.num_vertices()),
        ) else {
            diagnostics::record(
                Severity::Warning,
                "INVALID_VERTEX_INDEX",
                "crease endpoint out of range",
                format!("crease {a} {b}"),
            );
            continue;
        };
        resolved.insert(undirected_edge_key(va, vb), (va, vb, s));
    }

    for (va, vb, s) in resolved.into_values() {
        let e = mesh.find_edge(va, vb);
        if !e.is_valid() {
            diagnostics::record(
                Severity::Warning,
                "INVALID_EDGE_INDEX",
                "crease names a nonexistent edge",
                format!("vertices {} and {}", va.raw(), vb.raw()),
            );
            continue;
        }
        if s >= 1.0 {
            let _ = mesh.set_edge_crease(e, true);
        } else {
            let _ = mesh.set_edge_sharpness(e, s);
        }
    }
}

/// Save a mesh as OBJ, round-tripping the import contract.
///
/// Writes `v` records, `vt` records when any UV is set, `f` records from the
/// face loops, and a `# crease` comment per non-smooth edge.
pub fn save<P: AsRef<Path>>(mesh: &ControlMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = fs::File::create(path)?;
    let mut out = std::io::BufWriter::new(file);

    for p in mesh.positions() {
        writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
    }

    if mesh.uvs().iter().any(|uv| *uv != Vector2::zeros()) {
        for uv in mesh.uvs() {
            writeln!(out, "vt {} {}", uv.x, uv.y)?;
        }
    }

    for face in mesh.faces() {
        let mut record = String::from("f");
        let start = face.edge;
        let mut current = start;
        let mut steps = 0u32;
        loop {
            let v = mesh.from_vertex(current);
            if !v.is_valid() {
                break;
            }
            record.push_str(&format!(" {}", v.index() + 1));

            current = mesh.half_edges()[current.index()].next;
            steps += 1;
            if current == start
                || !current.in_bounds(mesh.num_half_edges())
                || steps > face.valence
            {
                break;
            }
        }
        writeln!(out, "{record}")?;
    }

    // Edge endpoints come from the half-edge arrays so a stale cache cannot
    // leak into the file.
    let mut endpoints = vec![[VertexId::invalid(); 2]; mesh.num_edges()];
    for (i, he) in mesh.half_edges().iter().enumerate() {
        if he.edge.in_bounds(mesh.num_edges()) && !endpoints[he.edge.index()][0].is_valid() {
            let from = mesh.from_vertex(crate::mesh::HalfEdgeId::new(i));
            endpoints[he.edge.index()] = [from, he.to];
        }
    }

    for (i, edge) in mesh.edges().iter().enumerate() {
        if edge.tag == EdgeTag::Smooth {
            continue;
        }
        let [a, b] = endpoints[i];
        if a.is_valid() && b.is_valid() {
            writeln!(
                out,
                "# crease {} {} {}",
                a.index() + 1,
                b.index() + 1,
                edge.sharpness
            )?;
        }
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("cage-obj-{}-{name}", std::process::id()));
        path
    }

    fn write_obj(name: &str, contents: &str) -> PathBuf {
        let path = temp_path(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_triangles_and_quads() {
        let path = write_obj(
            "basic.obj",
            "\
# a square and a roof
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0.5 0.5 1
f 1 2 3 4
f 4 3 5
",
        );

        let mesh = load(&path).unwrap();
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.faces()[0].valence, 4);
        assert_eq!(mesh.faces()[1].valence, 3);
        assert!(mesh.validate());

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn negative_and_triplet_indices() {
        let path = write_obj(
            "negative.obj",
            "\
v 0 0 0
v 1 0 0
v 0 1 0
f -3/1/1 -2/2/2 -1/3/3
",
        );

        let mesh = load(&path).unwrap();
        assert_eq!(mesh.num_faces(), 1);
        let loop_verts: Vec<usize> = (0..3)
            .map(|i| mesh.from_vertex(crate::mesh::HalfEdgeId::new(i)).index())
            .collect();
        assert_eq!(loop_verts, vec![0, 1, 2]);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn crease_comments_apply_after_build() {
        let path = write_obj(
            "crease.obj",
            "\
# crease 1 2 2.0
v 0 0 0
v 1 0 0
v 0 1 0
v 1 1 0
f 1 2 3
f 2 4 3
# crease 2 3 0.5
",
        );

        let mesh = load(&path).unwrap();
        let hard = mesh.find_edge(VertexId::new(0), VertexId::new(1));
        assert_eq!(mesh.edges()[hard.index()].tag, EdgeTag::Crease);
        assert_eq!(mesh.edges()[hard.index()].sharpness, 1.0);

        let semi = mesh.find_edge(VertexId::new(1), VertexId::new(2));
        assert_eq!(mesh.edges()[semi.index()].tag, EdgeTag::Semi);
        assert_eq!(mesh.edges()[semi.index()].sharpness, 0.5);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn groups_collect_faces() {
        let path = write_obj(
            "groups.obj",
            "\
v 0 0 0
v 1 0 0
v 0 1 0
v 1 1 0
g left wing
f 1 2 3
g right
f 2 4 3
",
        );

        let (mesh, groups) = load_with_groups(&path).unwrap();
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "left wing");
        assert_eq!(groups[0].faces.len(), 1);
        assert_eq!(groups[1].name, "right");
        assert_eq!(groups[1].faces.len(), 1);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn rejected_faces_are_skipped_not_fatal() {
        let path = write_obj(
            "nonmanifold.obj",
            "\
v 0 0 0
v 1 0 0
v 0 1 0
v 2 2 2
f 1 2 3
f 1 2 4
",
        );

        // The second face reuses directed edge (1, 2) and is dropped.
        let mesh = load(&path).unwrap();
        assert_eq!(mesh.num_faces(), 1);
        assert!(mesh.validate());

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let path = write_obj("bad.obj", "v 0 0 0\nv nope 0 0\n");

        let err = load(&path).unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
        assert!(err.to_string().contains(":2:"));

        let path2 = write_obj("bad-index.obj", "v 0 0 0\nf 1 2 3\n");
        let err = load(&path2).unwrap_err();
        assert!(err.to_string().contains("out of range"));

        fs::remove_file(path).unwrap();
        fs::remove_file(path2).unwrap();
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load("/definitely/not/here.obj").unwrap_err();
        assert_eq!(err.code(), "IO_ERROR");
    }

    #[test]
    fn round_trip_preserves_topology_and_creases() {
        let path = write_obj(
            "rt-in.obj",
            "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1 2 3 4
# crease 1 2 0.75
",
        );
        let mesh = load(&path).unwrap();

        let out = temp_path("rt-out.obj");
        save(&mesh, &out).unwrap();
        let reloaded = load(&out).unwrap();

        assert_eq!(reloaded.num_vertices(), mesh.num_vertices());
        assert_eq!(reloaded.num_faces(), mesh.num_faces());
        assert_eq!(reloaded.num_edges(), mesh.num_edges());
        assert_eq!(reloaded.uvs()[2], Vector2::new(1.0, 1.0));

        let e = reloaded.find_edge(VertexId::new(0), VertexId::new(1));
        assert_eq!(reloaded.edges()[e.index()].tag, EdgeTag::Semi);
        assert_eq!(reloaded.edges()[e.index()].sharpness, 0.75);

        fs::remove_file(path).unwrap();
        fs::remove_file(out).unwrap();
    }
}
