//! Error types for cage.
//!
//! Every failure carries a stable machine-readable code string (see
//! [`MeshError::code`]) in addition to its human-readable message; the same
//! codes appear in the records of the [diagnostics sink](crate::diagnostics).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh construction, mutation, or import.
#[derive(Error, Debug)]
pub enum MeshError {
    /// A face was given fewer than three vertices.
    #[error("face must have at least 3 vertices, got {count}")]
    FaceTooFewVertices {
        /// Number of vertices supplied.
        count: usize,
    },

    /// A vertex index is out of range.
    #[error("vertex index {vertex} out of range (mesh has {count} vertices)")]
    InvalidVertexIndex {
        /// The offending vertex index.
        vertex: u32,
        /// Current vertex count.
        count: usize,
    },

    /// An edge index is out of range.
    #[error("edge index {edge} out of range (mesh has {count} edges)")]
    InvalidEdgeIndex {
        /// The offending edge index.
        edge: u32,
        /// Current edge count.
        count: usize,
    },

    /// The same vertex appears twice in one face.
    #[error("face contains vertex {vertex} more than once")]
    DuplicateVertexInFace {
        /// The repeated vertex index.
        vertex: u32,
    },

    /// Adding the face would give an edge more than two incident faces.
    #[error("edge ({from}, {to}) already saturated (non-manifold)")]
    NonManifoldEdge {
        /// Source vertex of the rejected directed edge.
        from: u32,
        /// Destination vertex of the rejected directed edge.
        to: u32,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record of an imported file could not be parsed.
    #[error("{path}:{line}: {message}")]
    Parse {
        /// The file being imported.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },
}

impl MeshError {
    /// The stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            MeshError::FaceTooFewVertices { .. } => "FACE_TOO_FEW_VERTICES",
            MeshError::InvalidVertexIndex { .. } => "INVALID_VERTEX_INDEX",
            MeshError::InvalidEdgeIndex { .. } => "INVALID_EDGE_INDEX",
            MeshError::DuplicateVertexInFace { .. } => "DUPLICATE_VERTEX_IN_FACE",
            MeshError::NonManifoldEdge { .. } => "NON_MANIFOLD_EDGE",
            MeshError::Io(_) => "IO_ERROR",
            MeshError::Parse { .. } => "PARSE_ERROR",
            MeshError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
        }
    }
}
