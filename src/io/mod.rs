//! Mesh file I/O.
//!
//! The import contract of this crate is Wavefront OBJ (see [`obj`]),
//! extended with `# crease` comments for edge sharpness. [`load`] and
//! [`save`] dispatch on the file extension so additional formats can slot
//! in beside it.
//!
//! ```no_run
//! use cage::io;
//!
//! let mesh = io::load("cage.obj").unwrap();
//! io::save(&mesh, "out.obj").unwrap();
//! ```

pub mod obj;

use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::ControlMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ with crease comments.
    Obj,
}

impl Format {
    /// Detect a format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            _ => None,
        }
    }

    /// Detect a format from a file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect<P: AsRef<Path>>(path: P) -> Result<Format> {
    Format::from_path(&path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh with automatic format detection.
pub fn load<P: AsRef<Path>>(path: P) -> Result<ControlMesh> {
    match detect(&path)? {
        Format::Obj => obj::load(path),
    }
}

/// Save a mesh with automatic format detection.
pub fn save<P: AsRef<Path>>(mesh: &ControlMesh, path: P) -> Result<()> {
    match detect(&path)? {
        Format::Obj => obj::save(mesh, path),
    }
}
