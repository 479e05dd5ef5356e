#![warn(missing_docs)]

//! Mesh decoding and geometric analysis for print quoting.
//!
//! Decodes STL (binary and ASCII) and 3MF uploads into a [`TriangleMesh`]
//! and derives the [`ModelStats`] the cost engine needs.
//!
//! # Example
//!
//! ```ignore
//! use printquote_mesh::{analyze, decode};
//!
//! let bytes = std::fs::read("bracket.stl")?;
//! let mesh = decode(&bytes, "bracket.stl")?;
//! let stats = analyze(&mesh);
//! println!("Volume: {:.2} cm³", stats.volume);
//! ```

pub mod analyze;
pub mod error;
pub mod mesh;
pub mod stl;
pub mod threemf;

pub use analyze::{analyze, Dimensions, ModelStats};
pub use error::{MeshError, Result};
pub use mesh::{TriangleMesh, Vec3};
pub use stl::parse_stl;
pub use threemf::parse_3mf;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshFormat {
    /// Stereolithography triangle soup, binary or ASCII.
    Stl,
    /// 3D Manufacturing Format (zipped XML).
    ThreeMf,
}

impl MeshFormat {
    /// Select a format from a filename's extension, ignoring case.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        match ext.to_ascii_lowercase().as_str() {
            "stl" => Ok(MeshFormat::Stl),
            "3mf" => Ok(MeshFormat::ThreeMf),
            _ => Err(MeshError::UnsupportedFormat(if ext.is_empty() {
                filename.to_string()
            } else {
                format!(".{ext}")
            })),
        }
    }

    /// Short display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MeshFormat::Stl => "STL",
            MeshFormat::ThreeMf => "3MF",
        }
    }
}

impl fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode an uploaded file into a triangle mesh.
///
/// The format is chosen from `filename` alone; the bytes are never sniffed
/// to pick a different parser. A file that decodes to zero triangles is
/// reported as [`MeshError::EmptyMesh`].
pub fn decode(bytes: &[u8], filename: &str) -> Result<TriangleMesh> {
    let format = MeshFormat::from_filename(filename)?;
    let mesh = match format {
        MeshFormat::Stl => parse_stl(bytes)?,
        MeshFormat::ThreeMf => parse_3mf(bytes)?,
    };
    if mesh.is_empty() {
        return Err(MeshError::EmptyMesh);
    }
    tracing::debug!(
        %format,
        triangles = mesh.num_triangles(),
        vertices = mesh.num_vertices(),
        "decoded mesh"
    );
    Ok(mesh)
}

/// Decode and analyze in one step.
pub fn decode_and_analyze(bytes: &[u8], filename: &str) -> Result<ModelStats> {
    decode(bytes, filename).map(|mesh| analyze(&mesh))
}
