//! Error types for mesh decoding.

use thiserror::Error;

use crate::MeshFormat;

/// Errors that can occur while decoding a mesh file.
#[derive(Error, Debug)]
pub enum MeshError {
    /// File extension is not one of the supported formats.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Bytes do not match the structure of the selected format.
    #[error("corrupt {format} file: {message}")]
    CorruptFile {
        /// Format the bytes were parsed as.
        format: MeshFormat,
        /// What went wrong.
        message: String,
    },

    /// File parsed but contained no triangles.
    #[error("mesh is empty")]
    EmptyMesh,
}

impl MeshError {
    /// Create a corrupt-file error.
    pub fn corrupt(format: MeshFormat, message: impl Into<String>) -> Self {
        Self::CorruptFile {
            format,
            message: message.into(),
        }
    }

    /// Message suitable for showing to the person who uploaded the file.
    pub fn user_message(&self) -> &'static str {
        match self {
            MeshError::UnsupportedFormat(_) => "Please upload an STL or 3MF file.",
            MeshError::CorruptFile { .. } => {
                "The file could not be read. Please upload a valid STL or 3MF file."
            }
            MeshError::EmptyMesh => "The file contains no geometry. Please upload a different model.",
        }
    }
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
