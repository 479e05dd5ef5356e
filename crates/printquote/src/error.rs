//! Error types for the quoting pipeline.

use printquote_mesh::MeshError;
use thiserror::Error;

/// Errors that can stop a quote.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// Uploaded file could not be turned into a mesh.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Material id not in the catalog.
    #[error("unknown material: {0}")]
    UnknownMaterial(String),

    /// Configuration file did not parse.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuoteError {
    /// Message suitable for showing to the customer.
    pub fn user_message(&self) -> &'static str {
        match self {
            QuoteError::Mesh(err) => err.user_message(),
            QuoteError::UnknownMaterial(_) => "Please choose one of the listed materials.",
            QuoteError::Config(_) | QuoteError::Io(_) => {
                "Quotes are unavailable right now. Please try again later."
            }
        }
    }
}

/// Result type for quoting operations.
pub type Result<T> = std::result::Result<T, QuoteError>;
