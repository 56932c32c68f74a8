//! Error types for wall rendering and the backend client

use thiserror::Error;

/// Result type alias for gallerywall operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching or rendering walls
#[derive(Error, Debug)]
pub enum Error {
    /// The wall descriptor cannot be rendered (e.g. non-positive dimensions)
    #[error("Invalid wall: {0}")]
    InvalidWall(String),

    /// Failed to load a resource (image, page, local file)
    #[error("Failed to load: {0}")]
    LoadError(String),

    /// Failed to decode a JSON payload
    #[error("Failed to decode payload: {0}")]
    DecodeError(String),

    /// Failed to decode or encode image data
    #[error("Image error: {0}")]
    ImageError(String),

    /// Failed to render content
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Network error (transport failure or non-success status)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Failed to inspect an HTML page
    #[error("Page error: {0}")]
    PageError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::DecodeError(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageError(err.to_string())
    }
}
