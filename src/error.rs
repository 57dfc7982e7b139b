//! Errors from the I/O surfaces of the crate.
//!
//! Evaluation itself never fails; only loading and saving textures and
//! parameter files can.

use std::fmt;

#[derive(Debug)]
pub enum DetileError {
    Io(std::io::Error),
    Image(image::ImageError),
    Params(serde_json::Error),
    /// The decoded image has no pixels
    EmptyTexture(String),
}

impl fmt::Display for DetileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetileError::Io(e) => write!(f, "I/O error: {}", e),
            DetileError::Image(e) => write!(f, "Image error: {}", e),
            DetileError::Params(e) => write!(f, "Invalid parameters: {}", e),
            DetileError::EmptyTexture(path) => write!(f, "Texture has no pixels: {}", path),
        }
    }
}

impl std::error::Error for DetileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DetileError::Io(e) => Some(e),
            DetileError::Image(e) => Some(e),
            DetileError::Params(e) => Some(e),
            DetileError::EmptyTexture(_) => None,
        }
    }
}

impl From<std::io::Error> for DetileError {
    fn from(e: std::io::Error) -> Self {
        DetileError::Io(e)
    }
}

impl From<image::ImageError> for DetileError {
    fn from(e: image::ImageError) -> Self {
        DetileError::Image(e)
    }
}

impl From<serde_json::Error> for DetileError {
    fn from(e: serde_json::Error) -> Self {
        DetileError::Params(e)
    }
}
