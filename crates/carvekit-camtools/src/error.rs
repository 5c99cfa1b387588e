//! Error types for the CAM tools crate.

use std::io;
use thiserror::Error;

/// Errors that can occur during CAM tool operations.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// The image file could not be loaded.
    #[error("Failed to load image: {0}")]
    LoadError(String),

    /// Image processing failed.
    #[error("Image processing error: {0}")]
    ImageError(String),

    /// G-code generation failed.
    #[error("G-code generation failed: {0}")]
    GenerationFailed(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// A configuration validation error occurred.
    #[error("Config error: {0}")]
    Config(#[from] carvekit_settings::ConfigError),
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;
