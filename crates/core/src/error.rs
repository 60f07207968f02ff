//! Error types for lyrics slide generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building slides or search URLs.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file or buffer.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// The presentation lacks a layout, placeholder, or part we need.
    #[error("Invalid presentation document: {0}")]
    InvalidDocument(String),

    /// A required user input was empty.
    #[error("{0}")]
    MissingInput(&'static str),

    /// Unknown language label.
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),
}
