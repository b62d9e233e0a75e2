//! Error types for the datacard maker

use thiserror::Error;

/// Datacard maker error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unusable analysis configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required input (file list, nominal source container) is absent
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Histogram archive read/write failure
    #[error("Archive error: {0}")]
    Archive(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Datacard section written out of order
    #[error("Sequence error: {0}")]
    Sequence(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
