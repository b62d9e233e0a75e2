//! Error types for archive reading and writing.

use thiserror::Error;

/// Errors raised by histogram and archive operations.
#[derive(Error, Debug)]
pub enum HistError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File does not start with the archive magic.
    #[error("not a histogram archive (bad magic)")]
    BadMagic,

    /// No record with the requested path.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Read past the end of a buffer.
    #[error("buffer underflow at offset {offset}: need {need} bytes, have {have}")]
    BufferUnderflow {
        /// Read position.
        offset: usize,
        /// Bytes requested.
        need: usize,
        /// Bytes available.
        have: usize,
    },

    /// Malformed record or payload.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Record holds a class this crate cannot read.
    #[error("unsupported class: {0}")]
    UnsupportedClass(String),

    /// Compression failed.
    #[error("compression error: {0}")]
    Compression(String),

    /// Decompression failed.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Histograms with different binning were combined.
    #[error("binning mismatch: {0}")]
    BinningMismatch(String),
}

/// Result alias for archive operations.
pub type Result<T> = std::result::Result<T, HistError>;
