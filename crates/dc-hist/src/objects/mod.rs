//! Object (de)serialization dispatch.

mod hist1d;
mod text;

use crate::error::{HistError, Result};
use crate::histogram::Histogram;

/// Class name of a stored 1D histogram.
pub const CLASS_HIST1D: &str = "Hist1D";
/// Class name of a stored text record.
pub const CLASS_TEXT: &str = "TextRecord";

/// Read a histogram from a decompressed object payload, given its class name.
pub fn read_histogram(payload: &[u8], class_name: &str) -> Result<Histogram> {
    match class_name {
        CLASS_HIST1D => hist1d::read_hist1d(payload),
        _ => Err(HistError::UnsupportedClass(class_name.to_string())),
    }
}

/// Read a text record from a decompressed object payload, given its class name.
pub fn read_text(payload: &[u8], class_name: &str) -> Result<String> {
    match class_name {
        CLASS_TEXT => text::read_text(payload),
        _ => Err(HistError::UnsupportedClass(class_name.to_string())),
    }
}

pub(crate) use hist1d::write_hist1d;
pub(crate) use text::write_text;
