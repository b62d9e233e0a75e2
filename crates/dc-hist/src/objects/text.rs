//! `TextRecord` payload: a u16 version followed by one string.

use crate::error::{HistError, Result};
use crate::rbuffer::RBuffer;
use crate::wbuffer::WBuffer;

const TEXT_VERSION: u16 = 1;

pub(crate) fn read_text(data: &[u8]) -> Result<String> {
    let mut r = RBuffer::new(data);
    let version = r.read_u16()?;
    if version != TEXT_VERSION {
        return Err(HistError::Deserialization(format!(
            "unsupported TextRecord version: {}",
            version
        )));
    }
    r.read_string()
}

pub(crate) fn write_text(text: &str) -> Vec<u8> {
    let mut w = WBuffer::new();
    w.write_u16(TEXT_VERSION);
    w.write_string(text);
    w.into_inner()
}
