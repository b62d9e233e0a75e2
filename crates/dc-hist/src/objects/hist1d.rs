//! `Hist1D` payload layout.
//!
//! ```text
//! u16        version
//! string     name
//! string     title
//! u32        n_bins
//! f64 x n+1  bin edges
//! f64 x n    bin contents
//! u8         has_sumw2
//! f64 x n    sumw2 (only if has_sumw2)
//! f64        entries
//! ```

use crate::error::{HistError, Result};
use crate::histogram::Histogram;
use crate::rbuffer::RBuffer;
use crate::wbuffer::WBuffer;

const HIST1D_VERSION: u16 = 1;

pub(crate) fn read_hist1d(data: &[u8]) -> Result<Histogram> {
    let mut r = RBuffer::new(data);

    let version = r.read_u16()?;
    if version == 0 || version > HIST1D_VERSION {
        return Err(HistError::Deserialization(format!("unsupported Hist1D version: {}", version)));
    }

    let name = r.read_string()?;
    let title = r.read_string()?;
    let n_bins = r.read_u32()? as usize;
    if n_bins == 0 {
        return Err(HistError::Deserialization(format!("'{}' has no bins", name)));
    }
    let bin_edges = r.read_array_f64(n_bins + 1)?;
    let bin_content = r.read_array_f64(n_bins)?;
    let sumw2 = match r.read_u8()? {
        0 => None,
        _ => Some(r.read_array_f64(n_bins)?),
    };
    let entries = r.read_f64()?;

    let mut h = Histogram::new(name, bin_edges, bin_content, sumw2)?;
    h.title = title;
    h.entries = entries;
    Ok(h)
}

pub(crate) fn write_hist1d(h: &Histogram) -> Vec<u8> {
    let mut w = WBuffer::new();
    w.write_u16(HIST1D_VERSION);
    w.write_string(&h.name);
    w.write_string(&h.title);
    w.write_u32(h.n_bins as u32);
    w.write_array_f64(&h.bin_edges);
    w.write_array_f64(&h.bin_content);
    match &h.sumw2 {
        Some(w2) => {
            w.write_u8(1);
            w.write_array_f64(w2);
        }
        None => w.write_u8(0),
    }
    w.write_f64(h.entries);
    w.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_preserves_title_and_entries() {
        let mut h = Histogram::new("ttbb", vec![0.0, 0.5, 1.0], vec![3.0, 4.0], Some(vec![1.0, 2.0]))
            .unwrap();
        h.title = "tt+bb".into();
        h.entries = 1234.0;

        let back = read_hist1d(&write_hist1d(&h)).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let h = Histogram::uniform("h", 3, 0.0, 3.0);
        let bytes = write_hist1d(&h);
        assert!(read_hist1d(&bytes[..bytes.len() - 3]).is_err());
    }
}
