//! Binary reader for the archive's big-endian serialization.

use crate::error::{HistError, Result};

/// A cursor-based reader over a byte slice.
pub struct RBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RBuffer<'a> {
    /// Create a new reader over the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Remaining bytes from current position.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Set read position absolutely.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Skip `n` bytes forward.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Read a sub-slice of `n` bytes, advancing the cursor.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a big-endian u16.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_fixed().map(u16::from_be_bytes)
    }

    /// Read a big-endian u32.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_fixed().map(u32::from_be_bytes)
    }

    /// Read a big-endian f64.
    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_fixed().map(f64::from_be_bytes)
    }

    /// Read a length-prefixed string.
    ///
    /// Format: length byte (if < 255), or 255 + u32 length, then UTF-8 bytes.
    pub fn read_string(&mut self) -> Result<String> {
        let first = self.read_u8()?;
        let len = if first == 255 { self.read_u32()? as usize } else { first as usize };
        if len == 0 {
            return Ok(String::new());
        }
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| HistError::Deserialization(format!("invalid UTF-8 string: {}", e)))
    }

    /// Read `n` big-endian f64 values (bin arrays).
    pub fn read_array_f64(&mut self, n: usize) -> Result<Vec<f64>> {
        let bytes = self.read_bytes(n.saturating_mul(8))?;
        Ok(bytes
            .chunks_exact(8)
            .map(|c| {
                let mut b = [0u8; 8];
                b.copy_from_slice(c);
                f64::from_be_bytes(b)
            })
            .collect())
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(HistError::BufferUnderflow {
                offset: self.pos,
                need: n,
                have: self.data.len().saturating_sub(self.pos),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_primitives() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x40, 0x09, 0x21, 0xfb, 0x54, 0x44, 0x2d, 0x18];
        let mut r = RBuffer::new(&data);
        assert_eq!(r.read_u32().unwrap(), 0x0102_0304);
        assert!((r.read_f64().unwrap() - std::f64::consts::PI).abs() < 1e-15);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn read_string_short() {
        let data = [3, b'a', b'b', b'c'];
        let mut r = RBuffer::new(&data);
        assert_eq!(r.read_string().unwrap(), "abc");
    }

    #[test]
    fn underflow_reports_position() {
        let data = [0u8; 3];
        let mut r = RBuffer::new(&data);
        r.skip(2).unwrap();
        match r.read_u16() {
            Err(HistError::BufferUnderflow { offset, need, have }) => {
                assert_eq!((offset, need, have), (2, 2, 1));
            }
            other => panic!("expected underflow, got {:?}", other),
        }
    }
}
