//! Big-endian writer, the mirror of [`crate::rbuffer::RBuffer`].

/// Growable output buffer.
#[derive(Debug, Default)]
pub struct WBuffer {
    data: Vec<u8>,
}

impl WBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, b: &[u8]) {
        self.data.extend_from_slice(b);
    }

    /// Append a byte.
    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    /// Append a big-endian u16.
    pub fn write_u16(&mut self, v: u16) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    /// Append a big-endian u32.
    pub fn write_u32(&mut self, v: u32) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    /// Append a big-endian f64.
    pub fn write_f64(&mut self, v: f64) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    /// Append f64 values without a length prefix.
    pub fn write_array_f64(&mut self, values: &[f64]) {
        for &v in values {
            self.write_f64(v);
        }
    }

    /// Append a length-prefixed string (see [`crate::rbuffer::RBuffer::read_string`]).
    pub fn write_string(&mut self, s: &str) {
        let bytes = s.as_bytes();
        if bytes.len() < 255 {
            self.write_u8(bytes.len() as u8);
        } else {
            self.write_u8(255);
            self.write_u32(bytes.len() as u32);
        }
        self.write_bytes(bytes);
    }

    /// Overwrite a u16 at an absolute offset.
    pub fn patch_u16(&mut self, offset: usize, v: u16) {
        self.data[offset..offset + 2].copy_from_slice(&v.to_be_bytes());
    }

    /// Overwrite a u32 at an absolute offset.
    pub fn patch_u32(&mut self, offset: usize, v: u32) {
        self.data[offset..offset + 4].copy_from_slice(&v.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbuffer::RBuffer;

    #[test]
    fn long_strings_use_escape_prefix() {
        let long = "x".repeat(300);
        let mut w = WBuffer::new();
        w.write_string("abc");
        w.write_string(&long);
        let bytes = w.into_inner();
        assert_eq!(bytes[0], 3);
        assert_eq!(bytes[4], 255);

        let mut r = RBuffer::new(&bytes);
        assert_eq!(r.read_string().unwrap(), "abc");
        assert_eq!(r.read_string().unwrap(), long);
    }

    #[test]
    fn patch_rewrites_in_place() {
        let mut w = WBuffer::new();
        w.write_u32(0);
        w.write_u16(0);
        w.patch_u32(0, 0xDEAD_BEEF);
        w.patch_u16(4, 7);
        assert_eq!(w.into_inner(), vec![0xDE, 0xAD, 0xBE, 0xEF, 0, 7]);
    }
}
