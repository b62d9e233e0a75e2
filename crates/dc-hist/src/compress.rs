//! Compression blocks for record payloads.
//!
//! Payloads are written as one or more 9-byte-header blocks:
//! ```text
//! bytes 0-1:  algorithm tag ("ZL")
//! byte  2:    method (8 = deflate)
//! bytes 3-5:  compressed size   (3-byte little-endian)
//! bytes 6-8:  uncompressed size (3-byte little-endian)
//! ```
//! The compressed payload immediately follows the 9-byte header.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::{HistError, Result};

const HEADER_LEN: usize = 9;
const MAX_BLOCK: usize = 0xFF_FFFF;
const METHOD_DEFLATE: u8 = 8;

/// Compress `src` into a sequence of `ZL` blocks.
pub fn compress(src: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(src.len() / 2 + HEADER_LEN);
    for chunk in src.chunks(MAX_BLOCK) {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(chunk).map_err(|e| HistError::Compression(format!("zlib: {}", e)))?;
        let compressed =
            encoder.finish().map_err(|e| HistError::Compression(format!("zlib: {}", e)))?;
        if compressed.len() > MAX_BLOCK {
            return Err(HistError::Compression(format!(
                "compressed block of {} bytes exceeds the 24-bit size field",
                compressed.len()
            )));
        }

        out.extend_from_slice(b"ZL");
        out.push(METHOD_DEFLATE);
        out.extend_from_slice(&write_le24(compressed.len()));
        out.extend_from_slice(&write_le24(chunk.len()));
        out.extend_from_slice(&compressed);
    }
    Ok(out)
}

/// Decompress block data into `expected_len` bytes.
pub fn decompress(src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len);
    let mut offset = 0;

    while out.len() < expected_len && offset + HEADER_LEN <= src.len() {
        let tag = &src[offset..offset + 2];
        let c_size = read_le24(&src[offset + 3..offset + 6]);
        let u_size = read_le24(&src[offset + 6..offset + 9]);
        offset += HEADER_LEN;

        let end = offset + c_size;
        if end > src.len() {
            return Err(HistError::Decompression(format!(
                "compressed block claims {} bytes but only {} remain",
                c_size,
                src.len() - offset
            )));
        }

        if tag != b"ZL" {
            return Err(HistError::Decompression(format!(
                "unsupported compression algorithm: {:?}",
                String::from_utf8_lossy(tag)
            )));
        }
        let decompressed = decompress_zlib(&src[offset..end], u_size)?;

        if decompressed.len() != u_size {
            return Err(HistError::Decompression(format!(
                "expected {} uncompressed bytes, got {}",
                u_size,
                decompressed.len()
            )));
        }

        out.extend_from_slice(&decompressed);
        offset = end;
    }

    if out.len() != expected_len {
        return Err(HistError::Decompression(format!(
            "total decompressed length {} != expected {}",
            out.len(),
            expected_len
        )));
    }

    Ok(out)
}

fn decompress_zlib(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(expected);
    decoder.read_to_end(&mut out).map_err(|e| HistError::Decompression(format!("zlib: {}", e)))?;
    Ok(out)
}

fn read_le24(b: &[u8]) -> usize {
    b[0] as usize | ((b[1] as usize) << 8) | ((b[2] as usize) << 16)
}

fn write_le24(v: usize) -> [u8; 3] {
    [(v & 0xFF) as u8, ((v >> 8) & 0xFF) as u8, ((v >> 16) & 0xFF) as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn le24_encoding() {
        assert_eq!(read_le24(&[0x10, 0x00, 0x00]), 16);
        assert_eq!(read_le24(&[0xff, 0xff, 0xff]), 0xFF_FFFF);
        assert_eq!(read_le24(&write_le24(0x01_0203)), 0x01_0203);
    }

    #[test]
    fn block_header_layout() {
        let original = vec![7u8; 1000];
        let block = compress(&original).unwrap();
        assert_eq!(&block[0..2], b"ZL");
        assert_eq!(block[2], METHOD_DEFLATE);
        assert_eq!(read_le24(&block[3..6]), block.len() - HEADER_LEN);
        assert_eq!(read_le24(&block[6..9]), 1000);
        assert_eq!(decompress(&block, original.len()).unwrap(), original);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut block = compress(b"payload payload payload").unwrap();
        block[0] = b'X';
        block[1] = b'Z';
        assert!(matches!(decompress(&block, 23), Err(HistError::Decompression(_))));
    }

    #[test]
    fn truncated_block_is_rejected() {
        let block = compress(&[1u8; 512]).unwrap();
        let err = decompress(&block[..block.len() - 4], 512).unwrap_err();
        assert!(err.to_string().contains("compressed block claims"), "got: {}", err);
    }
}
