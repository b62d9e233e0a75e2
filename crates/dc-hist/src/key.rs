//! Record header used to locate objects inside an archive.

use crate::error::{HistError, Result};
use crate::rbuffer::RBuffer;
use crate::wbuffer::WBuffer;

/// Current record-header version.
pub const KEY_VERSION: u16 = 1;

/// Byte offset of `key_len` inside a serialized header.
const KEY_LEN_OFFSET: usize = 14;

/// A parsed record header.
#[derive(Debug, Clone)]
pub struct Key {
    /// Total number of bytes in the stored payload plus this header.
    pub n_bytes: u32,
    /// Version of the header layout.
    pub version: u16,
    /// Uncompressed payload length.
    pub obj_len: u32,
    /// Creation time, seconds since the Unix epoch.
    pub datime: u32,
    /// Length of the header itself.
    pub key_len: u16,
    /// Cycle number; a rewrite of the same path increments it.
    pub cycle: u16,
    /// Absolute position of this header in the file.
    pub seek_key: u64,
    /// Class name of the stored object.
    pub class_name: String,
    /// Directory the object lives in (`""` for top level).
    pub directory: String,
    /// Object name.
    pub name: String,
    /// Object title.
    pub title: String,
}

/// Public info about a key (for `list_keys()`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    /// Directory the object lives in.
    pub directory: String,
    /// Object name.
    pub name: String,
    /// Object class name (e.g. `"Hist1D"`, `"TextRecord"`).
    pub class_name: String,
    /// Cycle number.
    pub cycle: u16,
}

impl KeyInfo {
    /// Create from an internal Key.
    pub fn from_key(key: &Key) -> Self {
        Self {
            directory: key.directory.clone(),
            name: key.name.clone(),
            class_name: key.class_name.clone(),
            cycle: key.cycle,
        }
    }

    /// `directory/name`, or just `name` at top level.
    pub fn path(&self) -> String {
        join_path(&self.directory, &self.name)
    }
}

/// Join a directory and an object name into an archive path.
pub fn join_path(directory: &str, name: &str) -> String {
    if directory.is_empty() { name.to_string() } else { format!("{}/{}", directory, name) }
}

/// Split an archive path at its last `/` into `(directory, name)`.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((dir, name)) => (dir.trim_matches('/'), name),
        None => ("", path),
    }
}

impl Key {
    /// Read a record header from the buffer at the current position.
    pub fn read(r: &mut RBuffer) -> Result<Self> {
        let seek_key = r.pos() as u64;
        let n_bytes = r.read_u32()?;
        let version = r.read_u16()?;
        let obj_len = r.read_u32()?;
        let datime = r.read_u32()?;
        let key_len = r.read_u16()?;
        let cycle = r.read_u16()?;

        let class_name = r.read_string()?;
        let directory = r.read_string()?;
        let name = r.read_string()?;
        let title = r.read_string()?;

        if (key_len as u32) > n_bytes || r.pos() as u64 - seek_key != key_len as u64 {
            return Err(HistError::Deserialization(format!(
                "inconsistent record header at {} (n_bytes={}, key_len={})",
                seek_key, n_bytes, key_len
            )));
        }

        Ok(Key {
            n_bytes,
            version,
            obj_len,
            datime,
            key_len,
            cycle,
            seek_key,
            class_name,
            directory,
            name,
            title,
        })
    }

    /// Serialize the header; `n_bytes` and `key_len` are computed from the
    /// strings and `stored_len`, the number of payload bytes that follow.
    pub fn write(&self, stored_len: usize) -> Result<Vec<u8>> {
        let mut w = WBuffer::new();
        w.write_u32(0);
        w.write_u16(self.version);
        w.write_u32(self.obj_len);
        w.write_u32(self.datime);
        w.write_u16(0);
        w.write_u16(self.cycle);
        w.write_string(&self.class_name);
        w.write_string(&self.directory);
        w.write_string(&self.name);
        w.write_string(&self.title);

        let key_len = u16::try_from(w.len()).map_err(|_| {
            HistError::Deserialization(format!("record header for '{}' too long", self.name))
        })?;
        let n_bytes = u32::try_from(w.len() + stored_len).map_err(|_| {
            HistError::Deserialization(format!("record '{}' exceeds 4 GiB", self.name))
        })?;
        w.patch_u32(0, n_bytes);
        w.patch_u16(KEY_LEN_OFFSET, key_len);
        Ok(w.into_inner())
    }

    /// Archive path of the stored object.
    pub fn path(&self) -> String {
        join_path(&self.directory, &self.name)
    }
}
