//! Archive header parsing and the read-side file interface.

use std::fs;
use std::path::{Path, PathBuf};

use crate::compress::decompress;
use crate::directory::Directory;
use crate::error::{HistError, Result};
use crate::histogram::Histogram;
use crate::key::{Key, KeyInfo, split_path};
use crate::objects;

/// Magic bytes at the start of every archive.
pub const ARCHIVE_MAGIC: &[u8; 4] = b"dcar";
/// Current archive format version.
pub const FORMAT_VERSION: u32 = 1;
/// Size of the file header (magic + version).
pub const HEADER_LEN: usize = 8;

/// An archive opened for reading.
///
/// The whole file is loaded on open, so the handle is a snapshot: records
/// appended later by a writer are not visible until the file is reopened.
pub struct HistFile {
    data: Vec<u8>,
    directory: Directory,
    path: PathBuf,
}

impl HistFile {
    /// Open and index an archive from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = fs::read(&path)?;
        Self::from_bytes(data, path)
    }

    /// Parse an archive from a byte vector.
    pub fn from_bytes(data: Vec<u8>, path: PathBuf) -> Result<Self> {
        let directory = parse(&data)?;
        Ok(Self { data, directory, path })
    }

    /// Path the archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List the live (highest-cycle) key of every stored path.
    pub fn list_keys(&self) -> Result<Vec<KeyInfo>> {
        Ok(self.directory.latest_keys().into_iter().map(KeyInfo::from_key).collect())
    }

    /// Distinct directory names.
    pub fn directories(&self) -> Vec<String> {
        self.directory.directories()
    }

    /// Whether `path` resolves to a stored record.
    pub fn contains(&self, path: &str) -> bool {
        let (dir, name) = split_path(path);
        self.directory.find_key(dir, name).is_some()
    }

    /// Get a histogram by its full path (e.g. `"ch1_BDT/ttH"`).
    pub fn get_histogram(&self, path: &str) -> Result<Histogram> {
        let key = self.find(path)?;
        let payload = self.read_key_payload(key)?;
        objects::read_histogram(&payload, &key.class_name)
    }

    /// Get a text record by its full path.
    pub fn get_text(&self, path: &str) -> Result<String> {
        let key = self.find(path)?;
        let payload = self.read_key_payload(key)?;
        objects::read_text(&payload, &key.class_name)
    }

    fn find(&self, path: &str) -> Result<&Key> {
        let (dir, name) = split_path(path);
        if name.is_empty() {
            return Err(HistError::KeyNotFound(path.to_string()));
        }
        self.directory.find_key(dir, name).ok_or_else(|| HistError::KeyNotFound(path.to_string()))
    }

    pub(crate) fn read_key_payload(&self, key: &Key) -> Result<Vec<u8>> {
        read_key_payload_from(&self.data, key)
    }
}

/// Check the header and index every record.
pub(crate) fn parse(data: &[u8]) -> Result<Directory> {
    if data.len() < HEADER_LEN || &data[0..4] != ARCHIVE_MAGIC {
        return Err(HistError::BadMagic);
    }
    let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
    if version != FORMAT_VERSION {
        return Err(HistError::Deserialization(format!(
            "unsupported archive format version {}",
            version
        )));
    }
    Directory::scan(data, HEADER_LEN)
}

/// Read and decompress a record payload from raw file bytes.
pub(crate) fn read_key_payload_from(data: &[u8], key: &Key) -> Result<Vec<u8>> {
    let seek = key.seek_key as usize;
    if seek + key.n_bytes as usize > data.len() {
        return Err(HistError::BufferUnderflow {
            offset: seek,
            need: key.n_bytes as usize,
            have: data.len().saturating_sub(seek),
        });
    }

    let key_slice = &data[seek..seek + key.n_bytes as usize];
    let stored = &key_slice[key.key_len as usize..];

    if key.obj_len as usize != stored.len() {
        decompress(stored, key.obj_len as usize)
    } else {
        Ok(stored.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_magic() {
        let err = HistFile::from_bytes(b"root\0\0\0\x01".to_vec(), PathBuf::from("x")).err();
        assert!(matches!(err, Some(HistError::BadMagic)));
        assert!(matches!(
            HistFile::from_bytes(b"dca".to_vec(), PathBuf::from("x")).err(),
            Some(HistError::BadMagic)
        ));
    }

    #[test]
    fn empty_archive_has_no_keys() {
        let mut data = ARCHIVE_MAGIC.to_vec();
        data.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        let f = HistFile::from_bytes(data, PathBuf::from("empty.dcar")).unwrap();
        assert!(f.list_keys().unwrap().is_empty());
        assert!(matches!(f.get_histogram("a/b"), Err(HistError::KeyNotFound(_))));
    }
}
