//! Record scanning and key lookup.

use crate::error::{HistError, Result};
use crate::key::Key;
use crate::rbuffer::RBuffer;

/// All record headers of an archive, in file order.
#[derive(Debug, Clone)]
pub struct Directory {
    keys: Vec<Key>,
}

impl Directory {
    /// Walk the records that start at `start` and run to the end of `file_data`.
    pub fn scan(file_data: &[u8], start: usize) -> Result<Self> {
        let mut r = RBuffer::new(file_data);
        r.set_pos(start);

        let mut keys = Vec::new();
        while r.remaining() > 0 {
            let key = Key::read(&mut r)?;
            if key.n_bytes == 0 {
                return Err(HistError::Deserialization(format!(
                    "zero-length record at offset {}",
                    key.seek_key
                )));
            }
            let next = key.seek_key as usize + key.n_bytes as usize;
            if next > file_data.len() {
                return Err(HistError::BufferUnderflow {
                    offset: key.seek_key as usize,
                    need: key.n_bytes as usize,
                    have: file_data.len() - key.seek_key as usize,
                });
            }
            r.set_pos(next);
            keys.push(key);
        }

        Ok(Directory { keys })
    }

    /// Access every record, including superseded cycles.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Find a key by directory and name (returns the highest cycle).
    pub fn find_key(&self, directory: &str, name: &str) -> Option<&Key> {
        self.keys
            .iter()
            .filter(|k| k.directory == directory && k.name == name)
            .max_by_key(|k| k.cycle)
    }

    /// Highest cycle currently stored for a path, if any.
    pub fn max_cycle(&self, directory: &str, name: &str) -> Option<u16> {
        self.find_key(directory, name).map(|k| k.cycle)
    }

    /// The live key of every path, in order of first appearance.
    pub fn latest_keys(&self) -> Vec<&Key> {
        let mut out: Vec<&Key> = Vec::new();
        for key in &self.keys {
            match out.iter_mut().find(|k| k.directory == key.directory && k.name == key.name) {
                Some(slot) if key.cycle > slot.cycle => *slot = key,
                Some(_) => {}
                None => out.push(key),
            }
        }
        out
    }

    /// Distinct non-empty directory names, in order of first appearance.
    pub fn directories(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for key in &self.keys {
            if !key.directory.is_empty() && !out.contains(&key.directory) {
                out.push(key.directory.clone());
            }
        }
        out
    }
}
