//! Append-only archive writer.
//!
//! Every record is appended at the end of the file. Writing a path that
//! already exists appends a new record with the next cycle number, which
//! readers prefer over older ones.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::compress::compress;
use crate::error::{HistError, Result};
use crate::file::{ARCHIVE_MAGIC, FORMAT_VERSION, parse};
use crate::histogram::Histogram;
use crate::key::{KEY_VERSION, Key};
use crate::objects::{self, CLASS_HIST1D, CLASS_TEXT};

/// Writer over one archive file.
pub struct ArchiveWriter {
    out: BufWriter<File>,
    path: PathBuf,
    cycles: HashMap<(String, String), u16>,
}

impl ArchiveWriter {
    /// Create (or truncate) an archive and write its header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut out = BufWriter::new(File::create(&path)?);
        out.write_all(ARCHIVE_MAGIC)?;
        out.write_all(&FORMAT_VERSION.to_be_bytes())?;
        Ok(Self { out, path, cycles: HashMap::new() })
    }

    /// Open an existing archive for appending, or create it if absent.
    pub fn open_update(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Self::create(path);
        }
        let data = fs::read(path)?;
        let directory = parse(&data)?;
        let mut cycles = HashMap::new();
        for key in directory.keys() {
            let slot = cycles.entry((key.directory.clone(), key.name.clone())).or_insert(0);
            *slot = (*slot).max(key.cycle);
        }
        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self { out: BufWriter::new(file), path: path.to_path_buf(), cycles })
    }

    /// Path of the archive being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a histogram under `directory/<h.name>`.
    pub fn write_histogram(&mut self, directory: &str, h: &Histogram) -> Result<()> {
        let payload = objects::write_hist1d(h);
        self.write_record(CLASS_HIST1D, directory, &h.name, &h.title, &payload)
    }

    /// Store a text record under `directory/name`.
    pub fn write_text(&mut self, directory: &str, name: &str, text: &str) -> Result<()> {
        let payload = objects::write_text(text);
        self.write_record(CLASS_TEXT, directory, name, name, &payload)
    }

    /// Flush buffered records to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Flush and close the file.
    pub fn close(mut self) -> Result<()> {
        self.out.flush()?;
        self.out.get_ref().sync_data()?;
        Ok(())
    }

    fn write_record(
        &mut self,
        class_name: &str,
        directory: &str,
        name: &str,
        title: &str,
        payload: &[u8],
    ) -> Result<()> {
        if name.is_empty() || name.contains('/') {
            return Err(HistError::Deserialization(format!("invalid object name '{}'", name)));
        }
        let obj_len = u32::try_from(payload.len())
            .map_err(|_| HistError::Compression(format!("object '{}' exceeds 4 GiB", name)))?;

        let compressed = compress(payload)?;
        let stored: &[u8] = if compressed.len() < payload.len() { &compressed } else { payload };

        let slot = self.cycles.entry((directory.to_string(), name.to_string())).or_insert(0);
        *slot = slot.checked_add(1).ok_or_else(|| {
            HistError::Deserialization(format!("cycle overflow for '{}/{}'", directory, name))
        })?;

        let key = Key {
            n_bytes: 0,
            version: KEY_VERSION,
            obj_len,
            datime: now_seconds(),
            key_len: 0,
            cycle: *slot,
            seek_key: 0,
            class_name: class_name.to_string(),
            directory: directory.to_string(),
            name: name.to_string(),
            title: title.to_string(),
        };
        self.out.write_all(&key.write(stored.len())?)?;
        self.out.write_all(stored)?;
        log::debug!("archive {}: wrote {}/{} (cycle {})", self.path.display(), directory, name, key.cycle);
        Ok(())
    }
}

fn now_seconds() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().min(u32::MAX as u64) as u32)
        .unwrap_or(0)
}
