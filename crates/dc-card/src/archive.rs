//! Output archive access for one run.
//!
//! Each write opens the archive, appends, and closes it again, so a later
//! stage always sees what an earlier one wrote. The first write to a path in
//! a run recreates the file.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use dc_core::{Error, Result};
use dc_hist::{ArchiveWriter, HistError, Histogram};

/// Name of the label-mapping text record in each category directory.
pub const LABEL_RECORD_NAME: &str = "MetaInfoLabelConvert";

fn archive_error(path: &Path, e: HistError) -> Error {
    Error::Archive(format!("{}: {}", path.display(), e))
}

/// Tracks which archives this run has already recreated.
#[derive(Debug, Default)]
pub struct ArchiveSink {
    created: BTreeSet<PathBuf>,
}

impl ArchiveSink {
    /// Sink that has not touched any file yet.
    pub fn new() -> Self {
        Self::default()
    }

    fn open(&mut self, path: &Path) -> Result<ArchiveWriter> {
        if self.created.insert(path.to_path_buf()) {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            ArchiveWriter::create(path).map_err(|e| archive_error(path, e))
        } else {
            ArchiveWriter::open_update(path).map_err(|e| archive_error(path, e))
        }
    }

    /// Append histograms under `directory`, keeping their names.
    pub fn write_histograms<'a>(
        &mut self,
        path: &Path,
        directory: &str,
        histograms: impl IntoIterator<Item = &'a Histogram>,
    ) -> Result<usize> {
        let mut w = self.open(path)?;
        let mut n = 0;
        for h in histograms {
            w.write_histogram(directory, h).map_err(|e| archive_error(path, e))?;
            n += 1;
        }
        w.close().map_err(|e| archive_error(path, e))?;
        Ok(n)
    }

    /// Append a text record under `directory/name`.
    pub fn write_text(&mut self, path: &Path, directory: &str, name: &str, text: &str) -> Result<()> {
        let mut w = self.open(path)?;
        w.write_text(directory, name, text).map_err(|e| archive_error(path, e))?;
        w.close().map_err(|e| archive_error(path, e))
    }

    /// Archives written so far, sorted.
    pub fn archives(&self) -> Vec<PathBuf> {
        self.created.iter().cloned().collect()
    }
}
