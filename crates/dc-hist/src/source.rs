//! Histogram source abstraction: "open a container, fetch a named histogram".

use std::collections::HashMap;

use crate::error::{HistError, Result};
use crate::file::HistFile;
use crate::histogram::Histogram;
use crate::objects::CLASS_HIST1D;

/// A container of named histograms.
pub trait HistogramSource {
    /// Names of the histograms available at top level.
    fn histogram_names(&self) -> Result<Vec<String>>;

    /// Fetch a histogram by name.
    fn histogram(&self, name: &str) -> Result<Histogram>;
}

impl HistogramSource for HistFile {
    fn histogram_names(&self) -> Result<Vec<String>> {
        Ok(self
            .list_keys()?
            .into_iter()
            .filter(|k| k.directory.is_empty() && k.class_name == CLASS_HIST1D)
            .map(|k| k.name)
            .collect())
    }

    fn histogram(&self, name: &str) -> Result<Histogram> {
        self.get_histogram(name)
    }
}

impl HistogramSource for HashMap<String, Histogram> {
    fn histogram_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn histogram(&self, name: &str) -> Result<Histogram> {
        self.get(name).cloned().ok_or_else(|| HistError::KeyNotFound(name.to_string()))
    }
}
