//! Public histogram type read from and written to archives.

use crate::error::{HistError, Result};

/// Relative tolerance used when comparing bin edges.
const EDGE_TOLERANCE: f64 = 1e-9;

/// A 1D histogram with optional per-bin sum of squared weights.
///
/// Bin accessors are 1-indexed; under/overflow are not stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Histogram name.
    pub name: String,
    /// Histogram title.
    pub title: String,
    /// Number of bins (excluding under/overflow).
    pub n_bins: usize,
    /// Lower edge of first bin.
    pub x_min: f64,
    /// Upper edge of last bin.
    pub x_max: f64,
    /// Bin edges (length = n_bins + 1).
    pub bin_edges: Vec<f64>,
    /// Bin contents (length = n_bins).
    pub bin_content: Vec<f64>,
    /// Sum of weights squared per bin, if stored.
    pub sumw2: Option<Vec<f64>>,
    /// Total number of entries.
    pub entries: f64,
}

impl Histogram {
    /// Build from explicit edges and contents.
    pub fn new(
        name: impl Into<String>,
        bin_edges: Vec<f64>,
        bin_content: Vec<f64>,
        sumw2: Option<Vec<f64>>,
    ) -> Result<Self> {
        let name = name.into();
        if bin_edges.len() < 2 || bin_edges.len() != bin_content.len() + 1 {
            return Err(HistError::BinningMismatch(format!(
                "'{}': {} edges for {} bins",
                name,
                bin_edges.len(),
                bin_content.len()
            )));
        }
        if let Some(w2) = &sumw2
            && w2.len() != bin_content.len()
        {
            return Err(HistError::BinningMismatch(format!(
                "'{}': sumw2 has {} entries for {} bins",
                name,
                w2.len(),
                bin_content.len()
            )));
        }
        let n_bins = bin_content.len();
        let x_min = bin_edges[0];
        let x_max = bin_edges[n_bins];
        let entries = bin_content.iter().sum();
        Ok(Self { title: name.clone(), name, n_bins, x_min, x_max, bin_edges, bin_content, sumw2, entries })
    }

    /// Empty histogram with `n_bins` equal-width bins on `[x_min, x_max)`.
    pub fn uniform(name: impl Into<String>, n_bins: usize, x_min: f64, x_max: f64) -> Self {
        let width = (x_max - x_min) / n_bins.max(1) as f64;
        let bin_edges = (0..=n_bins).map(|i| x_min + width * i as f64).collect();
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            n_bins,
            x_min,
            x_max,
            bin_edges,
            bin_content: vec![0.0; n_bins],
            sumw2: Some(vec![0.0; n_bins]),
            entries: 0.0,
        }
    }

    /// Content of bin `i` (1-indexed); 0 outside `1..=n_bins`.
    pub fn bin_content(&self, i: usize) -> f64 {
        self.index(i).map_or(0.0, |j| self.bin_content[j])
    }

    /// Statistical error of bin `i`: `sqrt(sumw2)`, or `sqrt(|content|)` without sumw2.
    pub fn bin_error(&self, i: usize) -> f64 {
        let Some(j) = self.index(i) else { return 0.0 };
        match &self.sumw2 {
            Some(w2) => w2[j].max(0.0).sqrt(),
            None => self.bin_content[j].abs().sqrt(),
        }
    }

    /// Set the content of bin `i` (1-indexed); out-of-range is ignored.
    pub fn set_bin_content(&mut self, i: usize, v: f64) {
        if let Some(j) = self.index(i) {
            self.bin_content[j] = v;
        }
    }

    /// Set the error of bin `i` (1-indexed), creating sumw2 if absent.
    pub fn set_bin_error(&mut self, i: usize, err: f64) {
        let Some(j) = self.index(i) else { return };
        let contents = &self.bin_content;
        let w2 = self.sumw2.get_or_insert_with(|| contents.iter().map(|c| c.abs()).collect());
        w2[j] = err * err;
    }

    /// Sum of bin contents, flow bins excluded.
    pub fn integral(&self) -> f64 {
        self.bin_content.iter().sum()
    }

    /// Add `other` bin-by-bin; binning must match.
    pub fn add(&mut self, other: &Histogram) -> Result<()> {
        self.check_binning(other)?;
        if self.sumw2.is_some() || other.sumw2.is_some() {
            let mine = self.sumw2_or_poisson();
            let theirs = other.sumw2_or_poisson();
            self.sumw2 = Some(mine.iter().zip(&theirs).map(|(a, b)| a + b).collect());
        }
        for (c, o) in self.bin_content.iter_mut().zip(&other.bin_content) {
            *c += o;
        }
        self.entries += other.entries;
        Ok(())
    }

    /// Copy with a new name and title.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        Self { title: name.clone(), name, ..self.clone() }
    }

    /// Copy with every bin content raised to at least `min`; errors are kept.
    pub fn floored(&self, min: f64) -> Self {
        let mut out = self.clone();
        if out.sumw2.is_none() {
            out.sumw2 = Some(self.sumw2_or_poisson());
        }
        for c in &mut out.bin_content {
            *c = c.max(min);
        }
        out
    }

    fn sumw2_or_poisson(&self) -> Vec<f64> {
        match &self.sumw2 {
            Some(w2) => w2.clone(),
            None => self.bin_content.iter().map(|c| c.abs()).collect(),
        }
    }

    fn check_binning(&self, other: &Histogram) -> Result<()> {
        let same = self.n_bins == other.n_bins
            && self.bin_edges.iter().zip(&other.bin_edges).all(|(a, b)| {
                (a - b).abs() <= EDGE_TOLERANCE * a.abs().max(b.abs()).max(1.0)
            });
        if same {
            Ok(())
        } else {
            Err(HistError::BinningMismatch(format!(
                "cannot add '{}' ({} bins) to '{}' ({} bins)",
                other.name, other.n_bins, self.name, self.n_bins
            )))
        }
    }

    fn index(&self, i: usize) -> Option<usize> {
        (1..=self.n_bins).contains(&i).then(|| i - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn filled(name: &str, contents: &[f64], errors: &[f64]) -> Histogram {
        let mut h = Histogram::uniform(name, contents.len(), 0.0, 1.0);
        for (i, (&c, &e)) in contents.iter().zip(errors).enumerate() {
            h.set_bin_content(i + 1, c);
            h.set_bin_error(i + 1, e);
        }
        h
    }

    #[test]
    fn accessors_are_one_indexed() {
        let h = filled("h", &[1.0, 4.0], &[0.5, 2.0]);
        assert_eq!(h.bin_content(0), 0.0);
        assert_eq!(h.bin_content(1), 1.0);
        assert_eq!(h.bin_content(2), 4.0);
        assert_eq!(h.bin_content(3), 0.0);
        assert_relative_eq!(h.bin_error(2), 2.0);
        assert_relative_eq!(h.integral(), 5.0);
    }

    #[test]
    fn poisson_error_without_sumw2() {
        let h = Histogram::new("h", vec![0.0, 1.0, 2.0], vec![9.0, 16.0], None).unwrap();
        assert_relative_eq!(h.bin_error(1), 3.0);
        assert_relative_eq!(h.bin_error(2), 4.0);
    }

    #[test]
    fn add_sums_contents_and_squared_errors() {
        let mut a = filled("a", &[1.0, 2.0], &[3.0, 0.0]);
        let b = filled("b", &[2.0, 2.0], &[4.0, 1.0]);
        a.add(&b).unwrap();
        assert_relative_eq!(a.bin_content(1), 3.0);
        assert_relative_eq!(a.bin_error(1), 5.0);
        assert_relative_eq!(a.bin_error(2), 1.0);
    }

    #[test]
    fn add_rejects_different_binning() {
        let mut a = Histogram::uniform("a", 2, 0.0, 1.0);
        let b = Histogram::uniform("b", 3, 0.0, 1.0);
        assert!(matches!(a.add(&b), Err(HistError::BinningMismatch(_))));
    }

    #[test]
    fn floored_raises_contents_only() {
        let h = filled("h", &[0.0, -1.0, 5.0], &[0.1, 0.2, 0.3]);
        let f = h.floored(1e-8);
        assert_eq!(f.bin_content(1), 1e-8);
        assert_eq!(f.bin_content(2), 1e-8);
        assert_eq!(f.bin_content(3), 5.0);
        assert_relative_eq!(f.bin_error(2), 0.2);
    }

    #[test]
    fn new_validates_edge_count() {
        assert!(Histogram::new("h", vec![0.0, 1.0], vec![1.0, 2.0], None).is_err());
        assert!(Histogram::new("h", vec![0.0, 1.0], vec![1.0], Some(vec![1.0, 1.0])).is_err());
    }
}
