//! Bin-by-bin Monte-Carlo statistical shape nuisances.
//!
//! Every (process, bin) pair that survives pruning becomes one shape
//! nuisance: a down and an up clone of the process nominal with that single
//! bin shifted by one statistical error.

use dc_core::Result;
use dc_hist::Histogram;

use crate::aggregate::{ExtractedHistograms, NominalSums};
use crate::naming::{NamingRegistry, is_pseudo_process};

/// Smallest bin content a summed or shifted histogram may hold.
pub const CONTENT_FLOOR: f64 = 1e-8;

/// Per-bin quantities the pruning rule looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PruningInputs {
    /// Error of the observed pseudo-process (0 when there is none).
    pub data_error: f64,
    /// Summed signal content.
    pub signal_content: f64,
    /// Summed background content.
    pub background_content: f64,
    /// Summed background error.
    pub background_error: f64,
    /// Content of the process under consideration.
    pub content: f64,
    /// Error of the process under consideration.
    pub error: f64,
}

/// Whether a bin is statistically uninteresting and gets no nuisance.
pub fn should_prune(b: &PruningInputs) -> bool {
    if b.background_error <= 0.0 {
        return true;
    }
    let others = (b.background_error.powi(2) - b.error.powi(2)).max(0.0).sqrt();
    b.background_error < b.data_error / 5.0
        || b.signal_content / b.background_content < 0.01
        || b.content < 0.01
        || others / b.background_error > 0.95
}

/// Direction of a statistical shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    /// Content minus one error.
    Down,
    /// Content plus one error.
    Up,
}

impl Shift {
    /// Processing order.
    pub const ORDER: [Shift; 2] = [Shift::Down, Shift::Up];

    fn sign(self) -> f64 {
        match self {
            Shift::Down => -1.0,
            Shift::Up => 1.0,
        }
    }

    /// Suffix of the archived histogram name.
    pub fn suffix(self) -> &'static str {
        match self {
            Shift::Down => "Down",
            Shift::Up => "Up",
        }
    }
}

/// Copy of `nominal` with bin `bin` (1-indexed) moved by one error, floored at
/// [`CONTENT_FLOOR`].
pub fn shifted_histogram(nominal: &Histogram, bin: usize, shift: Shift) -> Histogram {
    let mut h = nominal.clone();
    let shifted = nominal.bin_content(bin) + shift.sign() * nominal.bin_error(bin);
    h.set_bin_content(bin, shifted.max(CONTENT_FLOOR));
    h
}

/// Nuisance name of one (process, bin) pair.
pub fn nuisance_name(process_label: &str, category_label: &str, observable: &str, bin: usize) -> String {
    format!("CMS_ttH_{}_{}_13TeV_{}bin{}", process_label, category_label, observable, bin)
}

/// One synthesized MC-stat nuisance.
#[derive(Debug, Clone)]
pub struct McStatNuisance {
    /// Internal name of the owning process.
    pub process: String,
    /// External label of the owning process.
    pub label: String,
    /// Datacard row name.
    pub name: String,
    /// 1-indexed bin.
    pub bin: usize,
    /// Down clone, named `<label>_<name>Down`.
    pub down: Histogram,
    /// Up clone, named `<label>_<name>Up`.
    pub up: Histogram,
}

impl McStatNuisance {
    /// Row entries for the given rate columns (internal process names):
    /// `1.000000` in the owner's column, `-` elsewhere.
    pub fn row_values<'a>(&self, processes: impl IntoIterator<Item = &'a str>) -> Vec<Option<&'static str>> {
        processes.into_iter().map(|p| (p == self.process).then_some("1.000000")).collect()
    }

    /// Both clones in writing order.
    pub fn histograms(&self) -> [&Histogram; 2] {
        [&self.down, &self.up]
    }
}

/// Inputs of one category's MC-stat synthesis.
#[derive(Debug, Clone, Copy)]
pub struct McStatContext<'a> {
    /// External bin label of the category.
    pub category_label: &'a str,
    /// Observable type used in names.
    pub observable: &'a str,
    /// Apply [`should_prune`].
    pub prune: bool,
}

/// Build the nuisances of every non-pseudo process in list order.
///
/// A process whose nominal integral is exactly zero gets its unshifted
/// nominal as the down clone.
pub fn synthesize(
    extracted: &ExtractedHistograms,
    sums: &NominalSums,
    processes: &[String],
    naming: &NamingRegistry,
    ctx: McStatContext<'_>,
) -> Result<Vec<McStatNuisance>> {
    let mut out = Vec::new();
    for process in processes.iter().filter(|p| !is_pseudo_process(p)) {
        let Some(raw) = extracted.get(process) else {
            log::debug!("no nominal histogram for '{}', skipping MC-stat", process);
            continue;
        };
        let label = naming.process_label(process).unwrap_or(process.as_str());
        let nominal = raw.floored(CONTENT_FLOOR);
        let empty = raw.integral() == 0.0;

        for bin in 1..=nominal.n_bins {
            if ctx.prune {
                let inputs = PruningInputs {
                    data_error: sums.data.as_ref().map_or(0.0, |h| h.bin_error(bin)),
                    signal_content: sums.signal.as_ref().map_or(0.0, |h| h.bin_content(bin)),
                    background_content: sums.background.as_ref().map_or(0.0, |h| h.bin_content(bin)),
                    background_error: sums.background.as_ref().map_or(0.0, |h| h.bin_error(bin)),
                    content: nominal.bin_content(bin),
                    error: nominal.bin_error(bin),
                };
                if should_prune(&inputs) {
                    continue;
                }
            }
            let name = nuisance_name(label, ctx.category_label, ctx.observable, bin);
            let clone = |shift: Shift| {
                let h = if shift == Shift::Down && empty {
                    raw.clone()
                } else {
                    shifted_histogram(&nominal, bin, shift)
                };
                h.renamed(format!("{}_{}{}", label, name, shift.suffix()))
            };
            out.push(McStatNuisance {
                process: process.clone(),
                label: label.to_string(),
                down: clone(Shift::Down),
                up: clone(Shift::Up),
                name,
                bin,
            });
        }
    }
    Ok(out)
}
