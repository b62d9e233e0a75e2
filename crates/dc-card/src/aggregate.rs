//! Histogram extraction from per-category source containers and the nominal
//! yields / sums derived from them.

use std::collections::BTreeMap;

use dc_core::{Error, Result};
use dc_hist::{Histogram, HistogramSource};

use crate::mcstat::CONTENT_FLOOR;
use crate::naming::{NamingRegistry, is_pseudo_process};

/// Histograms of one plot, keyed by internal process name.
#[derive(Debug, Clone, Default)]
pub struct ExtractedHistograms {
    /// Found histograms.
    pub histograms: BTreeMap<String, Histogram>,
    /// Listed processes with no `<plot>_<process>` histogram in the source.
    pub missing: Vec<String>,
}

impl ExtractedHistograms {
    /// Histogram of `process`, if it was found.
    pub fn get(&self, process: &str) -> Option<&Histogram> {
        self.histograms.get(process)
    }
}

/// Pull every `<plot>_<process>` histogram whose process is in `processes`.
///
/// Absent processes are logged and reported in [`ExtractedHistograms::missing`].
pub fn extract_histograms<S: HistogramSource + ?Sized>(
    source: &S,
    plot: &str,
    processes: &[String],
) -> Result<ExtractedHistograms> {
    let prefix = format!("{}_", plot);
    let names = source
        .histogram_names()
        .map_err(|e| Error::Archive(format!("listing histograms for '{}': {}", plot, e)))?;

    let mut out = ExtractedHistograms::default();
    for name in names {
        let Some(process) = name.strip_prefix(&prefix) else { continue };
        if !processes.iter().any(|p| p == process) {
            continue;
        }
        let h = source
            .histogram(&name)
            .map_err(|e| Error::Archive(format!("reading histogram '{}': {}", name, e)))?;
        out.histograms.insert(process.to_string(), h);
    }
    for process in processes {
        if !out.histograms.contains_key(process) {
            log::warn!("histogram '{}{}' not found", prefix, process);
            out.missing.push(process.clone());
        }
    }
    Ok(out)
}

/// Rate of one non-pseudo process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessYield {
    /// Internal process name.
    pub process: String,
    /// External label.
    pub label: String,
    /// Nominal integral; `None` when the histogram is missing.
    pub rate: Option<f64>,
}

/// Observation and per-process rates for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct Yields {
    /// Integral of the observed pseudo-process (`data`, else `allmc`).
    pub observation: Option<f64>,
    /// One entry per non-pseudo process, in list order.
    pub rates: Vec<ProcessYield>,
    /// Listed processes whose name contains the signal model.
    pub n_signal: usize,
}

impl Yields {
    /// Compute from extracted nominal histograms.
    pub fn compute(
        extracted: &ExtractedHistograms,
        processes: &[String],
        naming: &NamingRegistry,
        signal_model: &str,
    ) -> Self {
        let observation = observed(extracted).map(Histogram::integral);
        let rates = processes
            .iter()
            .filter(|p| !is_pseudo_process(p))
            .map(|p| ProcessYield {
                process: p.clone(),
                label: naming.process_label(p).unwrap_or(p.as_str()).to_string(),
                rate: extracted.get(p).map(Histogram::integral),
            })
            .collect();
        let n_signal = processes.iter().filter(|p| p.contains(signal_model)).count();
        Self { observation, rates, n_signal }
    }

    /// Internal process names of the rate columns.
    pub fn processes(&self) -> Vec<&str> {
        self.rates.iter().map(|r| r.process.as_str()).collect()
    }

    /// External labels of the rate columns.
    pub fn labels(&self) -> Vec<&str> {
        self.rates.iter().map(|r| r.label.as_str()).collect()
    }
}

fn observed(extracted: &ExtractedHistograms) -> Option<&Histogram> {
    extracted.get("data").or_else(|| extracted.get("allmc"))
}

/// Floored nominal sums used by the MC-stat pruning rule.
#[derive(Debug, Clone, Default)]
pub struct NominalSums {
    /// Observed pseudo-process (error only).
    pub data: Option<Histogram>,
    /// Sum of processes containing the signal model.
    pub signal: Option<Histogram>,
    /// Sum of the remaining non-pseudo processes.
    pub background: Option<Histogram>,
}

impl NominalSums {
    /// Sum every listed histogram after raising its bins to [`CONTENT_FLOOR`].
    pub fn compute(extracted: &ExtractedHistograms, processes: &[String], signal_model: &str) -> Result<Self> {
        let mut sums = Self { data: observed(extracted).map(|h| h.floored(CONTENT_FLOOR)), ..Self::default() };
        for process in processes {
            if is_pseudo_process(process) {
                continue;
            }
            let Some(h) = extracted.get(process) else { continue };
            let slot = if process.contains(signal_model) { &mut sums.signal } else { &mut sums.background };
            add_floored(slot, h)?;
        }
        Ok(sums)
    }
}

fn add_floored(slot: &mut Option<Histogram>, h: &Histogram) -> Result<()> {
    let floored = h.floored(CONTENT_FLOOR);
    match slot {
        Some(sum) => sum
            .add(&floored)
            .map_err(|e| Error::Validation(format!("summing '{}': {}", h.name, e))),
        None => {
            *slot = Some(floored);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn hist(name: &str, contents: &[f64]) -> Histogram {
        let edges = (0..=contents.len()).map(|i| i as f64).collect();
        Histogram::new(name, edges, contents.to_vec(), Some(contents.to_vec())).unwrap()
    }

    fn source() -> HashMap<String, Histogram> {
        let mut m = HashMap::new();
        for (name, c) in [
            ("plot_cate0_ttH", vec![1.0, 2.0]),
            ("plot_cate0_ttbb", vec![10.0, 0.0]),
            ("plot_cate0_data", vec![12.0, 3.0]),
            ("plot_cate0_qcd", vec![5.0, 5.0]),
            ("plot_cate0", vec![0.0, 0.0]),
        ] {
            m.insert(name.to_string(), hist(name, &c));
        }
        m
    }

    fn procs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extracts_listed_processes_only() {
        let ex = extract_histograms(&source(), "plot_cate0", &procs(&["ttH", "ttbb", "data", "dy"])).unwrap();
        let keys: Vec<&str> = ex.histograms.keys().map(String::as_str).collect();
        assert_eq!(keys, ["data", "ttH", "ttbb"]);
        assert_eq!(ex.missing, ["dy"]);
    }

    #[test]
    fn yields_and_signal_count() {
        let processes = procs(&["ttH", "ttbb", "dy", "data"]);
        let ex = extract_histograms(&source(), "plot_cate0", &processes).unwrap();
        let y = Yields::compute(&ex, &processes, &NamingRegistry::standard(), "ttH");
        assert_relative_eq!(y.observation.unwrap(), 15.0);
        assert_eq!(y.labels(), ["ttH", "ttbarPlusBBbar", "zjets"]);
        assert_eq!(y.rates[2].rate, None);
        assert_eq!(y.n_signal, 1);
    }

    #[test]
    fn sums_use_floored_contents() {
        let processes = procs(&["ttH", "ttbb", "qcd", "data"]);
        let ex = extract_histograms(&source(), "plot_cate0", &processes).unwrap();
        let sums = NominalSums::compute(&ex, &processes, "ttH").unwrap();
        let bkg = sums.background.unwrap();
        assert_relative_eq!(bkg.bin_content(1), 15.0);
        assert_relative_eq!(bkg.bin_content(2), 5.0 + CONTENT_FLOOR);
        assert_relative_eq!(sums.signal.unwrap().bin_content(2), 2.0);
        assert!(sums.data.is_some());
    }
}
