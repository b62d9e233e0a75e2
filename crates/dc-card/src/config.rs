//! Analysis configuration (YAML, or JSON by extension).

use std::path::Path;

use dc_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::naming::NamingRegistry;

/// One analysis category: the plot name and its ordered process list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramEntry {
    /// Plot / config name; its last `_` token is the category token.
    pub name: String,
    /// Internal process names, in column order.
    pub processes: Vec<String>,
}

/// A `<name> group = <members>` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Group name.
    pub name: String,
    /// Nuisance row labels.
    pub members: Vec<String>,
}

/// Top-level analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Fractional luminosity uncertainty; the LUMI value is `1 + x`.
    #[serde(default = "default_luminosity_uncertainty")]
    pub luminosity_uncertainty: f64,
    /// Substring identifying signal processes.
    #[serde(default = "default_signal_model")]
    pub signal_model: String,
    /// Observable tag used in archive directories and MC-stat names.
    #[serde(default = "default_observable_type")]
    pub observable_type: String,
    /// Root of the output tree.
    #[serde(default = "default_output_base_dir")]
    pub output_base_dir: String,
    /// Archive path relative to each channel directory.
    #[serde(default = "default_archive_file_name")]
    pub archive_file_name: String,
    /// Datacard file stem prefix.
    #[serde(default = "default_datacard_prefix")]
    pub datacard_prefix: String,
    /// Suffix of per-category source container basenames.
    #[serde(default = "default_source_suffix")]
    pub source_suffix: String,
    /// Enable MC-stat pruning.
    #[serde(default)]
    pub prune_bin_by_bin: bool,
    /// Emit the systematic table.
    #[serde(default = "default_true")]
    pub include_systematics: bool,
    /// Emit MC-stat rows.
    #[serde(default = "default_true")]
    pub include_statistical: bool,
    /// Optional group lines.
    #[serde(default)]
    pub systematic_groups: Vec<GroupConfig>,
    /// Analysis categories.
    pub histograms: Vec<HistogramEntry>,
}

fn default_luminosity_uncertainty() -> f64 {
    0.025
}

fn default_signal_model() -> String {
    "ttH".to_string()
}

fn default_observable_type() -> String {
    "BDT".to_string()
}

fn default_output_base_dir() -> String {
    "datacards".to_string()
}

fn default_archive_file_name() -> String {
    "common/ttH_hbb_13TeV_dl.dcar".to_string()
}

fn default_datacard_prefix() -> String {
    "ttH_hbb_13TeV_".to_string()
}

fn default_source_suffix() -> String {
    "_source.dcar".to_string()
}

fn default_true() -> bool {
    true
}

/// Read and parse a configuration file; every failure is [`Error::Config`].
pub fn read_analysis_config(path: &Path) -> Result<AnalysisConfig> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let cfg: AnalysisConfig = if ext == "json" {
        serde_json::from_slice(&bytes).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?
    } else {
        serde_yaml_ng::from_slice(&bytes).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?
    };
    Ok(cfg)
}

impl AnalysisConfig {
    /// Entries whose name matches any pattern (case-insensitive substring; a
    /// leading `+` asks for an exact match). No pattern selects everything.
    pub fn select_histograms(&self, patterns: &[String]) -> Vec<HistogramEntry> {
        if patterns.is_empty() {
            return self.histograms.clone();
        }
        let matches = |name: &str| {
            let name = name.to_lowercase();
            patterns.iter().any(|p| match p.strip_prefix('+') {
                Some(exact) => name == exact.to_lowercase(),
                None => name.contains(&p.to_lowercase()),
            })
        };
        self.histograms.iter().filter(|e| matches(&e.name)).cloned().collect()
    }
}

/// Drop process tokens unknown to `naming`, keeping order.
pub fn filter_processes(processes: &[String], naming: &NamingRegistry) -> Vec<String> {
    processes
        .iter()
        .filter(|p| {
            let known = naming.knows_process(p);
            if !known {
                log::debug!("dropping unknown process token '{}'", p);
            }
            known
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = "\
histograms:
  - name: mvaEventA_cate0
    processes: [ttH, ttbb, bogus, data]
  - name: mvaEventA_cate3High
    processes: [ttH, data]
";

    #[test]
    fn defaults_fill_missing_keys() {
        let cfg: AnalysisConfig = serde_yaml_ng::from_str(YAML).unwrap();
        assert_eq!(cfg.signal_model, "ttH");
        assert_eq!(cfg.observable_type, "BDT");
        assert_eq!(cfg.archive_file_name, "common/ttH_hbb_13TeV_dl.dcar");
        assert!(!cfg.prune_bin_by_bin);
        assert!(cfg.include_systematics && cfg.include_statistical);
        assert!((cfg.luminosity_uncertainty - 0.025).abs() < 1e-12);
        assert_eq!(cfg.histograms.len(), 2);
    }

    #[test]
    fn missing_histograms_key_is_an_error() {
        assert!(serde_yaml_ng::from_str::<AnalysisConfig>("signal_model: ttH\n").is_err());
    }

    #[test]
    fn unreadable_file_is_config_error() {
        let err = read_analysis_config(Path::new("/nonexistent/dc_card/HistoList.yaml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{:?}", err);
    }

    #[test]
    fn malformed_files_are_config_errors() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!("dc_card_cfg_{}_{}", std::process::id(), nanos));
        std::fs::create_dir_all(&dir).unwrap();
        for (file, body) in [("bad.yaml", "histograms: [unclosed\n"), ("bad.json", "{\"histograms\": 3}")] {
            let path = dir.join(file);
            std::fs::write(&path, body).unwrap();
            let err = read_analysis_config(&path).unwrap_err();
            assert!(matches!(err, Error::Config(ref m) if m.contains(file)), "{:?}", err);
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn selection_patterns() {
        let cfg: AnalysisConfig = serde_yaml_ng::from_str(YAML).unwrap();
        let names = |p: &[&str]| {
            let p: Vec<String> = p.iter().map(|s| s.to_string()).collect();
            cfg.select_histograms(&p).into_iter().map(|e| e.name).collect::<Vec<_>>()
        };
        assert_eq!(names(&[]).len(), 2);
        assert_eq!(names(&["CATE3"]), ["mvaEventA_cate3High"]);
        assert_eq!(names(&["+mvaeventa_cate0"]), ["mvaEventA_cate0"]);
        assert!(names(&["+cate0"]).is_empty());
    }

    #[test]
    fn unknown_process_tokens_are_dropped() {
        let cfg: AnalysisConfig = serde_yaml_ng::from_str(YAML).unwrap();
        let kept = filter_processes(&cfg.histograms[0].processes, &NamingRegistry::standard());
        assert_eq!(kept, ["ttH", "ttbb", "data"]);
    }
}
