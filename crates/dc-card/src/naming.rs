//! Process and category naming registry.

use std::collections::HashMap;

use dc_core::{Error, Result};

/// Internal process name -> external process label.
const PROCESS_LABELS: &[(&str, &str)] = &[
    ("data", "data_obs"),
    ("allmc", "data_obs"),
    ("ttH", "ttH"),
    ("notttH", "nottH"),
    ("ttHnobb", "ttH_nobb"),
    ("ttHbb", "ttH_hbb"),
    ("ttHcc", "ttH_hcc"),
    ("ttHww", "ttH_hww"),
    ("ttHzz", "ttH_hzz"),
    ("ttHtautau", "ttH_htt"),
    ("ttHgluongluon", "ttH_hgluglu"),
    ("ttHgammagamma", "ttH_hgg"),
    ("ttHzgamma", "ttH_hzg"),
    ("ttb", "ttbarPlusB"),
    ("ttbb", "ttbarPlusBBbar"),
    ("ttcc", "ttbarPlusCCbar"),
    ("tt2b", "ttbarPlus2B"),
    ("ttOther", "ttbarOther"),
    ("ttZ", "ttbarZ"),
    ("ttW", "ttbarW"),
    ("singleTop", "singlet"),
    ("diboson", "diboson"),
    ("wlnu", "wjets"),
    ("w", "wjets"),
    ("dy", "zjets"),
    ("dyee", "zjets"),
    ("dymumu", "zjets"),
    ("dytautau", "zjets"),
    ("ttGamma", "ttGamma"),
    ("ww", "ww"),
    ("wz", "wz"),
    ("zz", "zz"),
    ("www", "ww"),
    ("wwz", "wwz"),
    ("zzz", "zzz"),
    ("qcd", "qcd"),
    ("minorBkg", "minorBkg"),
];

/// Category token (last `_` token of a plot name) -> datacard bin label.
const CATEGORY_LABELS: &[(&str, &str)] = &[
    ("cate0", "dl_3j2t"),
    ("cate1", "dl_3j3t"),
    ("cate2", "dl_ge4j2t"),
    ("cate3", "dl_ge4j3t"),
    ("cate4", "dl_ge4jge4t"),
    ("cate3Low", "dl_ge4j3t_low"),
    ("cate3High", "dl_ge4j3t_high"),
    ("cate4Low", "dl_ge4jge4t_low"),
    ("cate4High", "dl_ge4jge4t_high"),
];

/// Pseudo-processes: they drive the observation row but get no rate column.
pub fn is_pseudo_process(name: &str) -> bool {
    name == "data" || name == "allmc"
}

/// Last `_`-separated token of a plot name.
pub fn category_token(plot_name: &str) -> &str {
    plot_name.rsplit('_').next().unwrap_or(plot_name)
}

/// Frozen name maps.
#[derive(Debug, Clone)]
pub struct NamingRegistry {
    processes: HashMap<&'static str, &'static str>,
    categories: HashMap<&'static str, &'static str>,
}

impl NamingRegistry {
    /// The analysis naming tables.
    pub fn standard() -> Self {
        Self {
            processes: PROCESS_LABELS.iter().copied().collect(),
            categories: CATEGORY_LABELS.iter().copied().collect(),
        }
    }

    /// External label of an internal process name.
    pub fn process_label(&self, process: &str) -> Option<&'static str> {
        self.processes.get(process).copied()
    }

    /// Whether the process name is known.
    pub fn knows_process(&self, process: &str) -> bool {
        self.processes.contains_key(process)
    }

    /// Fail when two rate-column processes map to the same external label.
    ///
    /// The datacard addresses shapes as `$PROCESS`, so such columns would
    /// share archive histograms.
    pub fn check_distinct_labels(&self, processes: &[String]) -> Result<()> {
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for process in processes.iter().filter(|p| !is_pseudo_process(p)) {
            let label = self.process_label(process).unwrap_or(process.as_str());
            if let Some(first) = owners.insert(label, process.as_str()) {
                return Err(Error::Config(format!(
                    "processes '{}' and '{}' share the datacard label '{}'",
                    first, process, label
                )));
            }
        }
        Ok(())
    }

    /// Bin label for a plot name, via its category token.
    pub fn category_label(&self, plot_name: &str) -> Result<&'static str> {
        let token = category_token(plot_name);
        self.categories.get(token).copied().ok_or_else(|| {
            Error::Config(format!("unknown category token '{}' in plot name '{}'", token, plot_name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_from_last_token() {
        let n = NamingRegistry::standard();
        assert_eq!(category_token("mvaEventA_ttH_cate4"), "cate4");
        assert_eq!(n.category_label("mvaEventA_ttH_cate4").unwrap(), "dl_ge4jge4t");
        assert_eq!(n.category_label("cate3High").unwrap(), "dl_ge4j3t_high");
        assert!(matches!(n.category_label("mvaEventA_cate9"), Err(Error::Config(_))));
    }

    #[test]
    fn process_labels() {
        let n = NamingRegistry::standard();
        assert_eq!(n.process_label("ttbb"), Some("ttbarPlusBBbar"));
        assert_eq!(n.process_label("allmc"), Some("data_obs"));
        assert_eq!(n.process_label("unknown"), None);
        assert!(is_pseudo_process("data"));
        assert!(!is_pseudo_process("ttH"));
    }

    #[test]
    fn shared_labels_are_rejected() {
        let n = NamingRegistry::standard();
        let list = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(n.check_distinct_labels(&list(&["ttH", "ttbb", "dy", "data", "allmc"])).is_ok());
        let err = n.check_distinct_labels(&list(&["ttH", "dy", "dyee"])).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("zjets")), "{:?}", err);
        assert!(n.check_distinct_labels(&list(&["w", "wlnu"])).is_err());
    }
}
