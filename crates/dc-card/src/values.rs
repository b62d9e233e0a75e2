//! Per-process uncertainty values and their resolution.

use std::collections::HashMap;

/// Which processes an uncertainty entry applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every process.
    All,
    /// One internal process name.
    Process(String),
}

/// One (scope, value) pair. The value is kept verbatim (`"1.05"` or `"0.96/1.02"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncertaintyEntry {
    /// Processes covered.
    pub scope: Scope,
    /// Value string written to the datacard.
    pub value: String,
}

const UNITY: &str = "1.000000";

const TTBAR_COMPONENTS: &[&str] = &["ttb", "ttbb", "tt2b", "ttcc", "ttOther"];

const TTH_DECAYS: &[&str] = &[
    "ttH",
    "ttHbb",
    "ttHcc",
    "ttHww",
    "ttHzz",
    "ttHtautau",
    "ttHgluongluon",
    "ttHgammagamma",
    "ttHzgamma",
];

/// Sources whose value is `1.000000` for every process.
const UNIVERSAL_SHAPES: &[&str] = &[
    "JES",
    "JER",
    "BTAGDISCR_BPURITY",
    "BTAGDISCR_LPURITY",
    "BTAGDISCR_BSTAT1",
    "BTAGDISCR_BSTAT2",
    "BTAGDISCR_LSTAT1",
    "BTAGDISCR_LSTAT2",
    "BTAGDISCR_CERR1",
    "BTAGDISCR_CERR2",
    "PU",
    "TRIG",
    "LEPT",
    "JESAbsoluteStat",
    "JESAbsoluteScale",
    "JESAbsoluteFlavMap",
    "JESAbsoluteMPFBias",
    "JESFragmentation",
    "JESSinglePionECAL",
    "JESSinglePionHCAL",
    "JESFlavorQCD",
    "JESRelativeJEREC1",
    "JESRelativeJEREC2",
    "JESRelativeJERHF",
    "JESRelativePtBB",
    "JESRelativePtEC1",
    "JESRelativePtEC2",
    "JESRelativePtHF",
    "JESRelativeFSR",
    "JESRelativeStatFSR",
    "JESRelativeStatEC",
    "JESRelativeStatHF",
    "JESRelativeBal",
    "JESPileUpDataMC",
    "JESPileUpPtRef",
    "JESPileUpPtEC1",
    "JESPileUpPtEC2",
    "JESPileUpPtHF",
    "JESPileUpPtBB",
    "JESPileUpMuZero",
    "JESPileUpEnvelope",
    "JESFlavorZJet",
    "JESFlavorPhotonJet",
    "JESFlavorPureGluon",
    "JESFlavorPureQuark",
    "JESFlavorPureCharm",
    "JESFlavorPureBottom",
    "JESTimePtEta",
];

/// Shape sources that affect every tt+jets component with a unit value.
const TTBAR_SHAPES: &[&str] = &["SCALE", "MESCALE", "MEFACSCALE", "MERENSCALE", "PSSCALE"];

/// Single-component shape sources: (base, process).
const COMPONENT_SHAPES: &[(&str, &str)] = &[
    ("SCALE_TTB", "ttb"),
    ("SCALE_TTBB", "ttbb"),
    ("SCALE_TT2B", "tt2b"),
    ("SCALE_TTCC", "ttcc"),
    ("SCALE_TTOTHER", "ttOther"),
    ("MESCALE_TTB", "ttb"),
    ("MESCALE_TTBB", "ttbb"),
    ("MESCALE_TT2B", "tt2b"),
    ("MESCALE_TTCC", "ttcc"),
    ("MESCALE_TTOTHER", "ttOther"),
    ("PSSCALE_TTB", "ttb"),
    ("PSSCALE_TTBB", "ttbb"),
    ("PSSCALE_TT2B", "tt2b"),
    ("PSSCALE_TTCC", "ttcc"),
    ("PSSCALE_TTOTHER", "ttOther"),
];

/// Process-specific rate values: (base, process, value), in lookup order.
const RATE_VALUES: &[(&str, &str, &str)] = &[
    ("XSEC_TTB", "ttb", "1.50"),
    ("XSEC_TTBB", "ttbb", "1.35"),
    ("XSEC_TT2B", "tt2b", "1.50"),
    ("XSEC_TTCC", "ttcc", "1.50"),
    ("XSEC_TTOTHER", "ttOther", "1.030"),
    ("XSEC_TT", "ttb", "0.96/1.02"),
    ("XSEC_TT", "ttbb", "0.96/1.02"),
    ("XSEC_TT", "tt2b", "0.96/1.02"),
    ("XSEC_TT", "ttcc", "0.96/1.02"),
    ("XSEC_TT", "ttOther", "0.96/1.02"),
    ("XSEC_TT", "ttW", "0.88/1.13"),
    ("XSEC_TT", "ttZ", "0.88/1.10"),
    ("NORMPDFGG", "ttb", "1.04"),
    ("NORMPDFGG", "ttbb", "1.04"),
    ("NORMPDFGG", "tt2b", "1.04"),
    ("NORMPDFGG", "ttcc", "1.04"),
    ("NORMPDFGG", "ttOther", "1.04"),
    ("NORMPDFGG", "ttZ", "1.03"),
    ("NORMPDFGQ", "singleTop", "1.03"),
    ("NORMPDFQQ", "wlnu", "1.04"),
    ("NORMPDFQQ", "dy", "1.04"),
    ("NORMPDFQQ", "ttW", "1.02"),
    ("NORMPDFQQ", "diboson", "1.02"),
    ("XSEC_T", "singleTop", "0.98/1.03"),
    ("XSEC_V", "wlnu", "1.01"),
    ("XSEC_V", "dy", "1.01"),
    ("XSEC_VV", "diboson", "1.02"),
    // Parton-shower and tune normalizations for >= 4 jets.
    ("MATCH", "ttb", "0.91/1.10"),
    ("MATCH", "ttbb", "0.92/1.08"),
    ("MATCH", "tt2b", "0.95/1.05"),
    ("MATCH", "ttcc", "0.94/1.06"),
    ("MATCH", "ttOther", "0.96/1.04"),
    ("MATCH_TTBB", "ttbb", "0.921/1.052"),
    ("MATCH_TTB", "ttb", "0.932/1.024"),
    ("MATCH_TT2B", "tt2b", "0.966/1.049"),
    ("MATCH_TTCC", "ttcc", "0.957/1.023"),
    ("MATCH_TTOTHER", "ttOther", "0.97/1.02"),
    ("PSFSRSCALE", "ttb", "0.94/1.04"),
    ("PSFSRSCALE", "ttbb", "0.95/1.05"),
    ("PSFSRSCALE", "tt2b", "0.91/1.1"),
    ("PSFSRSCALE", "ttcc", "0.92/1.07"),
    ("PSFSRSCALE", "ttOther", "1.12/0.81"),
    ("PSFSRSCALE_TTBB", "ttbb", "0.945/1.042"),
    ("PSFSRSCALE_TTB", "ttb", "0.947/1.055"),
    ("PSFSRSCALE_TT2B", "tt2b", "0.925/1.036"),
    ("PSFSRSCALE_TTCC", "ttcc", "0.931/1.085"),
    ("PSFSRSCALE_TTOTHER", "ttOther", "1.137/0.819"),
    ("PSISRSCALE", "ttb", "0.92/1.05"),
    ("PSISRSCALE", "ttbb", "0.95/1.06"),
    ("PSISRSCALE", "tt2b", "0.91/1.1"),
    ("PSISRSCALE", "ttcc", "0.93/1.04"),
    ("PSISRSCALE", "ttOther", "0.966/1.13"),
    ("PSISRSCALE_TTBB", "ttbb", "0.949/1.055"),
    ("PSISRSCALE_TTB", "ttb", "0.933/1.065"),
    ("PSISRSCALE_TT2B", "tt2b", "0.923/1.109"),
    ("PSISRSCALE_TTCC", "ttcc", "0.945/1.055"),
    ("PSISRSCALE_TTOTHER", "ttOther", "0.975/1.044"),
    ("UETUNE", "ttb", "1.02/0.98"),
    ("UETUNE", "ttbb", "1.03/0.97"),
    ("UETUNE", "tt2b", "1.06/0.94"),
    ("UETUNE", "ttcc", "1.04/0.96"),
    ("UETUNE", "ttOther", "1.01/0.99"),
    ("UETUNE_TTBB", "ttbb", "1.021/0.979"),
    ("UETUNE_TTB", "ttb", "0.984/1.016"),
    ("UETUNE_TT2B", "tt2b", "1.025/0.954"),
    ("UETUNE_TTCC", "ttcc", "0.981/1.018"),
    ("UETUNE_TTOTHER", "ttOther", "1.005/0.996"),
];

/// Frozen value table: base name -> ordered entries.
#[derive(Debug, Clone, Default)]
pub struct UncertaintyTable {
    entries: HashMap<String, Vec<UncertaintyEntry>>,
}

impl UncertaintyTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry for `base`.
    pub fn push(&mut self, base: &str, scope: Scope, value: impl Into<String>) {
        self.entries
            .entry(base.to_string())
            .or_default()
            .push(UncertaintyEntry { scope, value: value.into() });
    }

    /// The analysis values, with the luminosity uncertainty as a fraction (0.025 = 2.5%).
    pub fn standard(luminosity_uncertainty: f64) -> Self {
        let mut t = Self::new();
        t.push("LUMI", Scope::All, format!("{:.6}", 1.0 + luminosity_uncertainty));
        for &base in UNIVERSAL_SHAPES {
            t.push(base, Scope::All, UNITY);
        }
        for &(base, process, value) in RATE_VALUES {
            t.push(base, Scope::Process(process.into()), value);
        }
        for &process in TTH_DECAYS {
            t.push("XSEC_TTH", Scope::Process(process.into()), "0.908/1.058");
            t.push("NORMPDFTTH", Scope::Process(process.into()), "1.036");
        }
        for &base in TTBAR_SHAPES {
            for &process in TTBAR_COMPONENTS {
                t.push(base, Scope::Process(process.into()), UNITY);
            }
        }
        for &(base, process) in COMPONENT_SHAPES {
            t.push(base, Scope::Process(process.into()), UNITY);
        }
        // PDF shape: ttH decays (inclusive ttH excluded) and the tt+jets components.
        for &process in TTH_DECAYS.iter().skip(1).chain(TTBAR_COMPONENTS) {
            t.push("PDF", Scope::Process(process.into()), UNITY);
        }
        t
    }

    /// Entries registered for a base name.
    pub fn entries(&self, base: &str) -> &[UncertaintyEntry] {
        self.entries.get(base).map_or(&[], Vec::as_slice)
    }

    /// Value for (`base`, `process`): an `All` entry wins, then the first
    /// entry for exactly `process`; `None` means not applicable.
    pub fn value_for(&self, base: &str, process: &str) -> Option<&str> {
        let entries = self.entries(base);
        entries
            .iter()
            .find(|e| e.scope == Scope::All)
            .or_else(|| {
                entries.iter().find(|e| matches!(&e.scope, Scope::Process(p) if p == process))
            })
            .map(|e| e.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_specific_values() {
        let t = UncertaintyTable::standard(0.025);
        assert_eq!(t.value_for("XSEC_TTBB", "ttbb"), Some("1.35"));
        assert_eq!(t.value_for("XSEC_TTBB", "ttb"), None);
        assert_eq!(t.value_for("XSEC_TT", "ttZ"), Some("0.88/1.10"));
        assert_eq!(t.value_for("XSEC_TTH", "ttHbb"), Some("0.908/1.058"));
        assert_eq!(t.value_for("MATCH", "ttb"), Some("0.91/1.10"));
        assert_eq!(t.value_for("PDF", "ttH"), None);
        assert_eq!(t.value_for("PDF", "ttHbb"), Some("1.000000"));
    }

    #[test]
    fn all_scope_applies_to_every_process() {
        let t = UncertaintyTable::standard(0.025);
        assert_eq!(t.value_for("LUMI", "ttH"), Some("1.025000"));
        assert_eq!(t.value_for("LUMI", "anything"), Some("1.025000"));
        assert_eq!(t.value_for("JESFlavorQCD", "ttbb"), Some("1.000000"));
    }

    #[test]
    fn all_wins_over_earlier_specific_entry() {
        let mut t = UncertaintyTable::new();
        t.push("X", Scope::Process("a".into()), "1.1");
        t.push("X", Scope::All, "1.2");
        t.push("X", Scope::Process("a".into()), "1.3");
        assert_eq!(t.value_for("X", "a"), Some("1.2"));
    }

    #[test]
    fn first_specific_match_wins() {
        let mut t = UncertaintyTable::new();
        t.push("Y", Scope::Process("a".into()), "1.1");
        t.push("Y", Scope::Process("a".into()), "1.3");
        assert_eq!(t.value_for("Y", "a"), Some("1.1"));
        assert_eq!(t.value_for("unregistered", "a"), None);
    }
}
