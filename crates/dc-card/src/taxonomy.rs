//! Systematic taxonomy: uncertainty kind and external label per source.

use std::collections::{BTreeMap, HashMap};

use dc_core::Systematic;

/// How an uncertainty source enters the statistical model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UncertaintyKind {
    /// Alternate up/down histograms per process.
    Shape,
    /// Single multiplicative factor per process (log-normal).
    Rate,
}

impl UncertaintyKind {
    /// Keyword used in the datacard's second column.
    pub fn as_str(self) -> &'static str {
        match self {
            UncertaintyKind::Shape => "shape",
            UncertaintyKind::Rate => "lnN",
        }
    }
}

const JES_COMPONENTS: &[&str] = &[
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
    "JESPileUpMuZero",
    "JESPileUpEnvelope",
    "JESPileUpPtBB",
    "JESFlavorZJet",
    "JESFlavorPhotonJet",
    "JESFlavorPureGluon",
    "JESFlavorPureQuark",
    "JESFlavorPureCharm",
    "JESFlavorPureBottom",
    "JESTimePtEta",
];

const SHAPE_SOURCES: &[&str] = &[
    "BTAGDISCR_BPURITY",
    "BTAGDISCR_LPURITY",
    "BTAGDISCR_BSTAT1",
    "BTAGDISCR_BSTAT2",
    "BTAGDISCR_LSTAT1",
    "BTAGDISCR_LSTAT2",
    "BTAGDISCR_CERR1",
    "BTAGDISCR_CERR2",
    "JES",
    "JER",
    "SCALE_TTB",
    "SCALE_TTBB",
    "SCALE_TT2B",
    "SCALE_TTCC",
    "SCALE_TTOTHER",
    "SCALE",
    "MESCALE_TTB",
    "MESCALE_TTBB",
    "MESCALE_TT2B",
    "MESCALE_TTCC",
    "MESCALE_TTOTHER",
    "MESCALE",
    "MEFACSCALE",
    "MERENSCALE",
    "PSSCALE_TTB",
    "PSSCALE_TTBB",
    "PSSCALE_TT2B",
    "PSSCALE_TTCC",
    "PSSCALE_TTOTHER",
    "PSSCALE",
    "PU",
    "TRIG",
    "LEPT",
    "PDF",
];

const RATE_SOURCES: &[&str] = &[
    "PSFSRSCALE",
    "PSFSRSCALE_TTBB",
    "PSFSRSCALE_TT2B",
    "PSFSRSCALE_TTB",
    "PSFSRSCALE_TTCC",
    "PSFSRSCALE_TTOTHER",
    "PSISRSCALE",
    "PSISRSCALE_TTBB",
    "PSISRSCALE_TT2B",
    "PSISRSCALE_TTB",
    "PSISRSCALE_TTCC",
    "PSISRSCALE_TTOTHER",
    "UETUNE",
    "UETUNE_TTBB",
    "UETUNE_TT2B",
    "UETUNE_TTB",
    "UETUNE_TTCC",
    "UETUNE_TTOTHER",
    "MATCH",
    "MATCH_TTBB",
    "MATCH_TT2B",
    "MATCH_TTB",
    "MATCH_TTCC",
    "MATCH_TTOTHER",
    "LUMI",
    "NORMPDFGG",
    "NORMPDFGQ",
    "NORMPDFQQ",
    "NORMPDFTTH",
    "XSEC_TTB",
    "XSEC_TTBB",
    "XSEC_TT2B",
    "XSEC_TTCC",
    "XSEC_TTOTHER",
    "XSEC_TT",
    "XSEC_TTH",
    "XSEC_T",
    "XSEC_V",
    "XSEC_VV",
];

/// (internal base name, external label stem). The `Up`/`Down` label is the stem
/// plus the direction.
const LABEL_STEMS: &[(&str, &str)] = &[
    ("BTAGDISCR_BPURITY", "CMS_btag_hf"),
    ("BTAGDISCR_BSTAT1", "CMS_btag_hfstats1"),
    ("BTAGDISCR_BSTAT2", "CMS_btag_hfstats2"),
    ("BTAGDISCR_LSTAT1", "CMS_btag_lfstats1"),
    ("BTAGDISCR_LSTAT2", "CMS_btag_lfstats2"),
    ("BTAGDISCR_LPURITY", "CMS_btag_lf"),
    ("BTAGDISCR_CERR1", "CMS_btag_cferr1"),
    ("BTAGDISCR_CERR2", "CMS_btag_cferr2"),
    ("JES", "CMS_scale_j"),
    ("JER", "CMS_res_j"),
    ("LUMI", "lumi_13TeV_2016"),
    ("XSEC_TTBB", "bgnorm_ttbarPlusBBbar"),
    ("XSEC_TTB", "bgnorm_ttbarPlusB"),
    ("XSEC_TT2B", "bgnorm_ttbarPlus2B"),
    ("XSEC_TTCC", "bgnorm_ttbarPlusCCbar"),
    ("XSEC_TTOTHER", "bgnorm_ttbarPlusOther"),
    ("XSEC_TTZ", "CMS_ttHbb_QCDscale_ttbarZ"),
    ("XSEC_TTW", "CMS_ttHbb_QCDscale_ttbarW"),
    ("XSEC_TTH", "QCDscale_ttH"),
    ("XSEC_TT", "QCDscale_ttbar"),
    ("NORMPDFGG", "pdf_gg"),
    ("NORMPDFGQ", "pdf_qg"),
    ("NORMPDFQQ", "pdf_qqbar"),
    ("NORMPDFTTH", "pdf_Higgs_ttH"),
    ("XSEC_V", "QCDscale_V"),
    ("XSEC_VV", "QCDscale_VV"),
    ("XSEC_T", "QCDscale_singlet"),
    ("SCALE_TTB", "CMS_ttHbb_Scale_ttbarPlusB"),
    ("SCALE_TT2B", "CMS_ttHbb_Scale_ttbarPlus2B"),
    ("SCALE_TTBB", "CMS_ttHbb_Scale_ttbarPlusBBbar"),
    ("SCALE_TTCC", "CMS_ttHbb_Scale_ttbarPlusCCbar"),
    ("SCALE_TTOTHER", "CMS_ttHbb_Scale_ttbarOther"),
    ("MESCALE_TTB", "CMS_ttHbb_Q2scale_ttbarPlusB"),
    ("MESCALE_TT2B", "CMS_ttHbb_Q2scale_ttbarPlus2B"),
    ("MESCALE_TTBB", "CMS_ttHbb_Q2scale_ttbarPlusBBbar"),
    ("MESCALE_TTCC", "CMS_ttHbb_Q2scale_ttbarPlusCCbar"),
    ("MESCALE_TTOTHER", "CMS_ttHbb_Q2scale_ttbarOther"),
    ("MEFACSCALE", "CMS_ttHbb_scaleMuF"),
    ("MERENSCALE", "CMS_ttHbb_scaleMuR"),
    ("PSFSRSCALE", "CMS_ttHbb_FSR"),
    ("PSISRSCALE", "CMS_ttHbb_ISR"),
    ("UETUNE", "CMS_ttHbb_UE"),
    ("UETUNE_TTBB", "CMS_ttHbb_UE_ttbarPlusBBbar"),
    ("UETUNE_TT2B", "CMS_ttHbb_UE_ttbarPlus2B"),
    ("UETUNE_TTB", "CMS_ttHbb_UE_ttbarPlusB"),
    ("UETUNE_TTCC", "CMS_ttHbb_UE_ttbarPlusCCbar"),
    ("UETUNE_TTOTHER", "CMS_ttHbb_UE_ttbarOther"),
    ("PSISRSCALE_TTBB", "CMS_ttHbb_ISR_ttbarPlusBBbar"),
    ("PSISRSCALE_TT2B", "CMS_ttHbb_ISR_ttbarPlus2B"),
    ("PSISRSCALE_TTB", "CMS_ttHbb_ISR_ttbarPlusB"),
    ("PSISRSCALE_TTCC", "CMS_ttHbb_ISR_ttbarPlusCCbar"),
    ("PSISRSCALE_TTOTHER", "CMS_ttHbb_ISR_ttbarOther"),
    ("PSFSRSCALE_TTBB", "CMS_ttHbb_FSR_ttbarPlusBBbar"),
    ("PSFSRSCALE_TT2B", "CMS_ttHbb_FSR_ttbarPlus2B"),
    ("PSFSRSCALE_TTB", "CMS_ttHbb_FSR_ttbarPlusB"),
    ("PSFSRSCALE_TTCC", "CMS_ttHbb_FSR_ttbarPlusCCbar"),
    ("PSFSRSCALE_TTOTHER", "CMS_ttHbb_FSR_ttbarOther"),
    ("PSSCALE_TTB", "CMS_ttHbb_PSscale_ttbarPlusB"),
    ("PSSCALE_TT2B", "CMS_ttHbb_PSscale_ttbarPlus2B"),
    ("PSSCALE_TTBB", "CMS_ttHbb_PSscale_ttbarPlusBBbar"),
    ("PSSCALE_TTCC", "CMS_ttHbb_PSscale_ttbarPlusCCbar"),
    ("PSSCALE_TTOTHER", "CMS_ttHbb_PSscale_ttbarOther"),
    ("MATCH", "CMS_ttHbb_HDAMP"),
    ("MATCH_TTBB", "CMS_ttHbb_HDAMP_ttbarPlusBBbar"),
    ("MATCH_TT2B", "CMS_ttHbb_HDAMP_ttbarPlus2B"),
    ("MATCH_TTB", "CMS_ttHbb_HDAMP_ttbarPlusB"),
    ("MATCH_TTCC", "CMS_ttHbb_HDAMP_ttbarPlusCCbar"),
    ("MATCH_TTOTHER", "CMS_ttHbb_HDAMP_ttbarOther"),
    ("PU", "CMS_ttHbb_PU"),
    ("SCALE", "CMS_ttHbb_scale"),
    ("MESCALE", "CMS_ttHbb_Q2scale"),
    ("PSSCALE", "CMS_ttHbb_psScale"),
    ("PDF", "CMS_ttHbb_PDF"),
    ("TRIG", "CMS_ttHbb_effTrigger_dl"),
    ("LEPT", "CMS_ttHbb_eff_lepton"),
];

/// Label of the nominal configuration.
pub const NOMINAL_LABEL: &str = "nominal";

/// Immutable taxonomy built once at start-up.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    kinds: HashMap<String, UncertaintyKind>,
    labels: BTreeMap<String, String>,
}

impl Taxonomy {
    /// The analysis taxonomy.
    pub fn standard() -> Self {
        let mut kinds = HashMap::new();
        for &name in SHAPE_SOURCES.iter().chain(JES_COMPONENTS) {
            kinds.insert(name.to_string(), UncertaintyKind::Shape);
        }
        for &name in RATE_SOURCES {
            kinds.insert(name.to_string(), UncertaintyKind::Rate);
        }

        let mut labels = BTreeMap::new();
        labels.insert("Nominal".to_string(), NOMINAL_LABEL.to_string());
        let jes_stems = JES_COMPONENTS.iter().map(|&c| (c, format!("CMS_scale{}_j", &c[3..])));
        let stems = LABEL_STEMS.iter().map(|&(b, s)| (b, s.to_string())).chain(jes_stems);
        for (base, stem) in stems {
            labels.insert(format!("{}_UP", base), format!("{}Up", stem));
            labels.insert(format!("{}_DOWN", base), format!("{}Down", stem));
        }

        Self { kinds, labels }
    }

    /// Kind registered for a base name (`None` = not a recognized nuisance).
    pub fn kind_of(&self, base_name: &str) -> Option<UncertaintyKind> {
        self.kinds.get(base_name).copied()
    }

    /// Whether a systematic's base name is registered as rate-only.
    pub fn is_rate(&self, systematic: &Systematic) -> bool {
        self.kind_of(&systematic.base_name()) == Some(UncertaintyKind::Rate)
    }

    /// External label of a full systematic name (`"JES_UP"` -> `"CMS_scale_jUp"`).
    pub fn label_of(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    /// Datacard row label of a base name: its `Up` label without the direction.
    pub fn row_label(&self, base_name: &str) -> Option<&str> {
        let up = self.label_of(&format!("{}_UP", base_name))?;
        up.strip_suffix("Up")
    }

    /// `internal\texternal\n` lines for every label, sorted by internal name.
    pub fn label_record(&self) -> String {
        self.labels.iter().map(|(k, v)| format!("{}\t{}\n", k, v)).collect()
    }
}
