//! Systematic, variation and channel model shared across the workspace.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

macro_rules! systematic_types {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Closed enumeration of systematic sources known to the analysis.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum SystematicType {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl SystematicType {
            /// Every type, in declaration order.
            pub const ALL: &'static [SystematicType] = &[$(SystematicType::$variant),+];

            /// Internal name, as used in file-list names and taxonomy keys.
            pub fn name(self) -> &'static str {
                match self {
                    $(SystematicType::$variant => $name),+
                }
            }
        }
    };
}

systematic_types! {
    Nominal => "Nominal",
    All => "all",
    AllAvailable => "allAvailable",
    Pu => "PU",
    Lept => "LEPT",
    Trig => "TRIG",
    Jer => "JER",
    Jes => "JES",
    JesAbsoluteStat => "JESAbsoluteStat",
    JesAbsoluteScale => "JESAbsoluteScale",
    JesAbsoluteFlavMap => "JESAbsoluteFlavMap",
    JesAbsoluteMpfBias => "JESAbsoluteMPFBias",
    JesFragmentation => "JESFragmentation",
    JesSinglePionEcal => "JESSinglePionECAL",
    JesSinglePionHcal => "JESSinglePionHCAL",
    JesFlavorQcd => "JESFlavorQCD",
    JesTimePtEta => "JESTimePtEta",
    JesRelativeJerEc1 => "JESRelativeJEREC1",
    JesRelativeJerEc2 => "JESRelativeJEREC2",
    JesRelativeJerHf => "JESRelativeJERHF",
    JesRelativePtBb => "JESRelativePtBB",
    JesRelativePtEc1 => "JESRelativePtEC1",
    JesRelativePtEc2 => "JESRelativePtEC2",
    JesRelativePtHf => "JESRelativePtHF",
    JesRelativeFsr => "JESRelativeFSR",
    JesRelativeStatFsr => "JESRelativeStatFSR",
    JesRelativeStatEc => "JESRelativeStatEC",
    JesRelativeStatHf => "JESRelativeStatHF",
    JesRelativeBal => "JESRelativeBal",
    JesPileUpDataMc => "JESPileUpDataMC",
    JesPileUpPtRef => "JESPileUpPtRef",
    JesPileUpPtBb => "JESPileUpPtBB",
    JesPileUpPtEc1 => "JESPileUpPtEC1",
    JesPileUpPtEc2 => "JESPileUpPtEC2",
    JesPileUpPtHf => "JESPileUpPtHF",
    JesPileUpMuZero => "JESPileUpMuZero",
    JesPileUpEnvelope => "JESPileUpEnvelope",
    JesSubTotalPileUp => "JESSubTotalPileUp",
    JesSubTotalRelative => "JESSubTotalRelative",
    JesSubTotalPt => "JESSubTotalPt",
    JesSubTotalScale => "JESSubTotalScale",
    JesSubTotalMc => "JESSubTotalMC",
    JesSubTotalAbsolute => "JESSubTotalAbsolute",
    JesTotalNoFlavor => "JESTotalNoFlavor",
    JesFlavorZJet => "JESFlavorZJet",
    JesFlavorPhotonJet => "JESFlavorPhotonJet",
    JesFlavorPureGluon => "JESFlavorPureGluon",
    JesFlavorPureQuark => "JESFlavorPureQuark",
    JesFlavorPureCharm => "JESFlavorPureCharm",
    JesFlavorPureBottom => "JESFlavorPureBottom",
    JesCorrelationGroupMpfInSitu => "JESCorrelationGroupMPFInSitu",
    JesCorrelationGroupIntercalibration => "JESCorrelationGroupIntercalibration",
    JesCorrelationGroupBJes => "JESCorrelationGroupbJES",
    JesCorrelationGroupFlavor => "JESCorrelationGroupFlavor",
    JesCorrelationGroupUncorrelated => "JESCorrelationGroupUncorrelated",
    Btag => "BTAG",
    BtagPt => "BTAGPT",
    BtagEta => "BTAGETA",
    BtagLjet => "BTAGLJET",
    BtagLjetPt => "BTAGLJETPT",
    BtagLjetEta => "BTAGLJETETA",
    BtagDiscrBstat1 => "BTAGDISCR_BSTAT1",
    BtagDiscrBstat2 => "BTAGDISCR_BSTAT2",
    BtagDiscrLstat1 => "BTAGDISCR_LSTAT1",
    BtagDiscrLstat2 => "BTAGDISCR_LSTAT2",
    BtagDiscrBpurity => "BTAGDISCR_BPURITY",
    BtagDiscrLpurity => "BTAGDISCR_LPURITY",
    BtagDiscrCerr1 => "BTAGDISCR_CERR1",
    BtagDiscrCerr2 => "BTAGDISCR_CERR2",
    Kin => "KIN",
    Lumi => "LUMI",
    XsecTtbb => "XSEC_TTBB",
    XsecTtb => "XSEC_TTB",
    XsecTt2b => "XSEC_TT2B",
    XsecTtcc => "XSEC_TTCC",
    XsecTtother => "XSEC_TTOTHER",
    XsecTtz => "XSEC_TTZ",
    XsecTtw => "XSEC_TTW",
    XsecTtg => "XSEC_TTG",
    XsecTth => "XSEC_TTH",
    XsecTt => "XSEC_TT",
    XsecT => "XSEC_T",
    XsecV => "XSEC_V",
    XsecVv => "XSEC_VV",
    TopPt => "TOP_PT",
    Mass => "MASS",
    Match => "MATCH",
    MatchTtbb => "MATCH_TTBB",
    MatchTt2b => "MATCH_TT2B",
    MatchTtb => "MATCH_TTB",
    MatchTtcc => "MATCH_TTCC",
    MatchTtother => "MATCH_TTOTHER",
    Powheg => "POWHEG",
    PowhegHerwig => "POWHEGHERWIG",
    Mcatnlo => "MCATNLO",
    Perugia11 => "PERUGIA11",
    Perugia11NoCr => "PERUGIA11NoCR",
    NormPdfGg => "NORMPDFGG",
    NormPdfGq => "NORMPDFGQ",
    NormPdfQq => "NORMPDFQQ",
    NormPdfTth => "NORMPDFTTH",
    Scale => "SCALE",
    ScaleTtbb => "SCALE_TTBB",
    ScaleTtb => "SCALE_TTB",
    ScaleTt2b => "SCALE_TT2B",
    ScaleTtcc => "SCALE_TTCC",
    ScaleTtother => "SCALE_TTOTHER",
    MeScale => "MESCALE",
    MeScaleTtbb => "MESCALE_TTBB",
    MeScaleTtb => "MESCALE_TTB",
    MeScaleTt2b => "MESCALE_TT2B",
    MeScaleTtcc => "MESCALE_TTCC",
    MeScaleTtother => "MESCALE_TTOTHER",
    MeFacScale => "MEFACSCALE",
    MeRenScale => "MERENSCALE",
    PsScale => "PSSCALE",
    PsScaleTtbb => "PSSCALE_TTBB",
    PsScaleTtb => "PSSCALE_TTB",
    PsScaleTt2b => "PSSCALE_TT2B",
    PsScaleTtcc => "PSSCALE_TTCC",
    PsScaleTtother => "PSSCALE_TTOTHER",
    PsIsrScale => "PSISRSCALE",
    PsIsrScaleTtbb => "PSISRSCALE_TTBB",
    PsIsrScaleTt2b => "PSISRSCALE_TT2B",
    PsIsrScaleTtb => "PSISRSCALE_TTB",
    PsIsrScaleTtcc => "PSISRSCALE_TTCC",
    PsIsrScaleTtother => "PSISRSCALE_TTOTHER",
    PsFsrScale => "PSFSRSCALE",
    PsFsrScaleTtbb => "PSFSRSCALE_TTBB",
    PsFsrScaleTt2b => "PSFSRSCALE_TT2B",
    PsFsrScaleTtb => "PSFSRSCALE_TTB",
    PsFsrScaleTtcc => "PSFSRSCALE_TTCC",
    PsFsrScaleTtother => "PSFSRSCALE_TTOTHER",
    UeTune => "UETUNE",
    UeTuneTtbb => "UETUNE_TTBB",
    UeTuneTt2b => "UETUNE_TT2B",
    UeTuneTtb => "UETUNE_TTB",
    UeTuneTtcc => "UETUNE_TTCC",
    UeTuneTtother => "UETUNE_TTOTHER",
    Pdf => "PDF",
}

impl SystematicType {
    /// Look up a type by its internal name (case-sensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Selector entries (`Nominal`, `all`, `allAvailable`) rather than real sources.
    pub fn is_meta(self) -> bool {
        matches!(self, SystematicType::Nominal | SystematicType::All | SystematicType::AllAvailable)
    }

    /// Every real uncertainty source, in declaration order.
    pub fn analysis_types() -> impl Iterator<Item = SystematicType> {
        Self::ALL.iter().copied().filter(|t| !t.is_meta())
    }
}

impl fmt::Display for SystematicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction of a systematic shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variation {
    /// +1 sigma
    Up,
    /// -1 sigma
    Down,
    /// Central replica (no direction)
    Central,
    /// No variation attached (nominal, or a neutral base name)
    Undefined,
}

impl Variation {
    /// Name suffix appended after the type name.
    pub fn suffix(self) -> &'static str {
        match self {
            Variation::Up => "_UP",
            Variation::Down => "_DOWN",
            Variation::Central => "_CENTRAL",
            Variation::Undefined => "",
        }
    }
}

/// One systematic variation: a source type plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Systematic {
    kind: SystematicType,
    variation: Variation,
    variation_number: Option<u32>,
}

impl Systematic {
    /// Create a systematic without a variation number.
    pub fn new(kind: SystematicType, variation: Variation) -> Self {
        Self { kind, variation, variation_number: None }
    }

    /// Attach a component number (multi-replica sources such as PDF sets).
    pub fn with_number(mut self, n: u32) -> Self {
        self.variation_number = Some(n);
        self
    }

    /// The nominal (unvaried) configuration.
    pub fn nominal() -> Self {
        Self::new(SystematicType::Nominal, Variation::Undefined)
    }

    /// Up variation of `kind`.
    pub fn up(kind: SystematicType) -> Self {
        Self::new(kind, Variation::Up)
    }

    /// Down variation of `kind`.
    pub fn down(kind: SystematicType) -> Self {
        Self::new(kind, Variation::Down)
    }

    /// Source type.
    pub fn kind(&self) -> SystematicType {
        self.kind
    }

    /// Shift direction.
    pub fn variation(&self) -> Variation {
        self.variation
    }

    /// Optional component number.
    pub fn variation_number(&self) -> Option<u32> {
        self.variation_number
    }

    /// Whether this is the nominal configuration.
    pub fn is_nominal(&self) -> bool {
        self.kind == SystematicType::Nominal
    }

    /// Same source and number with the given direction.
    pub fn with_variation(&self, variation: Variation) -> Self {
        Self { variation, ..*self }
    }

    /// Full name, e.g. `JES_UP`, `PDF_3_DOWN`, `Nominal`.
    pub fn name(&self) -> String {
        let mut s = String::from(self.kind.name());
        if let Some(n) = self.variation_number {
            s.push('_');
            s.push_str(&n.to_string());
        }
        s.push_str(self.variation.suffix());
        s
    }

    /// Name with the direction stripped (`JES_UP` -> `JES`).
    pub fn base_name(&self) -> String {
        self.with_variation(Variation::Undefined).name()
    }

    /// Parse a name produced by [`Systematic::name`].
    pub fn from_name(name: &str) -> Result<Self> {
        let (rest, variation) = if let Some(r) = name.strip_suffix("_UP") {
            (r, Variation::Up)
        } else if let Some(r) = name.strip_suffix("_DOWN") {
            (r, Variation::Down)
        } else if let Some(r) = name.strip_suffix("_CENTRAL") {
            (r, Variation::Central)
        } else {
            (name, Variation::Undefined)
        };

        if let Some(kind) = SystematicType::from_name(rest) {
            return Ok(Self::new(kind, variation));
        }
        if let Some((head, number)) = rest.rsplit_once('_')
            && let Ok(n) = number.parse::<u32>()
            && let Some(kind) = SystematicType::from_name(head)
        {
            return Ok(Self::new(kind, variation).with_number(n));
        }
        Err(Error::Validation(format!("unknown systematic '{}'", name)))
    }
}

impl fmt::Display for Systematic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Systematic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Lepton-flavour analysis channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    /// Two electrons
    Ee,
    /// Electron + muon
    Emu,
    /// Two muons
    Mumu,
    /// Sum of the three flavour channels
    Combined,
}

impl Channel {
    /// Channels available for datacard production.
    pub const ALL: [Channel; 4] = [Channel::Ee, Channel::Emu, Channel::Mumu, Channel::Combined];

    /// Short name used in file-list names and output directories.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Ee => "ee",
            Channel::Emu => "emu",
            Channel::Mumu => "mumu",
            Channel::Combined => "combined",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Channel::ALL.iter().copied().find(|c| c.name() == s).ok_or_else(|| {
            Error::Validation(format!("unknown channel '{}' (valid: ee, emu, mumu, combined)", s))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_type_number_variation_order() {
        assert_eq!(Systematic::up(SystematicType::Jes).name(), "JES_UP");
        assert_eq!(Systematic::down(SystematicType::BtagDiscrBpurity).name(), "BTAGDISCR_BPURITY_DOWN");
        assert_eq!(Systematic::nominal().name(), "Nominal");
        assert_eq!(Systematic::down(SystematicType::Pdf).with_number(3).name(), "PDF_3_DOWN");
        assert_eq!(Systematic::up(SystematicType::XsecTtbb).base_name(), "XSEC_TTBB");
    }

    #[test]
    fn parse_accepts_generated_names() {
        for name in ["JES_UP", "LUMI_DOWN", "Nominal", "JESAbsoluteStat_UP", "XSEC_TT2B_DOWN", "PDF_7_CENTRAL"] {
            let s = Systematic::from_name(name).unwrap();
            assert_eq!(s.name(), name);
        }
        let bare = Systematic::from_name("MATCH_TTOTHER").unwrap();
        assert_eq!(bare.kind(), SystematicType::MatchTtother);
        assert_eq!(bare.variation(), Variation::Undefined);
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert!(Systematic::from_name("NOT_A_SOURCE_UP").is_err());
        assert!(Systematic::from_name("jes_UP").is_err());
    }

    #[test]
    fn type_names_are_unique() {
        let mut names: Vec<&str> = SystematicType::ALL.iter().map(|t| t.name()).collect();
        let n = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), n, "duplicate systematic type name");
        assert!(SystematicType::analysis_types().all(|t| !t.is_meta()));
    }

    #[test]
    fn channel_round_trip_and_rejects_unknown() {
        for ch in Channel::ALL {
            assert_eq!(ch.name().parse::<Channel>().unwrap(), ch);
        }
        assert!("tautau".parse::<Channel>().is_err());
    }
}
