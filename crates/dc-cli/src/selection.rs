//! Expansion of `--systematic` arguments into concrete variations.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use dc_card::{Taxonomy, UncertaintyKind, available_systematics};
use dc_core::{Channel, Systematic, SystematicType, Variation};

fn up_down(kind: SystematicType) -> [Systematic; 2] {
    [Systematic::up(kind), Systematic::down(kind)]
}

/// Nominal first, then the requested variations in argument order.
pub fn expand_systematics(
    requested: &[String],
    file_lists_dir: &Path,
    channels: &[Channel],
    taxonomy: &Taxonomy,
) -> Result<Vec<Systematic>> {
    let mut out = vec![Systematic::nominal()];
    for arg in requested {
        match arg.as_str() {
            "nominal" | "Nominal" => {}
            "all" => out.extend(SystematicType::analysis_types().flat_map(up_down)),
            "allAvailable" => {
                out.extend(
                    SystematicType::analysis_types()
                        .filter(|t| taxonomy.kind_of(t.name()) == Some(UncertaintyKind::Rate))
                        .flat_map(up_down),
                );
                let found = available_systematics(file_lists_dir, channels)
                    .with_context(|| format!("scanning {}", file_lists_dir.display()))?;
                out.extend(found);
            }
            name => {
                let Ok(s) = Systematic::from_name(name) else {
                    bail!("unknown systematic '{}'", name);
                };
                if s.kind().is_meta() && !s.is_nominal() {
                    bail!("'{}' cannot be combined with a variation", name);
                }
                if s.variation() == Variation::Undefined && !s.is_nominal() {
                    out.extend([s.with_variation(Variation::Up), s.with_variation(Variation::Down)]);
                } else {
                    out.push(s);
                }
            }
        }
    }
    let mut seen = BTreeSet::new();
    out.retain(|s| seen.insert(*s));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(args: &[&str]) -> Result<Vec<Systematic>> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        expand_systematics(&args, Path::new("/nonexistent"), &Channel::ALL, &Taxonomy::standard())
    }

    #[test]
    fn default_is_nominal_only() {
        assert_eq!(expand(&[]).unwrap(), vec![Systematic::nominal()]);
        assert_eq!(expand(&["nominal"]).unwrap(), vec![Systematic::nominal()]);
    }

    #[test]
    fn bare_type_means_up_and_down() {
        let got = expand(&["JES", "LUMI_DOWN"]).unwrap();
        let names: Vec<String> = got.iter().map(Systematic::name).collect();
        assert_eq!(names, ["Nominal", "JES_UP", "JES_DOWN", "LUMI_DOWN"]);
    }

    #[test]
    fn all_covers_every_analysis_type() {
        let got = expand(&["all"]).unwrap();
        assert_eq!(got.len(), 1 + 2 * SystematicType::analysis_types().count());
        assert!(got.contains(&Systematic::down(SystematicType::XsecTtbb)));
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(expand(&["NOT_A_SYSTEMATIC"]).is_err());
    }

    #[test]
    fn all_available_scans_file_lists() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("dc_cli_sel_{}_{}", std::process::id(), nanos));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["Nominal_emu", "JER_UP_emu", "JER_DOWN_emu", "PU_UP_ee", "BOGUS_UP_emu"] {
            std::fs::write(dir.join(format!("HistoFileList_{}.txt", name)), "").unwrap();
        }
        let got = expand_systematics(
            &["allAvailable".to_string()],
            &dir,
            &[Channel::Emu],
            &Taxonomy::standard(),
        )
        .unwrap();
        assert!(got.contains(&Systematic::up(SystematicType::Jer)));
        assert!(got.contains(&Systematic::down(SystematicType::Jer)));
        assert!(got.contains(&Systematic::up(SystematicType::Lumi)));
        assert!(!got.contains(&Systematic::up(SystematicType::Pu)));
        assert_eq!(got[0], Systematic::nominal());
        std::fs::remove_dir_all(&dir).ok();
    }
}
