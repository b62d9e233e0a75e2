//! Per-(systematic, channel) input file lists.
//!
//! Each list is a text file `HistoFileList_<NAME>_<channel>.txt` with one
//! source-container path per line. Lines are indexed by basename so the
//! aggregation stage can find the container of a plot quickly.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use dc_core::{Channel, Error, Result, Systematic, SystematicType, Variation};

use crate::taxonomy::Taxonomy;

const LIST_PREFIX: &str = "HistoFileList_";
const LIST_SUFFIX: &str = ".txt";

/// Per-component scale variations share one up/down list pair with their
/// inclusive source.
const SHARED_LISTS: &[(SystematicType, &str)] = &[
    (SystematicType::ScaleTtb, "SCALE"),
    (SystematicType::ScaleTtbb, "SCALE"),
    (SystematicType::ScaleTt2b, "SCALE"),
    (SystematicType::ScaleTtcc, "SCALE"),
    (SystematicType::ScaleTtother, "SCALE"),
    (SystematicType::MeScaleTtb, "MESCALE"),
    (SystematicType::MeScaleTtbb, "MESCALE"),
    (SystematicType::MeScaleTt2b, "MESCALE"),
    (SystematicType::MeScaleTtcc, "MESCALE"),
    (SystematicType::MeScaleTtother, "MESCALE"),
    (SystematicType::PsScaleTtb, "PSSCALE"),
    (SystematicType::PsScaleTtbb, "PSSCALE"),
    (SystematicType::PsScaleTt2b, "PSSCALE"),
    (SystematicType::PsScaleTtcc, "PSSCALE"),
    (SystematicType::PsScaleTtother, "PSSCALE"),
];

/// Name under which the file list of `systematic` is stored.
pub fn list_name(systematic: &Systematic) -> String {
    match SHARED_LISTS.iter().find(|(t, _)| *t == systematic.kind()) {
        Some((_, shared)) => {
            let direction = if systematic.variation() == Variation::Up { "UP" } else { "DOWN" };
            format!("{}_{}", shared, direction)
        }
        None => systematic.name(),
    }
}

/// Path of the file list for (`systematic`, `channel`) under `dir`.
pub fn file_list_path(dir: &Path, systematic: &Systematic, channel: Channel) -> PathBuf {
    dir.join(format!("{}{}_{}{}", LIST_PREFIX, list_name(systematic), channel.name(), LIST_SUFFIX))
}

fn basename(line: &str) -> &str {
    line.rsplit(['/', '\\']).next().unwrap_or(line)
}

/// channel -> systematic -> basename -> full path.
#[derive(Debug, Clone, Default)]
pub struct InputFileIndex {
    entries: BTreeMap<Channel, BTreeMap<Systematic, BTreeMap<String, PathBuf>>>,
}

impl InputFileIndex {
    /// Read the file lists of every (channel, systematic) pair, keeping lines
    /// whose basename contains `plot_name`.
    ///
    /// Rate-kind systematics are skipped without touching the filesystem.
    /// A missing list for any other systematic is [`Error::MissingInput`].
    pub fn discover(
        dir: &Path,
        channels: &[Channel],
        systematics: &[Systematic],
        plot_name: &str,
        taxonomy: &Taxonomy,
    ) -> Result<Self> {
        let mut index = Self::default();
        for &channel in channels {
            for systematic in systematics {
                if taxonomy.is_rate(systematic) {
                    continue;
                }
                let path = file_list_path(dir, systematic, channel);
                let text = fs::read_to_string(&path).map_err(|e| {
                    Error::MissingInput(format!("file list {}: {}", path.display(), e))
                })?;
                let files = index.entries.entry(channel).or_default().entry(*systematic).or_default();
                for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                    let name = basename(line);
                    if name.contains(plot_name) {
                        files.insert(name.to_string(), PathBuf::from(line));
                    }
                }
            }
        }
        Ok(index)
    }

    /// Record one entry directly.
    pub fn insert(&mut self, channel: Channel, systematic: Systematic, path: impl Into<PathBuf>) {
        let path = path.into();
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        self.entries.entry(channel).or_default().entry(systematic).or_default().insert(name, path);
    }

    /// Full path of `basename` for (`channel`, `systematic`).
    pub fn lookup(&self, channel: Channel, systematic: &Systematic, basename: &str) -> Option<&Path> {
        self.entries.get(&channel)?.get(systematic)?.get(basename).map(PathBuf::as_path)
    }

    /// Systematics indexed for a channel, in sorted order.
    pub fn systematics(&self, channel: Channel) -> Vec<Systematic> {
        self.entries.get(&channel).map(|m| m.keys().copied().collect()).unwrap_or_default()
    }

    /// Number of indexed paths over all channels and systematics.
    pub fn len(&self) -> usize {
        self.entries.values().flat_map(BTreeMap::values).map(BTreeMap::len).sum()
    }

    /// Whether nothing has been indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Systematics that have a file list in `dir` for at least one of `channels`.
///
/// Unparsable list names are ignored.
pub fn available_systematics(dir: &Path, channels: &[Channel]) -> Result<BTreeSet<Systematic>> {
    let mut found = BTreeSet::new();
    for entry in fs::read_dir(dir)? {
        let file_name = entry?.file_name();
        let file_name = file_name.to_string_lossy();
        let Some(stem) = file_name.strip_prefix(LIST_PREFIX).and_then(|s| s.strip_suffix(LIST_SUFFIX))
        else {
            continue;
        };
        for channel in channels {
            let Some(name) = stem.strip_suffix(channel.name()).and_then(|s| s.strip_suffix('_')) else {
                continue;
            };
            match Systematic::from_name(name) {
                Ok(s) => {
                    found.insert(s);
                }
                Err(_) => log::debug!("ignoring file list with unknown systematic '{}'", name),
            }
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_lists_for_component_scales() {
        assert_eq!(list_name(&Systematic::up(SystematicType::ScaleTtbb)), "SCALE_UP");
        assert_eq!(list_name(&Systematic::down(SystematicType::MeScaleTtother)), "MESCALE_DOWN");
        assert_eq!(list_name(&Systematic::up(SystematicType::PsScaleTtcc)), "PSSCALE_UP");
        assert_eq!(list_name(&Systematic::up(SystematicType::Jes)), "JES_UP");
        assert_eq!(list_name(&Systematic::nominal()), "Nominal");
    }

    #[test]
    fn list_path_layout() {
        let p = file_list_path(Path::new("lists"), &Systematic::down(SystematicType::Jer), Channel::Emu);
        assert_eq!(p, Path::new("lists/HistoFileList_JER_DOWN_emu.txt"));
    }

    #[test]
    fn basename_strips_directories() {
        assert_eq!(basename("a/b/c_source.dcar"), "c_source.dcar");
        assert_eq!(basename("c_source.dcar"), "c_source.dcar");
    }

    #[test]
    fn rate_systematics_need_no_list() {
        let dir = std::env::temp_dir().join("dc_card_filelist_no_such_dir");
        let idx = InputFileIndex::discover(
            &dir,
            &[Channel::Ee],
            &[Systematic::up(SystematicType::Lumi), Systematic::down(SystematicType::XsecTtbb)],
            "plot_cate0",
            &Taxonomy::standard(),
        )
        .unwrap();
        assert!(idx.is_empty());
    }

    #[test]
    fn missing_shape_list_is_missing_input() {
        let dir = std::env::temp_dir().join("dc_card_filelist_no_such_dir");
        let err = InputFileIndex::discover(
            &dir,
            &[Channel::Ee],
            &[Systematic::up(SystematicType::Jes)],
            "plot_cate0",
            &Taxonomy::standard(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)), "{:?}", err);
    }
}
