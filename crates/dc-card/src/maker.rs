//! DatacardMaker: runs the whole chain for every selected category and channel.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use dc_core::{Channel, Error, Result, Systematic, SystematicType};
use dc_hist::{HistFile, Histogram};

use crate::aggregate::{ExtractedHistograms, NominalSums, Yields, extract_histograms};
use crate::archive::{ArchiveSink, LABEL_RECORD_NAME};
use crate::config::{AnalysisConfig, HistogramEntry, filter_processes};
use crate::filelist::InputFileIndex;
use crate::mcstat::{McStatContext, synthesize};
use crate::naming::{NamingRegistry, is_pseudo_process};
use crate::taxonomy::Taxonomy;
use crate::values::UncertaintyTable;
use crate::writer::DatacardWriter;

/// What a run produced, plus the things it had to skip.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Datacards written, in production order.
    pub datacards: Vec<PathBuf>,
    /// Archives written.
    pub archives: Vec<PathBuf>,
    /// Systematic-table rows over all datacards.
    pub systematic_rows: usize,
    /// MC-stat rows over all datacards.
    pub mc_stat_rows: usize,
    /// Base name -> number of datacards it was left out of (not in the taxonomy).
    pub skipped_unknown: BTreeMap<String, usize>,
    /// `<channel>/<histogram name>` entries that were expected but absent.
    pub missing_histograms: Vec<String>,
    /// Varied source containers that could not be found or opened.
    pub missing_sources: Vec<String>,
}

/// Builder and driver for datacard production.
///
/// # Example
///
/// ```no_run
/// use dc_card::{DatacardMaker, read_analysis_config};
/// use dc_core::{Channel, Systematic, SystematicType};
///
/// let config = read_analysis_config("data/HistoList_datacards.yaml".as_ref()).unwrap();
/// let summary = DatacardMaker::new(config)
///     .file_lists_dir("FileLists_plot_systematic_mvaEventA")
///     .channels([Channel::Emu])
///     .systematics([Systematic::up(SystematicType::Lumi), Systematic::down(SystematicType::Lumi)])
///     .run()
///     .unwrap();
/// println!("{} datacards", summary.datacards.len());
/// ```
pub struct DatacardMaker {
    config: AnalysisConfig,
    file_lists_dir: PathBuf,
    channels: Vec<Channel>,
    systematics: Vec<Systematic>,
    patterns: Vec<String>,
    taxonomy: Taxonomy,
    naming: NamingRegistry,
    values: UncertaintyTable,
}

impl DatacardMaker {
    /// Create a maker for `config` with all channels and only the nominal.
    pub fn new(config: AnalysisConfig) -> Self {
        let values = UncertaintyTable::standard(config.luminosity_uncertainty);
        Self {
            config,
            file_lists_dir: PathBuf::from("."),
            channels: Channel::ALL.to_vec(),
            systematics: Vec::new(),
            patterns: Vec::new(),
            taxonomy: Taxonomy::standard(),
            naming: NamingRegistry::standard(),
            values,
        }
    }

    /// Directory holding the `HistoFileList_*.txt` files.
    pub fn file_lists_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.file_lists_dir = dir.into();
        self
    }

    /// Channels to produce.
    pub fn channels(mut self, channels: impl IntoIterator<Item = Channel>) -> Self {
        self.channels = channels.into_iter().collect();
        self
    }

    /// Systematics to include. The nominal is always added.
    pub fn systematics(mut self, systematics: impl IntoIterator<Item = Systematic>) -> Self {
        self.systematics = systematics.into_iter().collect();
        self
    }

    /// Histogram-entry selection patterns (see [`AnalysisConfig::select_histograms`]).
    pub fn histogram_patterns(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Override the output root.
    pub fn output_base_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.output_base_dir = dir.into();
        self
    }

    /// Toggle the systematic table.
    pub fn include_systematics(mut self, on: bool) -> Self {
        self.config.include_systematics = on;
        self
    }

    /// Toggle the MC-stat rows.
    pub fn include_statistical(mut self, on: bool) -> Self {
        self.config.include_statistical = on;
        self
    }

    /// Toggle MC-stat pruning.
    pub fn prune_bin_by_bin(mut self, on: bool) -> Self {
        self.config.prune_bin_by_bin = on;
        self
    }

    /// Replace the value table (e.g. for a different jet-multiplicity set).
    pub fn uncertainty_table(mut self, values: UncertaintyTable) -> Self {
        self.values = values;
        self
    }

    /// Configuration in effect.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Nominal first, then the requested systematics without duplicates or
    /// selector entries.
    pub fn requested_systematics(&self) -> Vec<Systematic> {
        let mut seen = BTreeSet::new();
        std::iter::once(Systematic::nominal())
            .chain(self.systematics.iter().copied())
            .filter(|s| !(s.kind().is_meta() && s.kind() != SystematicType::Nominal))
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// Produce every datacard and archive.
    pub fn run(&self) -> Result<RunSummary> {
        let systematics = self.requested_systematics();
        let entries = self.config.select_histograms(&self.patterns);
        if entries.is_empty() {
            log::warn!("no histogram entry matches the selection");
        }

        let mut summary = RunSummary::default();
        let mut sink = ArchiveSink::new();
        for entry in &entries {
            let category_label = self.naming.category_label(&entry.name)?;
            let processes = filter_processes(&entry.processes, &self.naming);
            self.naming.check_distinct_labels(&processes)?;
            let index = InputFileIndex::discover(
                &self.file_lists_dir,
                &self.channels,
                &systematics,
                &entry.name,
                &self.taxonomy,
            )?;
            for &channel in &self.channels {
                let category = Category { entry, label: category_label, processes: &processes, channel };
                self.write_category(&category, &systematics, &index, &mut sink, &mut summary)?;
            }
        }
        summary.archives = sink.archives();
        Ok(summary)
    }

    fn channel_dir(&self, channel: Channel) -> PathBuf {
        Path::new(&self.config.output_base_dir).join(channel.name())
    }

    fn write_category(
        &self,
        cat: &Category<'_>,
        systematics: &[Systematic],
        index: &InputFileIndex,
        sink: &mut ArchiveSink,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let channel_dir = self.channel_dir(cat.channel);
        fs::create_dir_all(&channel_dir)?;
        let archive = channel_dir.join(&self.config.archive_file_name);
        let directory = format!("{}_{}", cat.label, self.config.observable_type);

        sink.write_text(&archive, &directory, LABEL_RECORD_NAME, &self.taxonomy.label_record())?;

        let source_name = format!("{}{}", cat.entry.name, self.config.source_suffix);
        let nominal = index.lookup(cat.channel, &Systematic::nominal(), &source_name).ok_or_else(|| {
            Error::MissingInput(format!(
                "no nominal source '{}' listed for channel {}",
                source_name, cat.channel
            ))
        })?;
        let source = HistFile::open(nominal)
            .map_err(|e| Error::MissingInput(format!("{}: {}", nominal.display(), e)))?;
        let extracted = extract_histograms(&source, &cat.entry.name, cat.processes)?;
        record_missing(summary, cat, &extracted);

        let nominal_histograms: Vec<Histogram> =
            extracted.histograms.iter().map(|(p, h)| h.renamed(self.process_label(p))).collect();
        sink.write_histograms(&archive, &directory, &nominal_histograms)?;

        for systematic in systematics.iter().filter(|s| !s.is_nominal() && !self.taxonomy.is_rate(s)) {
            self.write_varied(cat, systematic, index, &source_name, &archive, &directory, sink, summary)?;
        }

        let card_path = channel_dir.join(format!("{}{}.txt", self.config.datacard_prefix, cat.label));
        let mut card = DatacardWriter::create(&card_path)?;
        card.write_header(&self.config.archive_file_name, &self.config.observable_type)?;
        let yields = Yields::compute(&extracted, cat.processes, &self.naming, &self.config.signal_model);
        card.write_yields(cat.label, &yields)?;

        if self.config.include_systematics {
            self.write_systematic_table(&mut card, &yields, systematics, summary)?;
        }

        if self.config.include_statistical {
            let sums = NominalSums::compute(&extracted, cat.processes, &self.config.signal_model)?;
            let ctx = McStatContext {
                category_label: cat.label,
                observable: &self.config.observable_type,
                prune: self.config.prune_bin_by_bin,
            };
            let nuisances = synthesize(&extracted, &sums, cat.processes, &self.naming, ctx)?;
            let columns = yields.processes();
            for n in &nuisances {
                card.write_mc_stat_row(&n.name, &n.row_values(columns.iter().copied()))?;
            }
            sink.write_histograms(&archive, &directory, nuisances.iter().flat_map(|n| n.histograms()))?;
            summary.mc_stat_rows += nuisances.len();
        }

        if !self.config.systematic_groups.is_empty() {
            card.write_groups(&self.config.systematic_groups)?;
        }

        let written = card.finish()?;
        log::debug!("wrote datacard {}", written.display());
        summary.datacards.push(written);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn write_varied(
        &self,
        cat: &Category<'_>,
        systematic: &Systematic,
        index: &InputFileIndex,
        source_name: &str,
        archive: &Path,
        directory: &str,
        sink: &mut ArchiveSink,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let name = systematic.name();
        let Some(sys_label) = self.taxonomy.label_of(&name) else {
            log::debug!("no external label for '{}', not archiving its shapes", name);
            return Ok(());
        };
        let source = match index.lookup(cat.channel, systematic, source_name) {
            Some(path) => HistFile::open(path).map_err(|e| format!("{}: {}", path.display(), e)),
            None => Err(format!("'{}' not listed for {} in channel {}", source_name, name, cat.channel)),
        };
        let source = match source {
            Ok(s) => s,
            Err(msg) => {
                log::warn!("skipping {} shapes: {}", name, msg);
                summary.missing_sources.push(msg);
                return Ok(());
            }
        };
        let extracted = extract_histograms(&source, &cat.entry.name, cat.processes)?;
        record_missing(summary, cat, &extracted);
        let varied: Vec<Histogram> = extracted
            .histograms
            .iter()
            .filter(|(p, _)| !is_pseudo_process(p))
            .map(|(p, h)| h.renamed(format!("{}_{}", self.process_label(p), sys_label)))
            .collect();
        sink.write_histograms(archive, directory, &varied)?;
        Ok(())
    }

    fn write_systematic_table(
        &self,
        card: &mut DatacardWriter,
        yields: &Yields,
        systematics: &[Systematic],
        summary: &mut RunSummary,
    ) -> Result<()> {
        let mut seen = BTreeSet::new();
        for systematic in systematics.iter().filter(|s| !s.is_nominal()) {
            let base = systematic.base_name();
            if !seen.insert(base.clone()) {
                continue;
            }
            let (Some(kind), Some(label)) = (self.taxonomy.kind_of(&base), self.taxonomy.row_label(&base)) else {
                log::warn!("systematic '{}' is not in the taxonomy, no row written", base);
                *summary.skipped_unknown.entry(base).or_default() += 1;
                continue;
            };
            let values: Vec<Option<&str>> =
                yields.rates.iter().map(|r| self.values.value_for(&base, &r.process)).collect();
            card.write_systematic_row(label, kind, &values)?;
            summary.systematic_rows += 1;
        }
        Ok(())
    }

    fn process_label<'a>(&self, process: &'a str) -> &'a str {
        self.naming.process_label(process).unwrap_or(process)
    }
}

struct Category<'a> {
    entry: &'a HistogramEntry,
    label: &'a str,
    processes: &'a [String],
    channel: Channel,
}

fn record_missing(summary: &mut RunSummary, cat: &Category<'_>, extracted: &ExtractedHistograms) {
    summary
        .missing_histograms
        .extend(extracted.missing.iter().map(|p| format!("{}/{}_{}", cat.channel, cat.entry.name, p)));
}
