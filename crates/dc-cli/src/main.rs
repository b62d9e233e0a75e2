//! datacard CLI

mod selection;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use dc_card::{DatacardMaker, Taxonomy, read_analysis_config};
use dc_core::Channel;

#[derive(Parser)]
#[command(name = "datacard")]
#[command(about = "Produce datacards and shape archives for the dilepton ttH(bb) analysis")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    /// Config tag: reads <data-dir>/HistoList_<TAG>.yaml
    #[arg(short = 't', long, default_value = "datacards")]
    config_tag: String,

    /// Explicit analysis config (YAML, or JSON by extension); overrides --config-tag
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding HistoList_<TAG>.yaml
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// File-list tag: reads FileLists_plot_systematic_<TAG>
    #[arg(short = 'l', long, default_value = "Plots_selectionRoot_mvaEventA")]
    file_lists: String,

    /// Directory containing the FileLists_plot_systematic_* directories
    #[arg(long, default_value = ".")]
    file_lists_root: PathBuf,

    /// Histogram entries to process (case-insensitive substring; +NAME for exact)
    #[arg(short, long, num_args = 1..)]
    plot: Vec<String>,

    /// Channels to produce (ee, emu, mumu, combined)
    #[arg(short, long, num_args = 1.., default_values_t = Channel::ALL.to_vec())]
    channel: Vec<Channel>,

    /// Systematics: nominal, all, allAvailable, or names such as JES_UP or JES
    #[arg(short, long, num_args = 1..)]
    systematic: Vec<String>,

    /// Include bin-by-bin MC statistical rows
    #[arg(long, action = clap::ArgAction::Set)]
    stat: Option<bool>,

    /// Include the systematic table
    #[arg(long, action = clap::ArgAction::Set)]
    sys: Option<bool>,

    /// Prune statistically insignificant MC-stat bins
    #[arg(long)]
    prune: bool,

    /// Output base directory (overrides the config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_status(&err))
        }
    }
}

/// 12 for configuration errors, 1 for missing required input, 2 otherwise.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.chain().find_map(|e| e.downcast_ref::<dc_core::Error>()) {
        Some(dc_core::Error::Config(_)) => 12,
        Some(dc_core::Error::MissingInput(_)) => 1,
        _ => 2,
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.data_dir.join(format!("HistoList_{}.yaml", cli.config_tag)));
    tracing::info!(path = %config_path.display(), "loading analysis config");
    let config = read_analysis_config(&config_path)?;

    let file_lists_dir = cli.file_lists_root.join(format!("FileLists_plot_systematic_{}", cli.file_lists));
    let systematics =
        selection::expand_systematics(&cli.systematic, &file_lists_dir, &cli.channel, &Taxonomy::standard())
            .context("selecting systematics")?;
    tracing::info!(
        file_lists = %file_lists_dir.display(),
        channels = cli.channel.len(),
        systematics = systematics.len(),
        "starting datacard production"
    );

    let mut maker = DatacardMaker::new(config)
        .file_lists_dir(&file_lists_dir)
        .channels(cli.channel.iter().copied())
        .systematics(systematics)
        .histogram_patterns(cli.plot.iter().cloned());
    if let Some(dir) = &cli.output_dir {
        maker = maker.output_base_dir(dir.to_string_lossy());
    }
    if let Some(on) = cli.stat {
        maker = maker.include_statistical(on);
    }
    if let Some(on) = cli.sys {
        maker = maker.include_systematics(on);
    }
    if cli.prune {
        maker = maker.prune_bin_by_bin(true);
    }

    let summary = maker.run()?;

    for path in &summary.datacards {
        tracing::info!(path = %path.display(), "wrote datacard");
    }
    for (base, n) in &summary.skipped_unknown {
        tracing::warn!(systematic = %base, datacards = n, "systematic not in taxonomy, skipped");
    }
    for missing in &summary.missing_sources {
        tracing::warn!(source = %missing, "varied source skipped");
    }
    tracing::info!(
        datacards = summary.datacards.len(),
        archives = summary.archives.len(),
        systematic_rows = summary.systematic_rows,
        mc_stat_rows = summary.mc_stat_rows,
        missing_histograms = summary.missing_histograms.len(),
        "done"
    );
    Ok(())
}
