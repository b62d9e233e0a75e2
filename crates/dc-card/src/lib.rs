//! # dc-card
//!
//! Datacard generation engine.
//!
//! For every analysis category and channel this crate reads the nominal and
//! varied per-category source containers, writes the histograms a fit needs
//! into the channel archive, and emits the text datacard:
//!
//! 1. header and `shapes` pointer
//! 2. observation / process / rate block
//! 3. one row per recognized shape or rate systematic
//! 4. bin-by-bin MC-statistical shape rows
//!
//! The taxonomy, naming and value tables are built once and never mutated.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod archive;
pub mod config;
pub mod filelist;
pub mod maker;
pub mod mcstat;
pub mod naming;
pub mod taxonomy;
pub mod values;
pub mod writer;

pub use aggregate::{ExtractedHistograms, NominalSums, ProcessYield, Yields, extract_histograms};
pub use archive::{ArchiveSink, LABEL_RECORD_NAME};
pub use config::{AnalysisConfig, GroupConfig, HistogramEntry, read_analysis_config};
pub use filelist::{InputFileIndex, available_systematics, file_list_path};
pub use maker::{DatacardMaker, RunSummary};
pub use mcstat::{CONTENT_FLOOR, McStatNuisance, PruningInputs, Shift, should_prune};
pub use naming::NamingRegistry;
pub use taxonomy::{Taxonomy, UncertaintyKind};
pub use values::{Scope, UncertaintyTable};
pub use writer::{DatacardWriter, Stage};
