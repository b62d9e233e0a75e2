//! # dc-hist
//!
//! Binned histograms and the `dcar` histogram archive.
//!
//! An archive is an append-only sequence of keyed records, each holding one
//! serialized object (a 1D histogram or a text record) inside a named
//! directory. Re-writing a key appends a new cycle; readers resolve the
//! highest cycle.
//!
//! ## Example
//!
//! ```no_run
//! use dc_hist::{ArchiveWriter, HistFile, Histogram};
//!
//! let h = Histogram::uniform("ttH", 4, 0.0, 1.0);
//! let mut w = ArchiveWriter::create("shapes.dcar").unwrap();
//! w.write_histogram("ch1_BDT", &h).unwrap();
//! w.close().unwrap();
//!
//! let f = HistFile::open("shapes.dcar").unwrap();
//! let back = f.get_histogram("ch1_BDT/ttH").unwrap();
//! println!("bins: {}", back.n_bins);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compress;
pub mod directory;
pub mod error;
pub mod file;
pub mod histogram;
pub mod key;
pub mod objects;
pub mod rbuffer;
pub mod source;
pub mod wbuffer;
pub mod writer;

pub use error::{HistError, Result};
pub use file::HistFile;
pub use histogram::Histogram;
pub use key::KeyInfo;
pub use source::HistogramSource;
pub use writer::ArchiveWriter;

/// File extension used for archives.
pub const ARCHIVE_EXTENSION: &str = "dcar";
