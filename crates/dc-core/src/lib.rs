//! # dc-core
//!
//! Shared foundation for the datacard maker crates: the error type and the
//! systematic / variation / channel model every other crate keys on.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Channel, Systematic, SystematicType, Variation};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
