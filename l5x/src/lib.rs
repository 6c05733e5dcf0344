// Allow large errors because diagnostics carry labels for every problem.
#![allow(clippy::result_large_err)]

//! Export of a chart as an L5X (Logix 5000) program with one SFC routine.
//!
//! Export validates the chart, synthesizes junctions from its topology,
//! assigns positions and then writes the XML document.

mod error;
mod exporter;
mod ids;
mod layout;
pub mod options;
mod validate;
mod writer;

#[cfg(test)]
mod test_helpers;

pub use error::L5xError;
pub use exporter::L5xExporter;
pub use options::ExportOptions;
pub use validate::validate;
