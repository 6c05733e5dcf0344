//! Graph model for QuickSFC charts.
//!
//! The parser builds an [`graph::Sfc`] from source text. Later stages read
//! it to synthesize branch topology and to serialize the chart.

// Allow large errors because this is a compiler - we expect large errors.
#![allow(clippy::result_large_err)]

pub mod core;
pub mod diagnostic;
pub mod error;
pub mod graph;
pub mod json_export;
pub mod sfc;
