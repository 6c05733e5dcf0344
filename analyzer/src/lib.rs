// Allow large errors because diagnostics carry labels for every problem.
#![allow(clippy::result_large_err)]

//! Topology analysis of a parsed chart.
//!
//! The branches written in a document describe what the author meant. The
//! exported chart needs branches wherever the connectivity fans in or out,
//! which includes places created by jumps and shared steps. This crate
//! derives those junctions from the links alone and produces the directed
//! links that connect them.

mod link_graph;
mod provenance;
mod synthesize;
#[cfg(test)]
mod test_helpers;
pub mod topology;

pub use synthesize::synthesize;
pub use topology::{Junction, JunctionLeg, Topology};

#[cfg(test)]
#[ctor::ctor]
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
