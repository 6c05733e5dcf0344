// Allow large errors because diagnostics carry labels for every problem.
#![allow(clippy::result_large_err)]

//! Command line front end for QuickSFC.

pub mod cli;
pub mod logger;
pub mod source;
