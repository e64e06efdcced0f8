//! rigcheck command line: argument parsing, run driving, and report
//! rendering around the core pipeline.

pub mod cli;
pub mod render;
pub mod run;
