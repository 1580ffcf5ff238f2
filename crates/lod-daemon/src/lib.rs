//! LOD API command-line library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (aggs, correlate, explore, topics, entities)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, SubjectArgs};
pub use commands::{execute, init_logging, load_settings, read_template, run};
