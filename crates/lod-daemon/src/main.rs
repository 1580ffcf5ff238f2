//! LOD API exploration tool
//!
//! # Usage
//!
//! ```bash
//! lod-api aggs --subject Dresden --subject Elbe [--restriction TEXT] [--author NAME] [--template FILE]
//! lod-api correlate --subject Dresden --subject Elbe
//! lod-api explore --subject Dresden --subject Elbe
//! lod-api topics Dresden [--size 15]
//! lod-api entities https://data.slub-dresden.de/persons/118540238
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/lod-api/config.toml)
//! 3. Environment variables (LOD_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use lod_daemon::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    run(Cli::parse()).await
}
