//! CLI argument parsing for the LOD exploration tool.
//!
//! Global flags override every other configuration source.

use clap::{Args, Parser, Subcommand};

/// LOD API topic exploration
///
/// Aggregates, correlates and resolves linked-data entities around a set of
/// subject topics. Results are printed as JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "lod-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/lod-api/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override the search backend URL
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subject selection shared by the aggregation commands.
#[derive(Args, Debug, Clone)]
pub struct SubjectArgs {
    /// Subject topic name (repeatable)
    #[arg(short, long = "subject", required = true)]
    pub subjects: Vec<String>,

    /// Number of top resources per subject
    #[arg(long)]
    pub size: Option<i64>,
}

/// Commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Per-method aggregations for the given subjects
    Aggs {
        #[command(flatten)]
        subjects: SubjectArgs,

        /// Phrase every matching resource must contain
        #[arg(short, long)]
        restriction: Option<String>,

        /// Restrict resources to this author or contributor
        #[arg(short, long)]
        author: Option<String>,

        /// JSON file with a raw query per method name
        #[arg(short, long)]
        template: Option<String>,
    },

    /// Pairwise co-occurrence of the given subjects
    Correlate {
        #[command(flatten)]
        subjects: SubjectArgs,
    },

    /// Aggregations, correlations and resolved entities
    Explore {
        #[command(flatten)]
        subjects: SubjectArgs,

        /// Phrase every matching resource must contain
        #[arg(short, long)]
        restriction: Option<String>,

        /// Restrict resources to this author or contributor
        #[arg(short, long)]
        author: Option<String>,
    },

    /// Search topics mentioned by at least one resource
    Topics {
        /// Query text
        text: String,

        /// Number of topics
        #[arg(short = 'n', long, default_value = "15")]
        size: i64,

        /// Fields to search (repeatable; configured defaults when omitted)
        #[arg(short, long = "field")]
        fields: Vec<String>,
    },

    /// Fetch entities by URI
    Entities {
        /// Entity URIs
        #[arg(required = true)]
        uris: Vec<String>,
    },
}
