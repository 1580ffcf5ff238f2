//! Command implementations.
//!
//! Every command builds its request, runs it through an
//! [`ExploreService`] and yields a JSON value for stdout.

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use lod_explore::ExploreService;
use lod_search::{ElasticBackend, ElasticConfig, SearchBackend};
use lod_types::{ExploreRequest, Settings, TopicSearchRequest};

use crate::cli::{Cli, Commands, SubjectArgs};

/// Load configuration and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    backend_url_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(url) = backend_url_override {
        settings.backend_url = url.to_string();
    }
    settings.validate().context("Invalid configuration")?;
    Ok(settings)
}

/// Install the global tracing subscriber. Logs go to stderr.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Read a query template file: a JSON object mapping method names to raw queries.
pub fn read_template(path: &str) -> Result<BTreeMap<String, Value>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read template file {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Template {path} is not a JSON object"))
}

fn explore_request(
    subjects: SubjectArgs,
    restriction: Option<String>,
    author: Option<String>,
) -> ExploreRequest {
    ExploreRequest {
        subjects: subjects.subjects,
        restriction,
        author_filter: author,
        size: subjects.size,
        query_template: None,
    }
}

/// Run one command against `service`.
pub async fn execute<B: SearchBackend + 'static>(
    service: &ExploreService<B>,
    command: Commands,
) -> Result<Value> {
    let output = match command {
        Commands::Aggs {
            subjects,
            restriction,
            author,
            template,
        } => {
            let mut request = explore_request(subjects, restriction, author);
            request.query_template = template.as_deref().map(read_template).transpose()?;
            serde_json::to_value(service.aggregate(&request).await?)?
        }
        Commands::Correlate { subjects } => {
            let request = explore_request(subjects, None, None);
            serde_json::to_value(service.correlate(&request).await?)?
        }
        Commands::Explore {
            subjects,
            restriction,
            author,
        } => {
            let request = explore_request(subjects, restriction, author);
            serde_json::to_value(service.explore(&request).await?)?
        }
        Commands::Topics { text, size, fields } => {
            let request = TopicSearchRequest { text, size, fields };
            serde_json::to_value(service.topic_search(&request).await?)?
        }
        Commands::Entities { uris } => {
            serde_json::to_value(service.resolve_entities(uris.as_slice()).await?)?
        }
    };
    Ok(output)
}

/// Entry point: configure, connect to the backend, run, print.
pub async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(
        cli.config.as_deref(),
        cli.log_level.as_deref(),
        cli.backend_url.as_deref(),
    )?;
    init_logging(&settings)?;

    info!(backend = %settings.backend_url, "Connecting to search backend");
    let backend = ElasticBackend::new(ElasticConfig::from_settings(&settings))
        .context("Failed to create search backend client")?;
    let service = ExploreService::new(Arc::new(backend), Arc::new(settings));

    let output = execute(&service, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
