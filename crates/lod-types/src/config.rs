//! Configuration loading for the LOD exploration API.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/lod-api/config.{toml,yaml,json}.
//!
//! Settings are handed to every component explicitly; nothing reads a
//! process-wide configuration object.

use std::collections::BTreeMap;
use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::LodError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the search backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Connection/request timeout against the backend, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Backend API key (usually supplied via LOD_API_KEY, not the config file)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Base of every entity URI, ending in '/'
    #[serde(default = "default_uri_prefix")]
    pub uri_prefix: String,

    /// Ceiling at which the backend stops counting hits exactly
    #[serde(default = "default_cap_limit")]
    pub cap_limit: u64,

    /// Index holding topic documents for topic search
    #[serde(default = "default_topics_index")]
    pub topics_index: String,

    /// Index holding resource documents for aggregations
    #[serde(default = "default_resources_index")]
    pub resources_index: String,

    /// Collection name -> backend index name
    #[serde(default = "default_indices")]
    pub indices: BTreeMap<String, String>,

    /// `_source` paths stripped from topic search hits
    #[serde(default)]
    pub source_excludes: Vec<String>,

    /// Fields searched by topic search
    #[serde(default = "default_topic_fields")]
    pub topic_fields: Vec<String>,

    /// Collections never fetched during entity resolution (prefix match)
    #[serde(default)]
    pub excluded_collections: Vec<String>,

    /// Resource field holding the ids of mentioned topics
    #[serde(default = "default_mention_field")]
    pub mention_field: String,
}

fn default_backend_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_uri_prefix() -> String {
    "https://data.slub-dresden.de/".to_string()
}

fn default_cap_limit() -> u64 {
    10_000
}

fn default_topics_index() -> String {
    "topics-explorativ".to_string()
}

fn default_resources_index() -> String {
    "slub-resources".to_string()
}

fn default_indices() -> BTreeMap<String, String> {
    [
        ("resources", "slub-resources"),
        ("topics", "topics"),
        ("persons", "persons"),
        ("geo", "geo"),
        ("organizations", "organizations"),
        ("works", "works"),
        ("events", "events"),
    ]
    .into_iter()
    .map(|(collection, index)| (collection.to_string(), index.to_string()))
    .collect()
}

fn default_topic_fields() -> Vec<String> {
    [
        "preferredName",
        "alternateName",
        "description",
        "additionalType.description",
        "additionalType.name",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_mention_field() -> String {
    "mentions.@id.keyword".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
            log_level: default_log_level(),
            uri_prefix: default_uri_prefix(),
            cap_limit: default_cap_limit(),
            topics_index: default_topics_index(),
            resources_index: default_resources_index(),
            indices: default_indices(),
            source_excludes: Vec::new(),
            topic_fields: default_topic_fields(),
            excluded_collections: Vec::new(),
            mention_field: default_mention_field(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/lod-api/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (LOD_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, LodError> {
        let config_dir = ProjectDirs::from("", "", "lod-api")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("backend_url", default_backend_url())
            .map_err(|e| LodError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| LodError::Config(e.to_string()))?
            .set_default("cap_limit", default_cap_limit() as i64)
            .map_err(|e| LodError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // LOD_BACKEND_URL, LOD_CAP_LIMIT, LOD_API_KEY, LOD_INDICES__PERSONS, ...
        builder = builder.add_source(
            Environment::with_prefix("LOD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| LodError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| LodError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), LodError> {
        if self.backend_url.trim().is_empty() {
            return Err(LodError::Config("backend_url must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(LodError::Config("timeout_secs must be > 0".to_string()));
        }
        if self.cap_limit == 0 {
            return Err(LodError::Config("cap_limit must be > 0".to_string()));
        }
        if !self.uri_prefix.ends_with('/') {
            return Err(LodError::Config(format!(
                "uri_prefix must end with '/', got {}",
                self.uri_prefix
            )));
        }
        Ok(())
    }

    /// Backend index for an entity collection, falling back to the collection name.
    pub fn index_for(&self, collection: &str) -> String {
        self.indices
            .get(collection)
            .cloned()
            .unwrap_or_else(|| collection.to_string())
    }

    /// True if entity resolution must skip `collection`.
    pub fn is_excluded_collection(&self, collection: &str) -> bool {
        self.excluded_collections
            .iter()
            .any(|excluded| collection.starts_with(excluded.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Serializes tests that call `Settings::load`, which reads process env.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.cap_limit, 10_000);
        assert_eq!(settings.topics_index, "topics-explorativ");
        assert_eq!(settings.index_for("persons"), "persons");
        assert_eq!(settings.index_for("resources"), "slub-resources");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_index_for_unknown_collection() {
        let settings = Settings::default();
        assert_eq!(settings.index_for("swb-aut"), "swb-aut");
    }

    #[test]
    fn test_excluded_collections_match_prefix() {
        let settings = Settings {
            excluded_collections: vec!["swb".to_string()],
            ..Default::default()
        };
        assert!(settings.is_excluded_collection("swb-aut"));
        assert!(!settings.is_excluded_collection("persons"));
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        settings.cap_limit = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.uri_prefix = "https://data.slub-dresden.de".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let _guard = env_lock();
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
backend_url = "http://es.example.org:9200"
cap_limit = 5000
excluded_collections = ["swb"]

[indices]
persons = "persons-2024"
"#
        )
        .unwrap();

        let settings = Settings::load(file.path().to_str()).unwrap();
        assert_eq!(settings.backend_url, "http://es.example.org:9200");
        assert_eq!(settings.cap_limit, 5000);
        assert_eq!(settings.index_for("persons"), "persons-2024");
        assert_eq!(settings.excluded_collections, vec!["swb"]);
        assert_eq!(settings.topics_index, "topics-explorativ");
    }

    #[test]
    fn test_env_overrides_file() {
        let _guard = env_lock();
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
cap_limit = 5000

[indices]
persons = "persons-2024"
"#
        )
        .unwrap();

        std::env::set_var("LOD_CAP_LIMIT", "777");
        std::env::set_var("LOD_INDICES__PERSONS", "persons-env");
        let loaded = Settings::load(file.path().to_str());
        std::env::remove_var("LOD_CAP_LIMIT");
        std::env::remove_var("LOD_INDICES__PERSONS");

        let settings = loaded.unwrap();
        assert_eq!(settings.cap_limit, 777);
        assert_eq!(settings.index_for("persons"), "persons-env");
    }

    #[test]
    fn test_load_rejects_missing_cli_file() {
        let _guard = env_lock();
        assert!(Settings::load(Some("/nonexistent/lod-api.toml")).is_err());
    }
}
