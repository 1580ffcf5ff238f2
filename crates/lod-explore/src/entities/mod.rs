//! Entity resolution: turning entity URIs into pooled, normalized entities.
//!
//! URIs are grouped by collection and fetched with one multi-get per
//! collection. Collections run one after another.

pub mod extract;
pub mod projection;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};

use lod_search::SearchBackend;
use lod_types::{EntityPool, Result, Settings};

pub use projection::{EntityProjector, ProjectorRegistry, UNKNOWN_NAME};

/// Entity ids grouped by collection name.
pub type GroupedIds = BTreeMap<String, BTreeSet<String>>;

/// Split an entity URI into `(collection, id)` using its last two path segments.
///
/// Returns `None` if `uri` does not start with `prefix` or has fewer than two
/// non-empty segments after it.
pub fn split_entity_uri<'a>(uri: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    let rest = uri.strip_prefix(prefix)?;
    let mut segments = rest.trim_end_matches('/').rsplit('/');
    let id = segments.next().filter(|s| !s.is_empty())?;
    let collection = segments.next().filter(|s| !s.is_empty())?;
    Some((collection, id))
}

/// Group entity URIs by collection. URIs outside `prefix` are ignored.
pub fn group_uris<'a, I>(uris: I, prefix: &str) -> GroupedIds
where
    I: IntoIterator<Item = &'a str>,
{
    let mut grouped = GroupedIds::new();
    for uri in uris {
        if let Some((collection, id)) = split_entity_uri(uri, prefix) {
            grouped
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string());
        }
    }
    grouped
}

/// Fetches entities by id and projects them into an [`EntityPool`].
pub struct EntityResolver<B: SearchBackend + 'static> {
    backend: Arc<B>,
    settings: Arc<Settings>,
    projectors: ProjectorRegistry,
}

impl<B: SearchBackend + 'static> EntityResolver<B> {
    /// Create a resolver with projectors for every known collection.
    pub fn new(backend: Arc<B>, settings: Arc<Settings>) -> Self {
        Self::with_projectors(backend, settings, ProjectorRegistry::standard())
    }

    /// Create a resolver with a custom projector registry.
    pub fn with_projectors(
        backend: Arc<B>,
        settings: Arc<Settings>,
        projectors: ProjectorRegistry,
    ) -> Self {
        Self {
            backend,
            settings,
            projectors,
        }
    }

    /// Projector registry in use.
    pub fn projectors(&self) -> &ProjectorRegistry {
        &self.projectors
    }

    /// Canonical URI of an entity.
    pub fn entity_uri(&self, collection: &str, id: &str) -> String {
        format!("{}{}/{}", self.settings.uri_prefix, collection, id)
    }

    /// Fetch every id not yet pooled and add the projected entities to `pool`.
    ///
    /// Excluded collections and collections without a projector are skipped.
    /// Ids the backend does not know are left out. Returns the number of
    /// entities added.
    pub async fn query_entities_by_uri(
        &self,
        grouped: &GroupedIds,
        pool: &mut EntityPool,
    ) -> Result<usize> {
        let mut added = 0;

        for (collection, ids) in grouped {
            if self.settings.is_excluded_collection(collection) {
                debug!(collection = %collection, "Skipping excluded collection");
                continue;
            }
            let Some(projector) = self.projectors.get(collection) else {
                warn!(
                    collection = %collection,
                    ids = ids.len(),
                    "No projection registered for collection, skipping"
                );
                continue;
            };

            let missing: Vec<String> = ids
                .iter()
                .filter(|id| !pool.contains(collection, id))
                .cloned()
                .collect();
            if missing.is_empty() {
                continue;
            }

            let index = self.settings.index_for(collection);
            debug!(collection = %collection, index = %index, ids = missing.len(), "Fetching entities");
            let docs = self.backend.multi_get(&index, &missing).await?;

            for doc in docs {
                let Some(source) = doc.source.filter(|_| doc.found) else {
                    debug!(collection = %collection, id = %doc.id, "Entity not found");
                    continue;
                };
                let uri = self.entity_uri(collection, &doc.id);
                let entity = projector.project(&uri, &source);
                if pool.insert(collection, doc.id, entity) {
                    added += 1;
                }
            }
        }

        Ok(added)
    }
}
