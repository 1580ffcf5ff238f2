//! Request-level entry points.
//!
//! [`ExploreService`] validates inbound requests and builds fresh per-request
//! state for each call. The backend and configuration are the only shared
//! parts, and both are read-only.

use std::sync::Arc;

use tracing::{debug, info};

use lod_search::SearchBackend;
use lod_types::{
    CorrelationResult, EntityPool, ExploreRequest, ExploreResult, Result, Settings, TopicHit,
    TopicSearchRequest,
};

use crate::aggregation::AggregationManager;
use crate::entities::{group_uris, EntityResolver};
use crate::method::MethodRegistry;
use crate::topicsearch::TopicSearchPaginator;

/// Exploration operations over one search backend.
pub struct ExploreService<B: SearchBackend + 'static> {
    backend: Arc<B>,
    settings: Arc<Settings>,
    methods: MethodRegistry,
}

impl<B: SearchBackend + 'static> ExploreService<B> {
    /// Create a service running the standard aggregation methods.
    pub fn new(backend: Arc<B>, settings: Arc<Settings>) -> Self {
        Self::with_methods(backend, settings, MethodRegistry::standard())
    }

    pub fn with_methods(backend: Arc<B>, settings: Arc<Settings>, methods: MethodRegistry) -> Self {
        Self {
            backend,
            settings,
            methods,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn manager(&self, request: &ExploreRequest) -> Result<AggregationManager<B>> {
        request.validate()?;
        let manager = AggregationManager::new(
            self.backend.clone(),
            self.settings.clone(),
            self.methods.clone(),
            request.subjects.clone(),
        )?;
        Ok(match request.window() {
            Some(window) => manager.with_window(window),
            None => manager,
        })
    }

    async fn run_aggs(&self, manager: &mut AggregationManager<B>, request: &ExploreRequest) -> Result<()> {
        manager
            .run_aggs(
                request.query_template.as_ref(),
                request.restriction.as_deref(),
                request.author_filter.as_deref(),
            )
            .await?;
        manager.resolve_agg_entities(&self.settings.uri_prefix).await?;
        Ok(())
    }

    /// Per-method aggregation results with every referenced entity resolved.
    pub async fn aggregate(&self, request: &ExploreRequest) -> Result<ExploreResult> {
        let mut manager = self.manager(request)?;
        info!(subjects = request.subjects.len(), "Running aggregations");
        self.run_aggs(&mut manager, request).await?;
        Ok(manager.into_result())
    }

    /// Pairwise subject co-occurrence.
    pub async fn correlate(&self, request: &ExploreRequest) -> Result<CorrelationResult> {
        let mut manager = self.manager(request)?;
        info!(subjects = request.subjects.len(), "Running correlations");
        manager.run_correlations().await?;
        Ok(manager.into_result().correlations)
    }

    /// Aggregations, correlations and the resolved entity pool in one result.
    pub async fn explore(&self, request: &ExploreRequest) -> Result<ExploreResult> {
        let mut manager = self.manager(request)?;
        info!(subjects = request.subjects.len(), "Running exploration");
        self.run_aggs(&mut manager, request).await?;
        manager.run_correlations().await?;
        Ok(manager.into_result())
    }

    /// Topic search returning at least the requested number of mentioned topics
    /// when the corpus has them.
    pub async fn topic_search(&self, request: &TopicSearchRequest) -> Result<Vec<TopicHit>> {
        let size = request.validate()?;
        let paginator = TopicSearchPaginator::new(self.backend.clone(), self.settings.clone());
        paginator.search(&request.text, size, &request.fields).await
    }

    /// Resolve entity URIs into a fresh pool.
    pub async fn resolve_entities<S: AsRef<str>>(&self, uris: &[S]) -> Result<EntityPool> {
        let grouped = group_uris(uris.iter().map(|uri| uri.as_ref()), &self.settings.uri_prefix);
        debug!(collections = grouped.len(), "Resolving entities");
        let resolver = EntityResolver::new(self.backend.clone(), self.settings.clone());
        let mut pool = EntityPool::new();
        resolver.query_entities_by_uri(&grouped, &mut pool).await?;
        Ok(pool)
    }
}
