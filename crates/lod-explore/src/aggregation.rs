//! Per-request aggregation state.
//!
//! An [`AggregationManager`] owns one request's subjects, the methods to run,
//! and everything accumulated while running them: per-method results, subject
//! co-occurrence and the entity pool. It is created per request and never
//! shared.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use lod_search::{SearchBackend, SearchHit};
use lod_types::{
    CorrelationResult, EntityPool, ExploreResult, LodError, MethodResult, Result, Settings,
    SubjectResult, RESOURCES_COLLECTION,
};

use crate::batch::BatchExecutor;
use crate::entities::{group_uris, EntityResolver};
use crate::method::MethodRegistry;
use crate::parse::{ensure_aggregations, parse_agg};
use crate::query::{build_matrix_query, AggsQueryParams, DEFAULT_RESULT_WINDOW};
use crate::queryset::build_query_set;

/// Runs aggregation methods over a fixed subject list and accumulates results.
pub struct AggregationManager<B: SearchBackend + 'static> {
    executor: BatchExecutor<B>,
    resolver: EntityResolver<B>,
    settings: Arc<Settings>,
    methods: MethodRegistry,
    subjects: Vec<String>,
    window: usize,
    results: BTreeMap<String, MethodResult>,
    correlations: CorrelationResult,
    entity_pool: EntityPool,
}

impl<B: SearchBackend + 'static> AggregationManager<B> {
    /// Create a manager for `subjects`. An empty subject list is rejected.
    pub fn new(
        backend: Arc<B>,
        settings: Arc<Settings>,
        methods: MethodRegistry,
        subjects: Vec<String>,
    ) -> Result<Self> {
        if subjects.is_empty() {
            return Err(LodError::InvalidInput(
                "at least one subject is required".to_string(),
            ));
        }
        Ok(Self {
            executor: BatchExecutor::new(backend.clone(), settings.cap_limit),
            resolver: EntityResolver::new(backend, settings.clone()),
            settings,
            methods,
            subjects,
            window: DEFAULT_RESULT_WINDOW,
            results: BTreeMap::new(),
            correlations: CorrelationResult::new(),
            entity_pool: EntityPool::new(),
        })
    }

    /// Number of top resources kept per subject.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Subjects this manager aggregates over.
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Results accumulated so far, by method name.
    pub fn results(&self) -> &BTreeMap<String, MethodResult> {
        &self.results
    }

    /// Co-occurrence accumulated so far.
    pub fn correlations(&self) -> &CorrelationResult {
        &self.correlations
    }

    /// Entities pooled so far.
    pub fn entity_pool(&self) -> &EntityPool {
        &self.entity_pool
    }

    /// Run every (method, subject) query in one batch and fold the responses
    /// into per-subject results and per-method super-aggregates.
    ///
    /// With a `template`, only the methods it names run and their queries are
    /// taken from it instead of being built.
    pub async fn run_aggs(
        &mut self,
        template: Option<&BTreeMap<String, Value>>,
        restriction: Option<&str>,
        author_filter: Option<&str>,
    ) -> Result<()> {
        let params = AggsQueryParams {
            restriction,
            author_filter,
            size: self.window,
        };
        let queries = build_query_set(&self.methods, &self.subjects, template, &params)?;
        let responses = self
            .executor
            .run_batch(&self.settings.resources_index, queries)
            .await?;

        for batch in responses {
            ensure_aggregations(&batch.query, &batch.response)?;

            let aggs = batch
                .response
                .aggregations
                .iter()
                .flatten()
                .map(|(name, agg)| (name.clone(), parse_agg(&agg.buckets)))
                .collect();

            let mut top_resources = BTreeMap::new();
            for hit in &batch.response.hits.hits {
                top_resources.insert(hit.id.clone(), hit.score.unwrap_or(0.0));
                self.pool_resource(hit);
            }

            debug!(
                method = %batch.tag.method,
                subject = %batch.tag.subject,
                doc_count = batch.doc_count,
                corrected = batch.corrected,
                "Folded subject result"
            );

            self.results
                .entry(batch.tag.method)
                .or_default()
                .subjects
                .insert(
                    batch.tag.subject,
                    SubjectResult {
                        doc_count: batch.doc_count,
                        aggs,
                        top_resources,
                    },
                );
        }

        for result in self.results.values_mut() {
            result.compute_super_agg();
        }
        Ok(())
    }

    fn pool_resource(&mut self, hit: &SearchHit) {
        if self.entity_pool.contains(RESOURCES_COLLECTION, &hit.id) {
            return;
        }
        let Some(projector) = self.resolver.projectors().get(RESOURCES_COLLECTION) else {
            return;
        };
        let uri = self.resolver.entity_uri(RESOURCES_COLLECTION, &hit.id);
        let entity = projector.project(&uri, &hit.source);
        self.entity_pool
            .insert(RESOURCES_COLLECTION, hit.id.clone(), entity);
    }

    /// Compute subject co-occurrence for every method that supports it.
    ///
    /// Bucket keys are single subjects or `&`-joined pairs and are stored
    /// unchanged.
    pub async fn run_correlations(&mut self) -> Result<()> {
        let correlating: Vec<_> = self
            .methods
            .iter()
            .filter(|method| method.correlate)
            .map(|method| (method.name.clone(), method.strategy))
            .collect();

        for (name, strategy) in correlating {
            let query = build_matrix_query(&self.subjects, strategy)?;
            let response = self
                .executor
                .search(&self.settings.resources_index, &query)
                .await?;
            ensure_aggregations(&query, &response)?;

            let parsed = response
                .aggregations
                .iter()
                .flatten()
                .map(|(agg_name, agg)| (agg_name.clone(), parse_agg(&agg.buckets)))
                .collect();
            self.correlations.insert(name, parsed);
        }
        Ok(())
    }

    /// Resolve every entity URI found among aggregation keys into the pool.
    ///
    /// Entities already pooled are not fetched again. Returns the number of
    /// entities added.
    pub async fn resolve_agg_entities(&mut self, uri_prefix: &str) -> Result<usize> {
        let uris = self
            .results
            .values()
            .flat_map(|method| method.subjects.values())
            .flat_map(|subject| subject.aggs.values())
            .flat_map(|agg| agg.keys())
            .filter(|key| key.starts_with(uri_prefix))
            .map(String::as_str);
        let grouped = group_uris(uris, uri_prefix);

        let added = self
            .resolver
            .query_entities_by_uri(&grouped, &mut self.entity_pool)
            .await?;
        info!(
            collections = grouped.len(),
            added, "Resolved aggregation entities"
        );
        Ok(added)
    }

    /// Consume the manager, yielding everything it accumulated.
    pub fn into_result(self) -> ExploreResult {
        ExploreResult {
            results: self.results,
            correlations: self.correlations,
            entity_pool: self.entity_pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lod_search::{MockSearchBackend, RecordedCall};
    use lod_types::NormalizedEntity;
    use rand::Rng;
    use serde_json::json;

    use crate::method::AggregationMethod;
    use crate::query::MatchStrategy;

    const AGG_NAMES: [&str; 5] = [
        "topAuthors",
        "datePublished",
        "mentions",
        "genres",
        "topRelatedTopics",
    ];

    fn subjects(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn response(total: u64, buckets: &[(&str, Value)]) -> Value {
        let aggregations: serde_json::Map<String, Value> = AGG_NAMES
            .iter()
            .map(|name| {
                let list = buckets
                    .iter()
                    .find(|(agg, _)| agg == name)
                    .map(|(_, list)| list.clone())
                    .unwrap_or_else(|| json!([]));
                (name.to_string(), json!({ "buckets": list }))
            })
            .collect();
        json!({
            "hits": {"total": {"value": total, "relation": "eq"}, "hits": []},
            "aggregations": aggregations
        })
    }

    fn manager(
        backend: MockSearchBackend,
        methods: MethodRegistry,
        names: &[&str],
    ) -> (Arc<MockSearchBackend>, AggregationManager<MockSearchBackend>) {
        let backend = Arc::new(backend);
        let manager = AggregationManager::new(
            backend.clone(),
            Arc::new(Settings::default()),
            methods,
            subjects(names),
        )
        .unwrap();
        (backend, manager)
    }

    fn topic_match_only() -> MethodRegistry {
        MethodRegistry::default().with(AggregationMethod::new(MatchStrategy::TopicMatch))
    }

    #[test]
    fn test_empty_subjects_rejected() {
        let result = AggregationManager::new(
            Arc::new(MockSearchBackend::default()),
            Arc::new(Settings::default()),
            MethodRegistry::standard(),
            Vec::new(),
        );
        assert!(matches!(result, Err(LodError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_run_aggs_folds_results_in_tag_order() {
        let backend = MockSearchBackend::default().with_batch_json(vec![
            response(4, &[("genres", json!([{"key": "Roman", "doc_count": 2}]))]),
            response(9, &[("genres", json!([{"key": "Roman", "doc_count": 5}]))]),
            response(1, &[]),
            response(2, &[]),
        ]);
        let (backend, mut manager) =
            manager(backend, MethodRegistry::standard(), &["Dresden", "Leipzig"]);
        assert_eq!(manager.subjects(), ["Dresden", "Leipzig"]);

        manager.run_aggs(None, None, None).await.unwrap();

        let topic = &manager.results()["topicMatch"];
        assert_eq!(topic.subjects["Dresden"].doc_count, 4);
        assert_eq!(topic.subjects["Leipzig"].doc_count, 9);
        assert_eq!(topic.super_agg["genres"].get("Roman"), Some(7));
        let phrase = &manager.results()["phraseMatch"];
        assert_eq!(phrase.subjects["Dresden"].doc_count, 1);
        assert_eq!(phrase.subjects["Leipzig"].doc_count, 2);

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        let RecordedCall::MultiSearch { index, queries } = &calls[0] else {
            panic!("expected a multi-search");
        };
        assert_eq!(index, "slub-resources");
        assert_eq!(queries.len(), 4);
    }

    #[tokio::test]
    async fn test_reordered_responses_are_visible() {
        let (_, mut manager) = manager(
            MockSearchBackend::default()
                .with_batch_json(vec![response(9, &[]), response(4, &[])]),
            topic_match_only(),
            &["Dresden", "Leipzig"],
        );

        manager.run_aggs(None, None, None).await.unwrap();

        // Pairing is positional: the swapped array lands on the wrong subjects.
        let topic = &manager.results()["topicMatch"];
        assert_eq!(topic.subjects["Dresden"].doc_count, 9);
        assert_eq!(topic.subjects["Leipzig"].doc_count, 4);
    }

    #[tokio::test]
    async fn test_capped_count_is_corrected() {
        let backend = MockSearchBackend::default()
            .with_batch_json(vec![response(10_000, &[])])
            .with_search_json(json!({"hits": {"total": {"value": 10_001, "relation": "eq"}, "hits": []}}));
        let (_, mut manager) = manager(backend, topic_match_only(), &["Dresden"]);

        manager.run_aggs(None, None, None).await.unwrap();

        assert_eq!(
            manager.results()["topicMatch"].subjects["Dresden"].doc_count,
            10_001
        );
    }

    #[tokio::test]
    async fn test_missing_aggregation_is_fatal() {
        let backend = MockSearchBackend::default()
            .with_batch_json(vec![json!({"hits": {"total": 3, "hits": []}})]);
        let (_, mut manager) = manager(backend, topic_match_only(), &["Dresden"]);

        let err = manager.run_aggs(None, None, None).await.unwrap_err();
        assert!(matches!(err, LodError::MissingAggregation { .. }));
    }

    #[tokio::test]
    async fn test_top_hits_pooled_as_resources() {
        let mut first = response(2, &[]);
        first["hits"]["hits"] = json!([
            {"_id": "0-1", "_index": "slub-resources", "_score": 3.5,
             "_source": {"preferredName": "Emil und die Detektive", "datePublished": {"@value": "1929"}}},
            {"_id": "0-2", "_index": "slub-resources", "_score": null, "_source": {}}
        ]);
        let (_, mut manager) = manager(
            MockSearchBackend::default().with_batch_json(vec![first]),
            topic_match_only(),
            &["Berlin"],
        );

        manager.run_aggs(None, None, None).await.unwrap();

        let subject = &manager.results()["topicMatch"].subjects["Berlin"];
        assert_eq!(subject.top_resources["0-1"], 3.5);
        assert_eq!(subject.top_resources["0-2"], 0.0);
        let Some(NormalizedEntity::Resource(resource)) =
            manager.entity_pool().get("resources", "0-1")
        else {
            panic!("expected pooled resource");
        };
        assert_eq!(resource.id, "https://data.slub-dresden.de/resources/0-1");
        assert_eq!(resource.year_published.as_deref(), Some("1929"));
    }

    #[tokio::test]
    async fn test_template_runs_named_methods_only() {
        let template = BTreeMap::from([(
            "phraseMatch".to_string(),
            json!({"query": {"match_phrase": {"name": "{{subject}}"}}, "aggs": {"genres": {"terms": {"field": "genre"}}}}),
        )]);
        let backend = MockSearchBackend::default().with_batch_json(vec![json!({
            "hits": {"total": 1, "hits": []},
            "aggregations": {"genres": {"buckets": [{"key": "Lyrik", "doc_count": 1}]}}
        })]);
        let (backend, mut manager) = manager(backend, MethodRegistry::standard(), &["Dresden"]);

        manager.run_aggs(Some(&template), None, None).await.unwrap();

        assert!(!manager.results().contains_key("topicMatch"));
        assert_eq!(
            manager.results()["phraseMatch"].super_agg["genres"].get("Lyrik"),
            Some(1)
        );
        let RecordedCall::MultiSearch { queries, .. } = &backend.calls()[0] else {
            panic!("expected a multi-search");
        };
        assert_eq!(queries[0]["query"]["match_phrase"]["name"], "Dresden");
    }

    #[tokio::test]
    async fn test_unknown_template_method_runs_nothing() {
        let template = BTreeMap::from([("fuzzyMatch".to_string(), json!({}))]);
        let (backend, mut manager) =
            manager(MockSearchBackend::default(), MethodRegistry::standard(), &["Dresden"]);

        let err = manager.run_aggs(Some(&template), None, None).await.unwrap_err();

        assert!(err.is_client_error());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_correlations_pass_matrix_keys_through() {
        let matrix = json!({
            "hits": {"total": 30, "hits": []},
            "aggregations": {"cooccurrence": {"buckets": [
                {"key": "Topic1", "doc_count": 20},
                {"key": "Topic1&Topic2", "doc_count": 12},
                {"key": "Topic2", "doc_count": 22}
            ]}}
        });
        let backend = MockSearchBackend::default()
            .with_search_json(matrix.clone())
            .with_search_json(matrix);
        let (backend, mut manager) =
            manager(backend, MethodRegistry::standard(), &["Topic1", "Topic2"]);

        manager.run_correlations().await.unwrap();

        for method in ["topicMatch", "phraseMatch"] {
            assert_eq!(
                manager.correlations()[method]["cooccurrence"].get("Topic1&Topic2"),
                Some(12)
            );
        }
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_methods_without_correlation_are_skipped() {
        let methods = MethodRegistry::default()
            .with(AggregationMethod::new(MatchStrategy::TopicMatch).without_correlations());
        let (backend, mut manager) = manager(MockSearchBackend::default(), methods, &["Topic1"]);

        manager.run_correlations().await.unwrap();

        assert!(manager.correlations().is_empty());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_shared_entity_resolved_once() {
        let topic = "https://data.slub-dresden.de/topics/123";
        let mentions = json!([{"key": topic, "doc_count": 3}]);
        let backend = MockSearchBackend::default()
            .with_batch_json(vec![
                response(3, &[("mentions", mentions.clone())]),
                response(5, &[("mentions", mentions.clone())]),
                response(2, &[("topRelatedTopics", mentions)]),
                response(1, &[]),
            ])
            .with_document("topics", "123", json!({"preferredName": "Berlin"}));
        let (backend, mut manager) =
            manager(backend, MethodRegistry::standard(), &["Dresden", "Leipzig"]);

        manager.run_aggs(None, None, None).await.unwrap();
        let added = manager
            .resolve_agg_entities("https://data.slub-dresden.de/")
            .await
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(backend.multi_get_count(), 1);
        let topics = manager.entity_pool().collection("topics").unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics["123"].name(), "Berlin");
    }

    #[tokio::test]
    async fn test_super_agg_is_elementwise_sum() {
        let mut rng = rand::rng();
        let names: Vec<String> = (0..rng.random_range(1..6))
            .map(|i| format!("Subject{i}"))
            .collect();
        let keys = ["Roman", "Lyrik", "Drama", "Essay", "Brief"];

        let mut responses = Vec::new();
        for _ in &names {
            let mut buckets = Vec::new();
            for key in keys {
                if rng.random_bool(0.7) {
                    buckets.push(json!({"key": key, "doc_count": rng.random_range(0..50u64)}));
                }
            }
            responses.push(response(1, &[("genres", json!(buckets))]));
        }

        let backend = Arc::new(MockSearchBackend::default().with_batch_json(responses));
        let mut manager = AggregationManager::new(
            backend,
            Arc::new(Settings::default()),
            topic_match_only(),
            names.clone(),
        )
        .unwrap();
        manager.run_aggs(None, None, None).await.unwrap();

        let method = &manager.results()["topicMatch"];
        for agg_name in AGG_NAMES {
            let super_agg = method.super_agg.get(agg_name).cloned().unwrap_or_default();
            for key in keys {
                let expected: u64 = names
                    .iter()
                    .filter_map(|s| method.subjects[s].aggs[agg_name].get(key))
                    .sum();
                assert_eq!(super_agg.get(key).unwrap_or(0), expected);
            }
        }
    }
}
