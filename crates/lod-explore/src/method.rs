//! Aggregation method registry.
//!
//! An aggregation method is a named query strategy producing comparable
//! per-subject statistics. Methods are independently invocable; the standard
//! registry carries both `topicMatch` and `phraseMatch`.

use crate::query::MatchStrategy;

/// A named aggregation strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationMethod {
    /// Method name used as result key and template key
    pub name: String,

    /// Query strategy
    pub strategy: MatchStrategy,

    /// Whether the method also runs adjacency-matrix correlations
    pub correlate: bool,
}

impl AggregationMethod {
    /// Method named after its strategy, with correlations enabled.
    pub fn new(strategy: MatchStrategy) -> Self {
        Self {
            name: strategy.as_str().to_string(),
            strategy,
            correlate: true,
        }
    }

    /// Disable correlation queries for this method.
    pub fn without_correlations(mut self) -> Self {
        self.correlate = false;
        self
    }
}

/// Ordered set of registered methods.
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    methods: Vec<AggregationMethod>,
}

impl MethodRegistry {
    /// Registry holding `topicMatch` and `phraseMatch`, in that order.
    pub fn standard() -> Self {
        Self::default()
            .with(AggregationMethod::new(MatchStrategy::TopicMatch))
            .with(AggregationMethod::new(MatchStrategy::PhraseMatch))
    }

    /// Register a method, replacing any method of the same name.
    pub fn with(mut self, method: AggregationMethod) -> Self {
        match self.methods.iter_mut().find(|m| m.name == method.name) {
            Some(existing) => *existing = method,
            None => self.methods.push(method),
        }
        self
    }

    /// Look up a method by name.
    pub fn get(&self, name: &str) -> Option<&AggregationMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Registered methods in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &AggregationMethod> {
        self.methods.iter()
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
