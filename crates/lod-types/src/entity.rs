//! Normalized entity types and the deduplicating entity pool.
//!
//! Every entity collection in the backend has its own schema. The exploration
//! engine projects raw documents into one of the shapes below; absent optional
//! source fields become empty lists, empty strings or `None`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the collection every pool carries.
pub const RESOURCES_COLLECTION: &str = "resources";

/// A reference to another entity: its URI and display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity URI
    pub id: String,
    /// Display name (may be empty)
    pub name: String,
}

/// Bibliographic resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntity {
    pub id: String,
    pub name: String,
    pub alternative_headline: String,
    pub description: String,
    pub authors: Vec<EntityRef>,
    pub date_published: Option<String>,
    /// Leading year token of `date_published`
    pub year_published: Option<String>,
    pub genres: Vec<String>,
    pub mentions: Vec<EntityRef>,
    pub publisher: String,
}

/// Subject heading / topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicEntity {
    pub id: String,
    pub name: String,
    pub alternate_name: Vec<String>,
    pub description: String,
    pub additional_types: Vec<EntityRef>,
}

/// Person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonEntity {
    pub id: String,
    pub name: String,
    pub alternate_name: Vec<String>,
    pub description: String,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    /// Occupation names; entries without a name are dropped
    pub occupations: Vec<String>,
}

/// Geographic place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceEntity {
    pub id: String,
    pub name: String,
    pub alternate_name: Vec<String>,
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Organization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationEntity {
    pub id: String,
    pub name: String,
    pub alternate_name: Vec<String>,
    pub description: String,
    pub founding_date: Option<String>,
    pub location: Option<EntityRef>,
}

/// Creative work (uniform title).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkEntity {
    pub id: String,
    pub name: String,
    pub alternate_name: Vec<String>,
    pub description: String,
    pub authors: Vec<EntityRef>,
    pub date_created: Option<String>,
}

/// Event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEntity {
    pub id: String,
    pub name: String,
    pub description: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<EntityRef>,
}

/// Collection-specific projection of a backend document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entityType", rename_all = "camelCase")]
pub enum NormalizedEntity {
    Resource(ResourceEntity),
    Topic(TopicEntity),
    Person(PersonEntity),
    Place(PlaceEntity),
    Organization(OrganizationEntity),
    Work(WorkEntity),
    Event(EventEntity),
}

impl NormalizedEntity {
    /// URI of the entity.
    pub fn id(&self) -> &str {
        match self {
            NormalizedEntity::Resource(e) => &e.id,
            NormalizedEntity::Topic(e) => &e.id,
            NormalizedEntity::Person(e) => &e.id,
            NormalizedEntity::Place(e) => &e.id,
            NormalizedEntity::Organization(e) => &e.id,
            NormalizedEntity::Work(e) => &e.id,
            NormalizedEntity::Event(e) => &e.id,
        }
    }

    /// Display name of the entity.
    pub fn name(&self) -> &str {
        match self {
            NormalizedEntity::Resource(e) => &e.name,
            NormalizedEntity::Topic(e) => &e.name,
            NormalizedEntity::Person(e) => &e.name,
            NormalizedEntity::Place(e) => &e.name,
            NormalizedEntity::Organization(e) => &e.name,
            NormalizedEntity::Work(e) => &e.name,
            NormalizedEntity::Event(e) => &e.name,
        }
    }
}

/// Deduplicated entities by collection name, then entity id.
///
/// Always contains the `resources` collection. An id is stored at most once
/// per collection no matter how often it was referenced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityPool(BTreeMap<String, BTreeMap<String, NormalizedEntity>>);

impl Default for EntityPool {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityPool {
    /// Create a pool holding an empty `resources` collection.
    pub fn new() -> Self {
        let mut collections = BTreeMap::new();
        collections.insert(RESOURCES_COLLECTION.to_string(), BTreeMap::new());
        Self(collections)
    }

    /// True if `id` is already pooled in `collection`.
    pub fn contains(&self, collection: &str, id: &str) -> bool {
        self.0
            .get(collection)
            .is_some_and(|entities| entities.contains_key(id))
    }

    /// Insert an entity unless the id is already pooled.
    ///
    /// Returns `true` if the entity was added.
    pub fn insert(
        &mut self,
        collection: &str,
        id: impl Into<String>,
        entity: NormalizedEntity,
    ) -> bool {
        let entities = self.0.entry(collection.to_string()).or_default();
        let id = id.into();
        if entities.contains_key(&id) {
            return false;
        }
        entities.insert(id, entity);
        true
    }

    /// Entities of one collection.
    pub fn collection(&self, collection: &str) -> Option<&BTreeMap<String, NormalizedEntity>> {
        self.0.get(collection)
    }

    /// Look up a single entity.
    pub fn get(&self, collection: &str, id: &str) -> Option<&NormalizedEntity> {
        self.0.get(collection)?.get(id)
    }

    /// Collection names in sorted order.
    pub fn collections(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Total number of pooled entities across all collections.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    /// True if no entity has been pooled yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
