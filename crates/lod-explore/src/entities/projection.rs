//! Per-collection projections of raw documents into normalized entities.
//!
//! Each collection has its own schema. A projector knows which source paths
//! feed each output field and what to fall back to when they are absent; it
//! never fails.

use std::collections::HashMap;

use serde_json::Value;

use lod_types::{
    EntityRef, EventEntity, NormalizedEntity, OrganizationEntity, PersonEntity, PlaceEntity,
    ResourceEntity, TopicEntity, WorkEntity,
};

use super::extract::{entity_refs, opt_f64, opt_string, string_list, string_or};
use crate::parse::leading_year;

/// Name used when a person or author has none.
pub const UNKNOWN_NAME: &str = "Unbekannt";

const NAME_PATHS: &[&str] = &["preferredName", "name"];
const ALTERNATE_NAME_PATHS: &[&str] = &["alternateName"];
const DESCRIPTION_PATHS: &[&str] = &["description"];

/// Projects documents of one collection.
pub trait EntityProjector: Send + Sync {
    /// Collection this projector handles.
    fn collection(&self) -> &'static str;

    /// Project `source`; `uri` is used when the document carries no `@id`.
    fn project(&self, uri: &str, source: &Value) -> NormalizedEntity;
}

fn entity_id(uri: &str, source: &Value) -> String {
    string_or(source, &["@id"], uri)
}

/// Bibliographic resources.
pub struct ResourceProjector;

impl EntityProjector for ResourceProjector {
    fn collection(&self) -> &'static str {
        "resources"
    }

    fn project(&self, uri: &str, source: &Value) -> NormalizedEntity {
        let mut authors = entity_refs(source, &["author"]);
        if authors.is_empty() {
            authors = entity_refs(source, &["contributor"]);
        }
        for author in &mut authors {
            if author.name.is_empty() {
                author.name = UNKNOWN_NAME.to_string();
            }
        }

        let date_published = opt_string(source, &["datePublished>@value", "datePublished"]);
        let year_published = date_published
            .as_deref()
            .map(|date| leading_year(date).to_string());

        NormalizedEntity::Resource(ResourceEntity {
            id: entity_id(uri, source),
            name: string_or(source, &["preferredName", "name", "nameShort"], ""),
            alternative_headline: string_or(source, &["alternativeHeadline", "nameSub"], ""),
            description: string_or(source, DESCRIPTION_PATHS, ""),
            authors,
            date_published,
            year_published,
            genres: string_list(source, &["genre"]),
            mentions: entity_refs(source, &["mentions"]),
            publisher: string_or(source, &["publisher>name", "publisher"], ""),
        })
    }
}

/// Topics / subject headings.
pub struct TopicProjector;

impl EntityProjector for TopicProjector {
    fn collection(&self) -> &'static str {
        "topics"
    }

    fn project(&self, uri: &str, source: &Value) -> NormalizedEntity {
        NormalizedEntity::Topic(TopicEntity {
            id: entity_id(uri, source),
            name: string_or(source, NAME_PATHS, ""),
            alternate_name: string_list(source, ALTERNATE_NAME_PATHS),
            description: string_or(source, DESCRIPTION_PATHS, ""),
            additional_types: entity_refs(source, &["additionalType"]),
        })
    }
}

/// Persons. Occupation objects collapse into their names.
pub struct PersonProjector;

impl EntityProjector for PersonProjector {
    fn collection(&self) -> &'static str {
        "persons"
    }

    fn project(&self, uri: &str, source: &Value) -> NormalizedEntity {
        NormalizedEntity::Person(PersonEntity {
            id: entity_id(uri, source),
            name: string_or(source, NAME_PATHS, UNKNOWN_NAME),
            alternate_name: string_list(source, ALTERNATE_NAME_PATHS),
            description: string_or(source, DESCRIPTION_PATHS, ""),
            birth_date: opt_string(source, &["birthDate>@value", "birthDate"]),
            death_date: opt_string(source, &["deathDate>@value", "deathDate"]),
            occupations: string_list(source, &["occupation", "hasOccupation"]),
        })
    }
}

/// Geographic places.
pub struct PlaceProjector;

impl EntityProjector for PlaceProjector {
    fn collection(&self) -> &'static str {
        "geo"
    }

    fn project(&self, uri: &str, source: &Value) -> NormalizedEntity {
        NormalizedEntity::Place(PlaceEntity {
            id: entity_id(uri, source),
            name: string_or(source, NAME_PATHS, ""),
            alternate_name: string_list(source, ALTERNATE_NAME_PATHS),
            description: string_or(source, DESCRIPTION_PATHS, ""),
            latitude: opt_f64(source, &["geo>latitude", "latitude"]),
            longitude: opt_f64(source, &["geo>longitude", "longitude"]),
        })
    }
}

/// Organizations.
pub struct OrganizationProjector;

impl EntityProjector for OrganizationProjector {
    fn collection(&self) -> &'static str {
        "organizations"
    }

    fn project(&self, uri: &str, source: &Value) -> NormalizedEntity {
        NormalizedEntity::Organization(OrganizationEntity {
            id: entity_id(uri, source),
            name: string_or(source, NAME_PATHS, ""),
            alternate_name: string_list(source, ALTERNATE_NAME_PATHS),
            description: string_or(source, DESCRIPTION_PATHS, ""),
            founding_date: opt_string(source, &["foundingDate>@value", "foundingDate"]),
            location: first_ref(source, &["location"]),
        })
    }
}

/// Works.
pub struct WorkProjector;

impl EntityProjector for WorkProjector {
    fn collection(&self) -> &'static str {
        "works"
    }

    fn project(&self, uri: &str, source: &Value) -> NormalizedEntity {
        NormalizedEntity::Work(WorkEntity {
            id: entity_id(uri, source),
            name: string_or(source, NAME_PATHS, ""),
            alternate_name: string_list(source, ALTERNATE_NAME_PATHS),
            description: string_or(source, DESCRIPTION_PATHS, ""),
            authors: entity_refs(source, &["author", "contributor"]),
            date_created: opt_string(source, &["dateCreated>@value", "dateCreated"]),
        })
    }
}

/// Events.
pub struct EventProjector;

impl EntityProjector for EventProjector {
    fn collection(&self) -> &'static str {
        "events"
    }

    fn project(&self, uri: &str, source: &Value) -> NormalizedEntity {
        NormalizedEntity::Event(EventEntity {
            id: entity_id(uri, source),
            name: string_or(source, NAME_PATHS, ""),
            description: string_or(source, DESCRIPTION_PATHS, ""),
            start_date: opt_string(source, &["startDate>@value", "startDate"]),
            end_date: opt_string(source, &["endDate>@value", "endDate"]),
            location: first_ref(source, &["location"]),
        })
    }
}

fn first_ref(source: &Value, paths: &[&str]) -> Option<EntityRef> {
    entity_refs(source, paths).into_iter().next()
}

/// Collection name -> projector.
#[derive(Default)]
pub struct ProjectorRegistry {
    projectors: HashMap<&'static str, Box<dyn EntityProjector>>,
}

impl ProjectorRegistry {
    /// Registry with a projector for every known collection.
    pub fn standard() -> Self {
        Self::default()
            .with(ResourceProjector)
            .with(TopicProjector)
            .with(PersonProjector)
            .with(PlaceProjector)
            .with(OrganizationProjector)
            .with(WorkProjector)
            .with(EventProjector)
    }

    /// Register a projector under its collection name.
    pub fn with(mut self, projector: impl EntityProjector + 'static) -> Self {
        self.projectors
            .insert(projector.collection(), Box::new(projector));
        self
    }

    /// Projector for `collection`, if registered.
    pub fn get(&self, collection: &str) -> Option<&dyn EntityProjector> {
        self.projectors.get(collection).map(|p| p.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_projection() {
        let source = json!({
            "@id": "https://data.slub-dresden.de/resources/0-1",
            "preferredName": "Emil und die Detektive",
            "author": [{"@id": "https://data.slub-dresden.de/persons/118", "name": "Erich Kästner"}],
            "datePublished": {"@value": "1929-10-15"},
            "genre": {"@type": "Text", "Text": "Kinderbuch"},
            "mentions": [{"@id": "https://data.slub-dresden.de/topics/1", "name": "Berlin"}]
        });

        let NormalizedEntity::Resource(resource) = ResourceProjector.project("fallback", &source)
        else {
            panic!("expected resource");
        };
        assert_eq!(resource.id, "https://data.slub-dresden.de/resources/0-1");
        assert_eq!(resource.authors[0].name, "Erich Kästner");
        assert_eq!(resource.year_published.as_deref(), Some("1929"));
        assert_eq!(resource.genres, vec!["Kinderbuch"]);
        assert_eq!(resource.mentions.len(), 1);
        assert_eq!(resource.publisher, "");
    }

    #[test]
    fn test_resource_authors_fall_back_to_contributor() {
        let source = json!({"contributor": {"@id": "https://data.slub-dresden.de/persons/9"}});
        let NormalizedEntity::Resource(resource) = ResourceProjector.project("uri", &source) else {
            panic!("expected resource");
        };
        assert_eq!(resource.id, "uri");
        assert_eq!(resource.authors.len(), 1);
        assert_eq!(resource.authors[0].name, UNKNOWN_NAME);
        assert!(resource.year_published.is_none());
    }

    #[test]
    fn test_person_occupations_drop_nameless() {
        let source = json!({
            "name": "Erich Kästner",
            "occupation": [{"name": "Schriftsteller"}, {"@id": "x"}, {"name": "Drehbuchautor"}],
            "birthDate": "1899-02-23"
        });
        let NormalizedEntity::Person(person) = PersonProjector.project("uri", &source) else {
            panic!("expected person");
        };
        assert_eq!(person.occupations, vec!["Schriftsteller", "Drehbuchautor"]);
        assert_eq!(person.birth_date.as_deref(), Some("1899-02-23"));
        assert!(person.death_date.is_none());
    }

    #[test]
    fn test_empty_documents_fill_defaults() {
        let empty = json!({});
        let registry = ProjectorRegistry::standard();
        for collection in ["resources", "topics", "persons", "geo", "organizations", "works", "events"] {
            let entity = registry.get(collection).unwrap().project("uri", &empty);
            assert_eq!(entity.id(), "uri");
        }
        let person = registry.get("persons").unwrap().project("uri", &empty);
        assert_eq!(person.name(), UNKNOWN_NAME);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ProjectorRegistry::standard();
        assert_eq!(registry.get("geo").unwrap().collection(), "geo");
        assert!(registry.get("swb-aut").is_none());
        assert!(ProjectorRegistry::default().get("persons").is_none());
    }
}
