//! Test records, schemas and a wired endpoint.
//!
//! Three resource types are served: `entities` (no relationships), `people`
//! and `posts`. A post has a to-one `author` and a to-many `readers`, both
//! pointing at `people`.

use std::collections::BTreeMap;
use std::sync::Arc;

use jsonapi_document::{
    JsonApiConfig, JsonApiError, JsonApiResult, Record, RelatedData, ResourceInput, Schema,
    SchemaContainer, StandardObject,
};
use jsonapi_repository::{
    AdapterContainer, Cardinality, Endpoint, HasMany, HasOne, MemoryAdapter, Permissions,
    RelationValue, ResourceAdapter, StoredRecord,
};
use serde_json::{Value, json};

/// A generic record with attributes and relations by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub kind: String,
    pub id: String,
    pub attributes: StandardObject,
    pub relations: BTreeMap<String, RelationValue>,
}

impl Item {
    pub fn new(kind: &str, id: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            id: id.to_string(),
            attributes: StandardObject::new().with("name", json!(name)),
            relations: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: Value) -> Self {
        self.attributes = self.attributes.with(name, value);
        self
    }

    pub fn with_relation(mut self, field: &str, value: RelationValue) -> Self {
        self.relations.insert(field.to_string(), value);
        self
    }
}

impl Record for Item {
    fn resource_type(&self) -> &str {
        &self.kind
    }
}

impl StoredRecord for Item {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.attributes.value(name).cloned()
    }

    fn from_input(resource_type: &str, id: String, input: &ResourceInput) -> JsonApiResult<Self> {
        let mut item = Item {
            kind: resource_type.to_string(),
            id,
            attributes: StandardObject::new(),
            relations: BTreeMap::new(),
        };
        item.apply(input)?;
        Ok(item)
    }

    fn apply(&mut self, input: &ResourceInput) -> JsonApiResult<()> {
        if let Some(name) = input.attribute("name")
            && !name.is_string()
        {
            return Err(JsonApiError::unprocessable("Attribute 'name' must be a string"));
        }
        self.attributes = self.attributes.merge(&input.attributes);
        for (field, linkage) in &input.relationships {
            self.relations
                .insert(field.clone(), RelationValue::from_linkage(linkage));
        }
        Ok(())
    }
}

/// Encodes an [`Item`], resolving relations synchronously against stores.
pub struct ItemSchema {
    resource_type: &'static str,
    relations: Vec<(&'static str, Cardinality, Arc<MemoryAdapter<Item>>)>,
}

impl ItemSchema {
    pub fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            relations: Vec::new(),
        }
    }

    pub fn with_relation(
        mut self,
        field: &'static str,
        cardinality: Cardinality,
        store: Arc<MemoryAdapter<Item>>,
    ) -> Self {
        self.relations.push((field, cardinality, store));
        self
    }
}

impl Schema<Item> for ItemSchema {
    fn resource_type(&self) -> &str {
        self.resource_type
    }

    fn id(&self, record: &Item) -> String {
        record.id.clone()
    }

    fn attributes(&self, record: &Item) -> StandardObject {
        record.attributes.clone()
    }

    fn relationship_types(&self) -> Vec<(&str, &str)> {
        self.relations
            .iter()
            .map(|(field, _, store)| (*field, store.resource_type()))
            .collect()
    }

    fn relationships(&self, record: &Item) -> Vec<(String, RelatedData<Item>)> {
        self.relations
            .iter()
            .map(|(field, cardinality, store)| {
                let data = match (cardinality, record.relations.get(*field)) {
                    (Cardinality::ToOne, Some(RelationValue::ToOne(Some(id)))) => {
                        RelatedData::ToOne(store.get(id))
                    }
                    (Cardinality::ToOne, _) => RelatedData::ToOne(None),
                    (Cardinality::ToMany, Some(RelationValue::ToMany(ids))) => {
                        RelatedData::ToMany(ids.iter().filter_map(|id| store.get(id)).collect())
                    }
                    (Cardinality::ToMany, _) => RelatedData::ToMany(Vec::new()),
                };
                (field.to_string(), data)
            })
            .collect()
    }
}

fn relation_of(item: &Item, field: &str) -> JsonApiResult<RelationValue> {
    Ok(item
        .relations
        .get(field)
        .cloned()
        .unwrap_or(RelationValue::ToOne(None)))
}

/// An endpoint with its backing stores.
pub struct Harness {
    pub endpoint: Endpoint<Item>,
    pub entities: Arc<MemoryAdapter<Item>>,
    pub people: Arc<MemoryAdapter<Item>>,
    pub posts: Arc<MemoryAdapter<Item>>,
}

/// Creates `count` entities named `Entity 1` .. `Entity {count}` with ids
/// `1` .. `{count}`.
pub fn entities(count: usize) -> Vec<Item> {
    (1..=count)
        .map(|i| {
            Item::new("entities", &i.to_string(), &format!("Entity {}", i))
                .with_attribute("description", json!(format!("Description {}", i)))
        })
        .collect()
}

/// Creates two people and one post authored by the first and read by both.
pub fn blog() -> (Vec<Item>, Vec<Item>) {
    let people = vec![
        Item::new("people", "1", "Alice"),
        Item::new("people", "2", "Bob"),
    ];
    let posts = vec![
        Item::new("posts", "10", "Hello")
            .with_relation("author", RelationValue::ToOne(Some("1".to_string())))
            .with_relation(
                "readers",
                RelationValue::ToMany(vec!["1".to_string(), "2".to_string()]),
            ),
    ];
    (people, posts)
}

/// Builds a harness over the given entities and the blog fixture.
pub fn harness_with(
    entities: Vec<Item>,
    permissions: Permissions,
    config: JsonApiConfig,
) -> Harness {
    let (people, posts) = blog();

    let entities = Arc::new(MemoryAdapter::new("entities").with_records(entities));
    let people = Arc::new(MemoryAdapter::new("people").with_records(people));
    let posts = Arc::new(
        MemoryAdapter::new("posts")
            .with_records(posts)
            .with_relationship(Arc::new(HasOne::new("author", "people", relation_of)))
            .with_relationship(Arc::new(HasMany::new("readers", "people", relation_of))),
    );

    let adapters = AdapterContainer::<Item>::new()
        .with_adapter(entities.clone())
        .with_adapter(people.clone())
        .with_adapter(posts.clone());

    let schemas = SchemaContainer::<Item>::new()
        .with_schema(Arc::new(ItemSchema::new("entities")))
        .with_schema(Arc::new(ItemSchema::new("people")))
        .with_schema(Arc::new(
            ItemSchema::new("posts")
                .with_relation("author", Cardinality::ToOne, people.clone())
                .with_relation("readers", Cardinality::ToMany, people.clone()),
        ));

    let endpoint = Endpoint::new(adapters, schemas, config)
        .expect("Failed to create endpoint")
        .with_permissions(permissions);

    Harness {
        endpoint,
        entities,
        people,
        posts,
    }
}

/// Builds a full-access harness with `count` entities.
pub fn harness(count: usize) -> Harness {
    harness_with(
        entities(count),
        Permissions::full_access(),
        JsonApiConfig::for_testing(),
    )
}

/// Returns the query string of a link URL.
pub fn query_of(link: &str) -> String {
    link.split_once('?')
        .map(|(_, query)| query.to_string())
        .unwrap_or_default()
}
