//! Compound document encoding.
//!
//! The encoder resolves a schema for every record by its type tag, emits the
//! primary data, then walks the requested include paths breadth-first. Each
//! `(type, id)` appears at most once across `data` and `included`. A record
//! reached again at the same include position is not walked twice, which is
//! what terminates circular relationships.
//!
//! Sparse fieldsets restrict the attributes and relationships emitted for a
//! type, for primary and included resources alike. They do not restrict
//! which relationships are traversed for inclusion.
//!
//! Include paths are checked against the declared relationship types of the
//! primary type before any record is walked, so an unknown path fails the
//! same way whether or not data exists.

use std::collections::{BTreeMap, HashSet, VecDeque};

use serde_json::{Value, json};
use tracing::debug;

use crate::document::DocumentBuilder;
use crate::error::{JsonApiError, JsonApiResult};
use crate::links::LinkBuilder;
use crate::object::{Linkage, ResourceIdentifier, StandardObject};
use crate::pagination::{PageOverrides, PaginationParameters};
use crate::parameters::{EncodingParameters, IncludePath};
use crate::schema::{Record, RelatedData, SchemaContainer};

const ROOT: usize = 0;

/// Include paths folded into a tree, one node per distinct path prefix.
#[derive(Debug)]
struct IncludeTree {
    nodes: Vec<BTreeMap<String, usize>>,
}

impl IncludeTree {
    fn new(paths: &[IncludePath]) -> Self {
        let mut nodes = vec![BTreeMap::new()];
        for path in paths {
            let mut current = ROOT;
            for segment in path.segments() {
                current = match nodes[current].get(segment) {
                    Some(&next) => next,
                    None => {
                        let next = nodes.len();
                        nodes.push(BTreeMap::new());
                        nodes[current].insert(segment.clone(), next);
                        next
                    }
                };
            }
        }
        Self { nodes }
    }

    fn child(&self, node: usize, field: &str) -> Option<usize> {
        self.nodes[node].get(field).copied()
    }

    fn is_leaf(&self, node: usize) -> bool {
        self.nodes[node].is_empty()
    }
}

/// Encodes records into JSON:API documents.
///
/// Borrowing the schema container and link builder keeps an encoder cheap to
/// create per request.
pub struct Encoder<'a, R> {
    schemas: &'a SchemaContainer<R>,
    links: &'a LinkBuilder,
}

impl<'a, R: Record> Encoder<'a, R> {
    /// Creates an encoder.
    pub fn new(schemas: &'a SchemaContainer<R>, links: &'a LinkBuilder) -> Self {
        Self { schemas, links }
    }

    /// Encodes a single primary resource, or `null` data when absent.
    pub fn encode_resource(
        &self,
        record: Option<&R>,
        params: &EncodingParameters,
    ) -> JsonApiResult<Value> {
        let Some(record) = record else {
            return Ok(DocumentBuilder::new().build());
        };

        self.schemas
            .validate_include(record.resource_type(), params.include())?;
        let identifier = self.schemas.identifier(record)?;
        let data = self.resource_object(record, params)?;
        let included = self.included(&[record], params)?;

        debug!(
            resource = %identifier,
            included = included.len(),
            "Encoded resource document"
        );

        Ok(DocumentBuilder::new()
            .data(data)
            .included(included)
            .link(
                "self",
                self.links.resource(&identifier.resource_type, &identifier.id),
            )
            .build())
    }

    /// Encodes a collection of primary resources.
    ///
    /// With pagination, the top-level links carry `first`, `last`, `prev` and
    /// `next` where applicable, and the pagination meta is attached.
    pub fn encode_collection(
        &self,
        records: &[R],
        resource_type: &str,
        params: &EncodingParameters,
        pagination: Option<&PaginationParameters>,
    ) -> JsonApiResult<Value> {
        self.schemas
            .validate_include(resource_type, params.include())?;
        let roots: Vec<&R> = records.iter().collect();
        let data = roots
            .iter()
            .map(|record| self.resource_object(record, params))
            .collect::<JsonApiResult<Vec<_>>>()?;
        let included = self.included(&roots, params)?;

        debug!(
            resource_type = %resource_type,
            primary = data.len(),
            included = included.len(),
            "Encoded collection document"
        );

        let mut document = DocumentBuilder::new()
            .data(Value::Array(data))
            .included(included);

        let query = params.query_pairs();
        match pagination {
            Some(pagination) => {
                let page_links = pagination.links();
                let url = |overrides: &PageOverrides| {
                    let mut pairs = query.clone();
                    pairs.extend(overrides.iter().cloned());
                    self.links.collection(resource_type, &pairs)
                };

                document = document
                    .link("self", url(&page_links.current))
                    .link("first", url(&page_links.first));
                if let Some(last) = &page_links.last {
                    document = document.link("last", url(last));
                }
                if let Some(prev) = &page_links.prev {
                    document = document.link("prev", url(prev));
                }
                if let Some(next) = &page_links.next {
                    document = document.link("next", url(next));
                }
                document = document.meta(&pagination.meta());
            }
            None => {
                document = document.link("self", self.links.collection(resource_type, &query));
            }
        }

        Ok(document.build())
    }

    /// Encodes the records related to `parent` through `field` as primary
    /// data.
    pub fn encode_related(
        &self,
        parent: &R,
        field: &str,
        related: &RelatedData<R>,
        params: &EncodingParameters,
    ) -> JsonApiResult<Value> {
        let parent_schema = self.schemas.schema_for(parent)?;
        let related_type = parent_schema
            .relationship_types()
            .into_iter()
            .find(|(name, _)| *name == field)
            .map(|(_, related_type)| related_type.to_string());
        match related_type {
            Some(related_type) => self
                .schemas
                .validate_include(&related_type, params.include())?,
            None if !params.include().is_empty() => {
                return Err(JsonApiError::bad_request(format!(
                    "Cannot include from '{}': not a relationship of resource type '{}'",
                    field,
                    parent_schema.resource_type()
                )));
            }
            None => {}
        }

        let parent_id = self.schemas.identifier(parent)?;
        let roots = related.records();
        let resources = roots
            .iter()
            .map(|record| self.resource_object(record, params))
            .collect::<JsonApiResult<Vec<_>>>()?;
        let data = match related {
            RelatedData::ToOne(_) => resources.into_iter().next().unwrap_or(Value::Null),
            RelatedData::ToMany(_) => Value::Array(resources),
        };
        let included = self.included(&roots, params)?;

        Ok(DocumentBuilder::new()
            .data(data)
            .included(included)
            .link(
                "self",
                self.links
                    .related(&parent_id.resource_type, &parent_id.id, field),
            )
            .build())
    }

    /// Encodes the linkage of one relationship as a relationship document.
    pub fn encode_relationship(
        &self,
        parent: &R,
        field: &str,
        related: &RelatedData<R>,
    ) -> JsonApiResult<Value> {
        let parent_id = self.schemas.identifier(parent)?;
        let linkage = self.linkage(related)?;

        Ok(DocumentBuilder::new()
            .data(linkage.to_value())
            .link(
                "self",
                self.links
                    .relationship(&parent_id.resource_type, &parent_id.id, field),
            )
            .link(
                "related",
                self.links
                    .related(&parent_id.resource_type, &parent_id.id, field),
            )
            .build())
    }

    /// Encodes an error document.
    pub fn encode_errors(&self, errors: &[JsonApiError]) -> Value {
        errors
            .iter()
            .fold(DocumentBuilder::new(), |document, error| document.error(error))
            .build()
    }

    fn resource_object(&self, record: &R, params: &EncodingParameters) -> JsonApiResult<Value> {
        let schema = self.schemas.schema_for(record)?;
        let resource_type = schema.resource_type();
        let id = schema.id(record);

        let mut object = StandardObject::new()
            .with("type", json!(resource_type))
            .with("id", json!(id));

        let attributes = schema
            .attributes(record)
            .only(|name| params.is_field_allowed(resource_type, name));
        if !attributes.is_empty() {
            object = object.with("attributes", attributes.into_value());
        }

        let relationships = schema
            .relationships(record)
            .into_iter()
            .filter(|(field, _)| params.is_field_allowed(resource_type, field))
            .map(|(field, related)| -> JsonApiResult<(String, Value)> {
                let value = json!({
                    "data": self.linkage(&related)?.to_value(),
                    "links": {
                        "self": self.links.relationship(resource_type, &id, &field),
                        "related": self.links.related(resource_type, &id, &field),
                    }
                });
                Ok((field, value))
            })
            .collect::<JsonApiResult<StandardObject>>()?;
        if !relationships.is_empty() {
            object = object.with("relationships", relationships.into_value());
        }

        let links = schema.links(record, self.links);
        if !links.is_empty() {
            object = object.with("links", links.into_value());
        }
        if let Some(meta) = schema.meta(record).filter(|meta| !meta.is_empty()) {
            object = object.with("meta", meta.into_value());
        }

        Ok(object.into_value())
    }

    fn linkage(&self, related: &RelatedData<R>) -> JsonApiResult<Linkage> {
        Ok(match related {
            RelatedData::ToOne(None) => Linkage::Empty,
            RelatedData::ToOne(Some(record)) => Linkage::ToOne(self.schemas.identifier(record)?),
            RelatedData::ToMany(records) => Linkage::ToMany(
                records
                    .iter()
                    .map(|record| self.schemas.identifier(record))
                    .collect::<JsonApiResult<Vec<_>>>()?,
            ),
        })
    }

    fn included(&self, roots: &[&R], params: &EncodingParameters) -> JsonApiResult<Vec<Value>> {
        let tree = IncludeTree::new(params.include());
        if tree.is_leaf(ROOT) {
            return Ok(Vec::new());
        }

        let mut emitted: HashSet<ResourceIdentifier> = HashSet::new();
        let mut visited: HashSet<(ResourceIdentifier, usize)> = HashSet::new();
        let mut queue: VecDeque<(R, usize)> = VecDeque::new();

        for root in roots {
            let identifier = self.schemas.identifier(root)?;
            emitted.insert(identifier.clone());
            if visited.insert((identifier, ROOT)) {
                queue.push_back(((*root).clone(), ROOT));
            }
        }

        let mut included = Vec::new();
        while let Some((record, node)) = queue.pop_front() {
            let schema = self.schemas.schema_for(&record)?;

            for (field, related) in &schema.relationships(&record) {
                let Some(child) = tree.child(node, field) else {
                    continue;
                };
                for related_record in related.records() {
                    let identifier = self.schemas.identifier(related_record)?;
                    if !visited.insert((identifier.clone(), child)) {
                        continue;
                    }
                    if emitted.insert(identifier) {
                        included.push(self.resource_object(related_record, params)?);
                    }
                    if !tree.is_leaf(child) {
                        queue.push_back((related_record.clone(), child));
                    }
                }
            }
        }

        Ok(included)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::pagination::PaginationDefaults;
    use crate::schema::Schema;

    #[derive(Debug, Clone, PartialEq)]
    enum Fixture {
        Person {
            id: &'static str,
            name: &'static str,
            friends: Vec<Fixture>,
        },
        Post {
            id: &'static str,
            title: &'static str,
            body: &'static str,
            author: Option<Box<Fixture>>,
            comments: Vec<Fixture>,
        },
        Comment {
            id: &'static str,
            author: Box<Fixture>,
        },
        Unmapped,
    }

    impl Record for Fixture {
        fn resource_type(&self) -> &str {
            match self {
                Fixture::Person { .. } => "people",
                Fixture::Post { .. } => "posts",
                Fixture::Comment { .. } => "comments",
                Fixture::Unmapped => "unmapped",
            }
        }
    }

    struct PeopleSchema;
    struct PostSchema;
    struct CommentSchema;

    impl Schema<Fixture> for PeopleSchema {
        fn resource_type(&self) -> &str {
            "people"
        }

        fn id(&self, record: &Fixture) -> String {
            match record {
                Fixture::Person { id, .. } => id.to_string(),
                _ => String::new(),
            }
        }

        fn attributes(&self, record: &Fixture) -> StandardObject {
            match record {
                Fixture::Person { name, .. } => StandardObject::new().with("name", json!(name)),
                _ => StandardObject::new(),
            }
        }

        fn relationship_types(&self) -> Vec<(&str, &str)> {
            vec![("friends", "people")]
        }

        fn relationships(&self, record: &Fixture) -> Vec<(String, RelatedData<Fixture>)> {
            match record {
                Fixture::Person { friends, .. } => {
                    vec![("friends".to_string(), RelatedData::ToMany(friends.clone()))]
                }
                _ => Vec::new(),
            }
        }
    }

    impl Schema<Fixture> for PostSchema {
        fn resource_type(&self) -> &str {
            "posts"
        }

        fn id(&self, record: &Fixture) -> String {
            match record {
                Fixture::Post { id, .. } => id.to_string(),
                _ => String::new(),
            }
        }

        fn attributes(&self, record: &Fixture) -> StandardObject {
            match record {
                Fixture::Post { title, body, .. } => StandardObject::new()
                    .with("title", json!(title))
                    .with("body", json!(body)),
                _ => StandardObject::new(),
            }
        }

        fn relationship_types(&self) -> Vec<(&str, &str)> {
            vec![("author", "people"), ("comments", "comments")]
        }

        fn relationships(&self, record: &Fixture) -> Vec<(String, RelatedData<Fixture>)> {
            match record {
                Fixture::Post {
                    author, comments, ..
                } => vec![
                    (
                        "author".to_string(),
                        RelatedData::ToOne(author.as_deref().cloned()),
                    ),
                    ("comments".to_string(), RelatedData::ToMany(comments.clone())),
                ],
                _ => Vec::new(),
            }
        }

        fn meta(&self, _record: &Fixture) -> Option<StandardObject> {
            Some(StandardObject::new().with("schema", json!("posts")))
        }
    }

    impl Schema<Fixture> for CommentSchema {
        fn resource_type(&self) -> &str {
            "comments"
        }

        fn id(&self, record: &Fixture) -> String {
            match record {
                Fixture::Comment { id, .. } => id.to_string(),
                _ => String::new(),
            }
        }

        fn attributes(&self, _record: &Fixture) -> StandardObject {
            StandardObject::new()
        }

        fn relationship_types(&self) -> Vec<(&str, &str)> {
            vec![("author", "people")]
        }

        fn relationships(&self, record: &Fixture) -> Vec<(String, RelatedData<Fixture>)> {
            match record {
                Fixture::Comment { author, .. } => vec![(
                    "author".to_string(),
                    RelatedData::ToOne(Some(author.as_ref().clone())),
                )],
                _ => Vec::new(),
            }
        }
    }

    fn schemas() -> SchemaContainer<Fixture> {
        SchemaContainer::<Fixture>::new()
            .with_schema(Arc::new(PeopleSchema))
            .with_schema(Arc::new(PostSchema))
            .with_schema(Arc::new(CommentSchema))
    }

    fn links() -> LinkBuilder {
        LinkBuilder::new("http://localhost/testing/v1").unwrap()
    }

    fn params(query: &str) -> EncodingParameters {
        EncodingParameters::parse(query, 5).unwrap()
    }

    fn person(id: &'static str, name: &'static str) -> Fixture {
        Fixture::Person {
            id,
            name,
            friends: Vec::new(),
        }
    }

    fn post_with_shared_author() -> Fixture {
        let alice = person("1", "Alice");
        Fixture::Post {
            id: "10",
            title: "Hello",
            body: "World",
            author: Some(Box::new(alice.clone())),
            comments: vec![
                Fixture::Comment {
                    id: "100",
                    author: Box::new(alice.clone()),
                },
                Fixture::Comment {
                    id: "101",
                    author: Box::new(alice),
                },
            ],
        }
    }

    fn included_ids(document: &Value) -> Vec<String> {
        document["included"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|item| format!("{}/{}", item["type"].as_str().unwrap(), item["id"].as_str().unwrap()))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_encode_single_resource() {
        let schemas = schemas();
        let links = links();
        let encoder = Encoder::new(&schemas, &links);

        let document = encoder
            .encode_resource(Some(&post_with_shared_author()), &params(""))
            .unwrap();

        assert_eq!(document["data"]["type"], "posts");
        assert_eq!(document["data"]["id"], "10");
        assert_eq!(document["data"]["attributes"]["title"], "Hello");
        assert_eq!(
            document["data"]["relationships"]["author"]["data"],
            json!({"type": "people", "id": "1"})
        );
        assert_eq!(
            document["data"]["relationships"]["comments"]["links"]["related"],
            "http://localhost/testing/v1/posts/10/comments"
        );
        assert_eq!(document["data"]["meta"]["schema"], "posts");
        assert_eq!(document["links"]["self"], "http://localhost/testing/v1/posts/10");
        assert_eq!(document["jsonapi"]["version"], "1.0");
        assert!(document.get("included").is_none());
    }

    #[test]
    fn test_encode_missing_resource() {
        let schemas = schemas();
        let links = links();
        let encoder = Encoder::new(&schemas, &links);

        let document = encoder.encode_resource(None, &params("")).unwrap();
        assert_eq!(document["data"], Value::Null);
    }

    #[test]
    fn test_attributes_survive_encoding() {
        let schemas = schemas();
        let links = links();
        let encoder = Encoder::new(&schemas, &links);

        let document = encoder
            .encode_resource(Some(&person("5", "Foo")), &params(""))
            .unwrap();
        let attributes = StandardObject::from_value(document["data"]["attributes"].clone()).unwrap();
        assert_eq!(attributes, StandardObject::new().with("name", json!("Foo")));
    }

    #[test]
    fn test_included_resources_are_deduplicated() {
        let schemas = schemas();
        let links = links();
        let encoder = Encoder::new(&schemas, &links);

        let document = encoder
            .encode_resource(
                Some(&post_with_shared_author()),
                &params("include=author,comments.author"),
            )
            .unwrap();

        let ids = included_ids(&document);
        assert_eq!(ids, ["people/1", "comments/100", "comments/101"]);
    }

    #[test]
    fn test_primary_resources_are_not_included() {
        let schemas = schemas();
        let links = links();
        let encoder = Encoder::new(&schemas, &links);

        let alice = Fixture::Person {
            id: "1",
            name: "Alice",
            friends: vec![person("2", "Bob")],
        };
        let bob = Fixture::Person {
            id: "2",
            name: "Bob",
            friends: vec![person("1", "Alice")],
        };

        let document = encoder
            .encode_collection(&[alice, bob], "people", &params("include=friends"), None)
            .unwrap();
        assert!(document.get("included").is_none());
    }

    #[test]
    fn test_circular_includes_terminate() {
        let schemas = schemas();
        let links = links();
        let encoder = Encoder::new(&schemas, &links);

        // Alice -> Bob -> Alice, walked through a path longer than the cycle.
        let alice_stub = person("1", "Alice");
        let bob = Fixture::Person {
            id: "2",
            name: "Bob",
            friends: vec![alice_stub],
        };
        let alice = Fixture::Person {
            id: "1",
            name: "Alice",
            friends: vec![bob],
        };

        let document = encoder
            .encode_resource(Some(&alice), &params("include=friends.friends.friends"))
            .unwrap();
        assert_eq!(included_ids(&document), ["people/2"]);
    }

    #[test]
    fn test_sparse_fieldsets() {
        let schemas = schemas();
        let links = links();
        let encoder = Encoder::new(&schemas, &links);

        let document = encoder
            .encode_resource(
                Some(&post_with_shared_author()),
                &params("fields[posts]=title&fields[people]=name&include=author"),
            )
            .unwrap();

        let attributes = document["data"]["attributes"].as_object().unwrap();
        assert_eq!(attributes.len(), 1);
        assert!(attributes.contains_key("title"));
        // Relationships are restricted too, yet inclusion still follows them.
        assert!(document["data"].get("relationships").is_none());
        assert_eq!(included_ids(&document), ["people/1"]);
        assert_eq!(document["included"][0]["attributes"]["name"], "Alice");
    }

    #[test]
    fn test_unknown_include_is_bad_request() {
        let schemas = schemas();
        let links = links();
        let encoder = Encoder::new(&schemas, &links);

        let err = encoder
            .encode_resource(Some(&post_with_shared_author()), &params("include=editor"))
            .unwrap_err();
        assert!(matches!(err, JsonApiError::BadRequest { .. }));
    }

    #[test]
    fn test_unknown_include_fails_without_records() {
        let schemas = schemas();
        let links = links();
        let encoder = Encoder::new(&schemas, &links);

        for query in ["include=bogus", "include=author.bogus"] {
            let err = encoder
                .encode_collection(&[], "posts", &params(query), None)
                .unwrap_err();
            assert!(matches!(err, JsonApiError::BadRequest { .. }), "{}", query);
        }

        let err = encoder
            .encode_related(
                &post_with_shared_author(),
                "author",
                &RelatedData::ToOne(None),
                &params("include=comments"),
            )
            .unwrap_err();
        assert!(matches!(err, JsonApiError::BadRequest { .. }));
    }

    #[test]
    fn test_unmapped_record_fails() {
        let schemas = schemas();
        let links = links();
        let encoder = Encoder::new(&schemas, &links);

        let err = encoder
            .encode_collection(&[Fixture::Unmapped], "unmapped", &params(""), None)
            .unwrap_err();
        assert!(matches!(err, JsonApiError::Runtime { .. }));
    }

    #[test]
    fn test_collection_pagination_links() {
        let schemas = schemas();
        let links = links();
        let encoder = Encoder::new(&schemas, &links);

        let params = params("page[number]=1&page[size]=10&sort=-name");
        let pagination = PaginationParameters::from_page(params.page(), &PaginationDefaults::default())
            .unwrap()
            .with_total(100);

        let records: Vec<Fixture> = (0..10).map(|_| person("1", "Same")).collect();
        let document = encoder
            .encode_collection(&records, "people", &params, Some(&pagination))
            .unwrap();

        assert_eq!(document["data"].as_array().unwrap().len(), 10);
        assert_eq!(document["meta"]["total"], 100);
        assert_eq!(
            document["links"]["next"],
            "http://localhost/testing/v1/people?sort=-name&page%5Bnumber%5D=2&page%5Bsize%5D=10"
        );
        assert!(document["links"].get("prev").is_none());
        assert_eq!(
            document["links"]["last"],
            "http://localhost/testing/v1/people?sort=-name&page%5Bnumber%5D=10&page%5Bsize%5D=10"
        );
    }

    #[test]
    fn test_encode_relationship() {
        let schemas = schemas();
        let links = links();
        let encoder = Encoder::new(&schemas, &links);

        let post = post_with_shared_author();
        let related = RelatedData::ToMany(vec![Fixture::Comment {
            id: "100",
            author: Box::new(person("1", "Alice")),
        }]);

        let document = encoder.encode_relationship(&post, "comments", &related).unwrap();
        assert_eq!(document["data"], json!([{"type": "comments", "id": "100"}]));
        assert_eq!(
            document["links"]["self"],
            "http://localhost/testing/v1/posts/10/relationships/comments"
        );
    }

    #[test]
    fn test_encode_related() {
        let schemas = schemas();
        let links = links();
        let encoder = Encoder::new(&schemas, &links);

        let post = post_with_shared_author();
        let related = RelatedData::ToOne(None);
        let document = encoder
            .encode_related(&post, "author", &related, &params(""))
            .unwrap();
        assert_eq!(document["data"], Value::Null);
        assert_eq!(
            document["links"]["self"],
            "http://localhost/testing/v1/posts/10/author"
        );
    }

    #[test]
    fn test_encode_errors() {
        let schemas = schemas();
        let links = links();
        let encoder = Encoder::new(&schemas, &links);

        let document = encoder.encode_errors(&[
            JsonApiError::not_found("entities", "1"),
            JsonApiError::bad_request("bad"),
        ]);
        assert_eq!(document["errors"][0]["status"], "404");
        assert_eq!(document["errors"][1]["title"], "Bad Request");
    }
}
