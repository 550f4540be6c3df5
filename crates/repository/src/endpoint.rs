//! Request boundary.
//!
//! [`Endpoint`] turns list, fetch, create, update and delete requests into
//! `(status, document)` responses. Checks run in a fixed order so the
//! cheapest failure wins: media type negotiation (406), resource type
//! resolution (404), permission (403), query parameters (400), record
//! existence (404), request body (422), and only then the adapter call.

use http::StatusCode;
use jsonapi_document::{
    Encoder, EncodingParameters, JsonApiConfig, JsonApiError, JsonApiResult, LinkBuilder,
    MEDIA_TYPE, PaginationParameters, Record, RequestDocument, ResourceInput, ResourceObject,
    SchemaContainer, check_accept, check_content_type,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::access::{Operation, Permissions};
use crate::container::AdapterContainer;

/// An inbound request, reduced to what the engine reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonApiRequest {
    /// Raw query string, without the leading `?`.
    pub query: String,
    /// `Accept` header value.
    pub accept: Option<String>,
    /// `Content-Type` header value.
    pub content_type: Option<String>,
    /// Request body.
    pub body: Vec<u8>,
}

impl JsonApiRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the query string.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Sets the `Accept` header.
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Sets the `Content-Type` header.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the raw body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON:API document as the body, with the matching content type.
    pub fn with_document(self, document: &Value) -> Self {
        self.with_content_type(MEDIA_TYPE)
            .with_body(document.to_string())
    }
}

/// The outcome of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonApiResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response document, absent for `204 No Content`.
    pub document: Option<Value>,
    /// URL of a newly created resource.
    pub location: Option<String>,
}

impl JsonApiResponse {
    /// `200 OK` with a document.
    pub fn ok(document: Value) -> Self {
        Self {
            status: StatusCode::OK,
            document: Some(document),
            location: None,
        }
    }

    /// `201 Created` with a document and the new resource's URL.
    pub fn created(document: Value, location: String) -> Self {
        Self {
            status: StatusCode::CREATED,
            document: Some(document),
            location: Some(location),
        }
    }

    /// `204 No Content`.
    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            document: None,
            location: None,
        }
    }

    /// An error document with the error's status.
    pub fn error(error: &JsonApiError, document: Value) -> Self {
        Self {
            status: error.status(),
            document: Some(document),
            location: None,
        }
    }

    /// Hands the status and document to a transport.
    pub fn send_to<S: ResponseSink + ?Sized>(self, sink: &mut S) {
        sink.send(self.status, self.document);
    }
}

/// Accepts finished responses on behalf of the transport.
pub trait ResponseSink {
    /// Delivers a status code and optional document.
    fn send(&mut self, status: StatusCode, document: Option<Value>);
}

/// Serves JSON:API requests against registered adapters and schemas.
pub struct Endpoint<R> {
    adapters: AdapterContainer<R>,
    schemas: SchemaContainer<R>,
    permissions: Permissions,
    config: JsonApiConfig,
    links: LinkBuilder,
}

impl<R: Record> Endpoint<R> {
    /// Creates an endpoint with full access permissions.
    ///
    /// # Errors
    ///
    /// Returns `Runtime` if the configured base URL is invalid.
    pub fn new(
        adapters: AdapterContainer<R>,
        schemas: SchemaContainer<R>,
        config: JsonApiConfig,
    ) -> JsonApiResult<Self> {
        let links = LinkBuilder::new(&config.base_url)?;
        Ok(Self {
            adapters,
            schemas,
            permissions: Permissions::full_access(),
            config,
            links,
        })
    }

    /// Replaces the permissions.
    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &JsonApiConfig {
        &self.config
    }

    /// Returns the adapter container.
    pub fn adapters(&self) -> &AdapterContainer<R> {
        &self.adapters
    }

    /// `GET /{type}`
    pub async fn list(&self, resource_type: &str, request: &JsonApiRequest) -> JsonApiResponse {
        debug!(
            resource_type = %resource_type,
            query = %request.query,
            "Processing list request"
        );
        let result = self.try_list(resource_type, request).await;
        self.respond(result)
    }

    /// `GET /{type}/{id}`
    pub async fn fetch(
        &self,
        resource_type: &str,
        id: &str,
        request: &JsonApiRequest,
    ) -> JsonApiResponse {
        debug!(resource_type = %resource_type, id = %id, "Processing fetch request");
        let result = self.try_fetch(resource_type, id, request).await;
        self.respond(result)
    }

    /// `GET /{type}/{id}/{field}`
    pub async fn fetch_related(
        &self,
        resource_type: &str,
        id: &str,
        field: &str,
        request: &JsonApiRequest,
    ) -> JsonApiResponse {
        debug!(
            resource_type = %resource_type,
            id = %id,
            field = %field,
            "Processing related request"
        );
        let result = self
            .try_fetch_related(resource_type, id, field, request, false)
            .await;
        self.respond(result)
    }

    /// `GET /{type}/{id}/relationships/{field}`
    pub async fn fetch_relationship(
        &self,
        resource_type: &str,
        id: &str,
        field: &str,
        request: &JsonApiRequest,
    ) -> JsonApiResponse {
        debug!(
            resource_type = %resource_type,
            id = %id,
            field = %field,
            "Processing relationship request"
        );
        let result = self
            .try_fetch_related(resource_type, id, field, request, true)
            .await;
        self.respond(result)
    }

    /// `POST /{type}`
    pub async fn create(&self, resource_type: &str, request: &JsonApiRequest) -> JsonApiResponse {
        debug!(resource_type = %resource_type, "Processing create request");
        let result = self.try_create(resource_type, request).await;
        self.respond(result)
    }

    /// `PATCH /{type}/{id}`
    pub async fn update(
        &self,
        resource_type: &str,
        id: &str,
        request: &JsonApiRequest,
    ) -> JsonApiResponse {
        debug!(resource_type = %resource_type, id = %id, "Processing update request");
        let result = self.try_update(resource_type, id, request).await;
        self.respond(result)
    }

    /// `DELETE /{type}/{id}`
    pub async fn delete(
        &self,
        resource_type: &str,
        id: &str,
        request: &JsonApiRequest,
    ) -> JsonApiResponse {
        debug!(resource_type = %resource_type, id = %id, "Processing delete request");
        let result = self.try_delete(resource_type, id, request).await;
        self.respond(result)
    }

    async fn try_list(
        &self,
        resource_type: &str,
        request: &JsonApiRequest,
    ) -> JsonApiResult<JsonApiResponse> {
        check_accept(request.accept.as_deref())?;
        let adapter = self.adapters.adapter(resource_type)?;
        self.permissions.check(Operation::List, resource_type)?;
        let params = self.parameters(request, resource_type)?;
        let pagination =
            PaginationParameters::from_page(params.page(), &self.config.pagination_defaults())?;

        let result = adapter.query(&params, &pagination).await?;
        let pagination = pagination.with_total(result.total);

        let document = self.encoder().encode_collection(
            &result.records,
            resource_type,
            &params,
            Some(&pagination),
        )?;
        Ok(JsonApiResponse::ok(document))
    }

    async fn try_fetch(
        &self,
        resource_type: &str,
        id: &str,
        request: &JsonApiRequest,
    ) -> JsonApiResult<JsonApiResponse> {
        check_accept(request.accept.as_deref())?;
        let adapter = self.adapters.adapter(resource_type)?;
        self.permissions.check(Operation::Read, resource_type)?;
        let params = self.parameters(request, resource_type)?;

        let record = adapter
            .read(id, &params)
            .await?
            .ok_or_else(|| JsonApiError::not_found(resource_type, id))?;

        let document = self.encoder().encode_resource(Some(&record), &params)?;
        Ok(JsonApiResponse::ok(document))
    }

    async fn try_fetch_related(
        &self,
        resource_type: &str,
        id: &str,
        field: &str,
        request: &JsonApiRequest,
        linkage_only: bool,
    ) -> JsonApiResult<JsonApiResponse> {
        check_accept(request.accept.as_deref())?;
        let adapter = self.adapters.adapter(resource_type)?;
        self.permissions.check(Operation::Read, resource_type)?;
        let relationship = adapter.related(field)?;
        let params = if linkage_only {
            self.parameters(request, resource_type)?
        } else {
            self.parameters(request, relationship.related_type())?
        };

        let record = adapter
            .find(id)
            .await?
            .ok_or_else(|| JsonApiError::not_found(resource_type, id))?;
        let related = relationship.query(&record, &self.adapters).await?;

        let encoder = self.encoder();
        let document = if linkage_only {
            encoder.encode_relationship(&record, field, &related)?
        } else {
            encoder.encode_related(&record, field, &related, &params)?
        };
        Ok(JsonApiResponse::ok(document))
    }

    async fn try_create(
        &self,
        resource_type: &str,
        request: &JsonApiRequest,
    ) -> JsonApiResult<JsonApiResponse> {
        check_accept(request.accept.as_deref())?;
        check_content_type(request.content_type.as_deref())?;
        let adapter = self.adapters.adapter(resource_type)?;
        self.permissions.check(Operation::Create, resource_type)?;
        let params = self.parameters(request, resource_type)?;

        let document = RequestDocument::parse(&request.body)?;
        let resource = document.data();
        ensure_type(resource, resource_type)?;
        let input = ResourceInput::from_resource(resource)?;
        if input.id.is_some() && !self.config.client_generated_ids {
            return Err(JsonApiError::forbidden(
                "Client-generated ids are not supported",
            ));
        }

        let record = adapter.create(input, resource, &params).await?;
        let identifier = self.schemas.identifier(&record)?;
        debug!(resource = %identifier, "Resource created");

        let document = self.encoder().encode_resource(Some(&record), &params)?;
        Ok(JsonApiResponse::created(
            document,
            self.links
                .resource(&identifier.resource_type, &identifier.id),
        ))
    }

    async fn try_update(
        &self,
        resource_type: &str,
        id: &str,
        request: &JsonApiRequest,
    ) -> JsonApiResult<JsonApiResponse> {
        check_accept(request.accept.as_deref())?;
        check_content_type(request.content_type.as_deref())?;
        let adapter = self.adapters.adapter(resource_type)?;
        self.permissions.check(Operation::Update, resource_type)?;
        let params = self.parameters(request, resource_type)?;

        let record = adapter
            .find(id)
            .await?
            .ok_or_else(|| JsonApiError::not_found(resource_type, id))?;

        let document = RequestDocument::parse(&request.body)?;
        let resource = document.data();
        ensure_type(resource, resource_type)?;
        match resource.id()? {
            Some(body_id) if body_id == id => {}
            Some(body_id) => {
                return Err(JsonApiError::unprocessable(format!(
                    "Resource id '{}' does not match the requested id '{}'",
                    body_id, id
                )));
            }
            None => {
                return Err(JsonApiError::unprocessable(
                    "Resource 'id' member is required for updates",
                ));
            }
        }

        // Malformed linkage is rejected here rather than by the adapter.
        ResourceInput::from_resource(resource)?;

        let updated = adapter.update(record, resource, &params).await?;
        let document = self.encoder().encode_resource(Some(&updated), &params)?;
        Ok(JsonApiResponse::ok(document))
    }

    async fn try_delete(
        &self,
        resource_type: &str,
        id: &str,
        request: &JsonApiRequest,
    ) -> JsonApiResult<JsonApiResponse> {
        check_accept(request.accept.as_deref())?;
        let adapter = self.adapters.adapter(resource_type)?;
        self.permissions.check(Operation::Delete, resource_type)?;
        let params = self.parameters(request, resource_type)?;

        let record = adapter
            .find(id)
            .await?
            .ok_or_else(|| JsonApiError::not_found(resource_type, id))?;
        adapter.delete(record, &params).await?;

        debug!(resource_type = %resource_type, id = %id, "Resource deleted");
        Ok(JsonApiResponse::no_content())
    }

    /// Parses the query and checks its include paths against the schemas of
    /// `primary_type`.
    fn parameters(
        &self,
        request: &JsonApiRequest,
        primary_type: &str,
    ) -> JsonApiResult<EncodingParameters> {
        let params = EncodingParameters::parse(&request.query, self.config.max_include_depth)?;
        self.schemas.validate_include(primary_type, params.include())?;
        Ok(params)
    }

    fn encoder(&self) -> Encoder<'_, R> {
        Encoder::new(&self.schemas, &self.links)
    }

    fn respond(&self, result: JsonApiResult<JsonApiResponse>) -> JsonApiResponse {
        match result {
            Ok(response) => response,
            Err(error) => {
                if error.status().is_server_error() {
                    warn!(error = %error, "Request failed");
                } else {
                    debug!(status = %error.status(), error = %error, "Request rejected");
                }
                let document = self.encoder().encode_errors(std::slice::from_ref(&error));
                JsonApiResponse::error(&error, document)
            }
        }
    }
}

fn ensure_type(resource: &ResourceObject, resource_type: &str) -> JsonApiResult<()> {
    let body_type = resource.resource_type()?;
    if body_type != resource_type {
        return Err(JsonApiError::unprocessable(format!(
            "Resource type '{}' does not match the endpoint type '{}'",
            body_type, resource_type
        )));
    }
    Ok(())
}
