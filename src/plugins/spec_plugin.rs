//! Specification plugin: schema-driven validation middleware plus the
//! processor that folds declared schemas into the document.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::document::{
    HeaderObject, Parameter, ParameterLocation, RequestBody, ResponsePatch, SpecDocument,
    StatusKey,
};
use crate::error::ValidationError;
use crate::plugin::{ApiPlugin, PluginInternals, RouteInfo};
use crate::schema::SchemaContract;
use crate::stash::HandlerId;
use crate::validate::{
    install_response_validation, validate_request, RequestContext, RequestSchemas,
    RequestSegment, ResponseContext, ResponseSchemaSet, ResponseSchemas, ResponseSegment,
    DEFAULT_REQUEST_ORDER, DEFAULT_RESPONSE_ORDER,
};

/// Validation behavior knobs for one plugin instance.
#[derive(Debug, Clone)]
pub struct SpecificationConfig {
    /// Request segments in validation order. Segments omitted here are
    /// neither validated nor documented.
    pub request_order: Vec<RequestSegment>,
    /// Response segments in validation order.
    pub response_order: Vec<ResponseSegment>,
    /// Documents schemas without enforcing them on requests.
    pub skip_request_validation: bool,
    /// Documents schemas without enforcing them on responses.
    pub skip_response_validation: bool,
}

impl Default for SpecificationConfig {
    fn default() -> Self {
        Self {
            request_order: DEFAULT_REQUEST_ORDER.to_vec(),
            response_order: DEFAULT_RESPONSE_ORDER.to_vec(),
            skip_request_validation: false,
            skip_response_validation: false,
        }
    }
}

/// Declarative schema bundle for one endpoint: request schemas keyed by
/// segment and response schemas keyed by status. Declaration order of
/// response statuses is preserved.
#[derive(Clone, Default)]
pub struct EndpointSchema {
    operation_id: Option<String>,
    request: Vec<(RequestSegment, Arc<dyn SchemaContract>)>,
    response: Vec<(String, ResponseSchemaSet)>,
}

impl EndpointSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation_id(mut self, id: &str) -> Self {
        self.operation_id = Some(id.to_string());
        self
    }

    /// Declares a request segment schema, replacing any earlier
    /// declaration for the same segment.
    pub fn request(mut self, segment: RequestSegment, schema: Arc<dyn SchemaContract>) -> Self {
        self.request.retain(|(s, _)| *s != segment);
        self.request.push((segment, schema));
        self
    }

    /// Declares a response body schema for a status key (`"200"`,
    /// `"default"`, ...).
    pub fn response_body(mut self, status: &str, schema: Arc<dyn SchemaContract>) -> Self {
        self.response_entry(status).body = Some(schema);
        self
    }

    /// Declares a response headers schema for a status key.
    pub fn response_headers(mut self, status: &str, schema: Arc<dyn SchemaContract>) -> Self {
        self.response_entry(status).headers = Some(schema);
        self
    }

    fn response_entry(&mut self, status: &str) -> &mut ResponseSchemaSet {
        if let Some(idx) = self.response.iter().position(|(s, _)| s == status) {
            return &mut self.response[idx].1;
        }
        self.response
            .push((status.to_string(), ResponseSchemaSet::default()));
        let last = self.response.len() - 1;
        &mut self.response[last].1
    }

    pub(crate) fn operation_id_ref(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    pub(crate) fn has_request(&self) -> bool {
        !self.request.is_empty()
    }

    pub(crate) fn has_response(&self) -> bool {
        !self.response.is_empty()
    }

    pub(crate) fn request_schema(
        &self,
        segment: RequestSegment,
    ) -> Option<&Arc<dyn SchemaContract>> {
        self.request
            .iter()
            .find(|(s, _)| *s == segment)
            .map(|(_, schema)| schema)
    }

    pub(crate) fn response_entries(&self) -> impl Iterator<Item = (&str, &ResponseSchemaSet)> {
        self.response.iter().map(|(s, set)| (s.as_str(), set))
    }

    pub(crate) fn contains_response(&self, status: &str) -> bool {
        self.response.iter().any(|(s, _)| s == status)
    }
}

impl std::fmt::Debug for EndpointSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let segments: Vec<_> = self.request.iter().map(|(s, _)| s).collect();
        let statuses: Vec<_> = self.response.iter().map(|(s, _)| s).collect();
        f.debug_struct("EndpointSchema")
            .field("operation_id", &self.operation_id)
            .field("request", &segments)
            .field("response", &statuses)
            .finish()
    }
}

/// The metadata the specification plugin stashes per middleware: the
/// declared schemas, reduced to the instance's segment order.
#[derive(Debug, Clone, Default)]
pub struct SpecInfo {
    pub operation_id: Option<String>,
    pub request: RequestSchemas,
    pub response: Arc<ResponseSchemas>,
}

impl SpecInfo {
    fn build(schema: &EndpointSchema, config: &SpecificationConfig) -> Self {
        let mut request = RequestSchemas::new();
        for &segment in &config.request_order {
            if let Some(s) = schema.request_schema(segment) {
                request.insert(segment, Arc::clone(s));
            }
        }
        let mut response = ResponseSchemas::new();
        for (status, set) in schema.response_entries() {
            response.insert(status, set.clone());
        }
        Self {
            operation_id: schema.operation_id_ref().map(str::to_string),
            request,
            response: Arc::new(response),
        }
    }
}

/// Per-endpoint validation middleware produced by
/// [`SpecificationPlugin::middleware`]. Its [`HandlerId`] is what the
/// routing-tree adapter binds on the terminal route.
#[derive(Debug, Clone)]
pub struct ValidationMiddleware {
    id: HandlerId,
    info: SpecInfo,
    request_order: Vec<RequestSegment>,
    response_order: Vec<ResponseSegment>,
    skip_request: bool,
    skip_response: bool,
}

impl ValidationMiddleware {
    /// Identity to bind on the route this middleware guards.
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Runs validation for one request/response exchange.
    ///
    /// The response hook is installed before request validation runs, so
    /// a handler that answers a failed request still gets its response
    /// checked. Request validation is fail-fast; see
    /// [`validate_request`].
    ///
    /// ## Errors
    ///
    /// Returns [`ValidationError::Request`] for the first failing
    /// request segment.
    pub fn handle(
        &self,
        req: &mut RequestContext,
        res: &mut ResponseContext,
    ) -> Result<(), ValidationError> {
        if !self.skip_response && !self.info.response.is_empty() {
            install_response_validation(
                res,
                Arc::clone(&self.info.response),
                self.response_order.clone(),
            );
        }

        if !self.skip_request && !self.info.request.is_empty() {
            validate_request(req, &self.info.request, &self.request_order)?;
        }

        Ok(())
    }
}

/// Schema-driven documentation and validation plugin.
#[derive(Debug, Clone, Default)]
pub struct SpecificationPlugin {
    config: SpecificationConfig,
}

impl SpecificationPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SpecificationConfig) -> Self {
        Self { config }
    }

    /// Builds validation middleware for one endpoint and stashes its
    /// schemas under the middleware's identity.
    pub fn middleware(
        &self,
        internals: &PluginInternals<SpecInfo>,
        schema: EndpointSchema,
    ) -> ValidationMiddleware {
        let info = SpecInfo::build(&schema, &self.config);
        let middleware = ValidationMiddleware {
            id: HandlerId::next(),
            info: info.clone(),
            request_order: self.config.request_order.clone(),
            response_order: self.config.response_order.clone(),
            skip_request: self.config.skip_request_validation || !schema.has_request(),
            skip_response: self.config.skip_response_validation || !schema.has_response(),
        };
        internals.stash().store(middleware.id, info);
        middleware
    }
}

impl ApiPlugin for SpecificationPlugin {
    type Metadata = SpecInfo;

    fn name(&self) -> &str {
        "schema-spec"
    }

    fn process_route(&self, doc: &mut SpecDocument, metadata: &SpecInfo, route: &RouteInfo) {
        process_spec_info(doc, metadata, route);
    }
}

/// Folds one stashed [`SpecInfo`] into the document for the operation at
/// `route`. Shared between the specification and endpoint plugins.
pub(crate) fn process_spec_info(doc: &mut SpecDocument, info: &SpecInfo, route: &RouteInfo) {
    if let Some(id) = &info.operation_id {
        doc.set_operation_id(&route.path, &route.method, id);
    }

    for (segment, schema) in info.request.entries() {
        if segment == RequestSegment::Body {
            doc.set_request_body(&route.path, &route.method, RequestBody::json(schema.introspect()));
            continue;
        }

        let location = match segment {
            RequestSegment::Params => ParameterLocation::Path,
            RequestSegment::Query => ParameterLocation::Query,
            RequestSegment::Headers => ParameterLocation::Header,
            RequestSegment::Cookies | RequestSegment::SignedCookies => ParameterLocation::Cookie,
            RequestSegment::Body => unreachable!("body handled above"),
        };

        let shape = schema.introspect();
        let Some(properties) = shape.get("properties").and_then(|p| p.as_object()) else {
            debug!(
                segment = segment.as_str(),
                "segment schema exposes no properties, skipping parameters"
            );
            continue;
        };
        let required: Vec<&str> = shape
            .get("required")
            .and_then(|r| r.as_array())
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        for (name, prop) in properties {
            doc.add_parameter(
                &route.path,
                &route.method,
                Parameter {
                    name: name.clone(),
                    location,
                    required: required.contains(&name.as_str()),
                    schema: prop.clone(),
                },
            );
        }
    }

    for (status, set) in info.response.entries() {
        let Some(key) = StatusKey::parse(status) else {
            debug!(status, "ignoring non-status response key");
            continue;
        };

        if let Some(body) = &set.body {
            doc.merge_response(
                &route.path,
                &route.method,
                key,
                ResponsePatch::json_body(body.introspect()),
            );
        }

        if let Some(headers_schema) = &set.headers {
            let shape = headers_schema.introspect();
            if let Some(properties) = shape.get("properties").and_then(|p| p.as_object()) {
                let required: Vec<&str> = shape
                    .get("required")
                    .and_then(|r| r.as_array())
                    .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
                    .unwrap_or_default();

                let headers: BTreeMap<String, HeaderObject> = properties
                    .iter()
                    .map(|(name, prop)| {
                        (
                            name.clone(),
                            HeaderObject {
                                required: required.contains(&name.as_str()),
                                schema: prop.clone(),
                            },
                        )
                    })
                    .collect();

                doc.merge_response(&route.path, &route.method, key, ResponsePatch::headers(headers));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::schema::JsonSchema;

    use super::*;

    fn schema(value: Value) -> Arc<dyn SchemaContract> {
        Arc::new(JsonSchema::new(value).unwrap())
    }

    fn route() -> RouteInfo {
        RouteInfo {
            path: "/items/{id}".to_string(),
            method: "post".to_string(),
        }
    }

    fn doc_with_operation() -> SpecDocument {
        let mut doc = SpecDocument::new();
        doc.set_path_item("/items/{id}");
        doc.ensure_operation("/items/{id}", "post");
        doc
    }

    #[test]
    fn test_params_become_path_parameters() {
        let internals = PluginInternals::new();
        let plugin = SpecificationPlugin::new();
        let mw = plugin.middleware(
            &internals,
            EndpointSchema::new().request(
                RequestSegment::Params,
                schema(json!({
                    "type": "object",
                    "properties": {"id": {"type": "integer"}},
                    "required": ["id"]
                })),
            ),
        );

        let mut doc = doc_with_operation();
        let info = internals
            .stash()
            .get(mw.id())
            .unwrap_or_else(|| panic!("middleware metadata not stashed"));
        process_spec_info(&mut doc, &info, &route());

        let op = doc.operation("/items/{id}", "post").unwrap();
        assert_eq!(op.parameters.len(), 1);
        assert_eq!(op.parameters[0].name, "id");
        assert_eq!(op.parameters[0].location, ParameterLocation::Path);
        assert!(op.parameters[0].required);
    }

    #[test]
    fn test_body_schema_becomes_request_body() {
        let internals = PluginInternals::new();
        let plugin = SpecificationPlugin::new();
        let body = json!({"type": "object", "properties": {"name": {"type": "string"}}});
        let mw = plugin.middleware(
            &internals,
            EndpointSchema::new().request(RequestSegment::Body, schema(body.clone())),
        );

        let mut doc = doc_with_operation();
        let info = internals.stash().get(mw.id()).unwrap();
        process_spec_info(&mut doc, &info, &route());

        let op = doc.operation("/items/{id}", "post").unwrap();
        let request_body = op.request_body.as_ref().unwrap();
        assert_eq!(request_body.content["application/json"].schema, body);
    }

    #[test]
    fn test_response_body_and_headers_merge() {
        let internals = PluginInternals::new();
        let plugin = SpecificationPlugin::new();
        let mw = plugin.middleware(
            &internals,
            EndpointSchema::new()
                .response_body("200", schema(json!({"type": "object"})))
                .response_headers(
                    "200",
                    schema(json!({
                        "type": "object",
                        "properties": {"x-request-id": {"type": "string"}},
                        "required": ["x-request-id"]
                    })),
                ),
        );

        let mut doc = doc_with_operation();
        let info = internals.stash().get(mw.id()).unwrap();
        process_spec_info(&mut doc, &info, &route());

        let response = doc
            .response("/items/{id}", "post", StatusKey::Code(200))
            .unwrap();
        assert!(response.content.is_some());
        assert!(response.headers["x-request-id"].required);
    }

    #[test]
    fn test_segments_outside_order_are_not_documented() {
        let config = SpecificationConfig {
            request_order: vec![RequestSegment::Query],
            ..SpecificationConfig::default()
        };
        let internals = PluginInternals::new();
        let plugin = SpecificationPlugin::with_config(config);
        let mw = plugin.middleware(
            &internals,
            EndpointSchema::new().request(
                RequestSegment::Headers,
                schema(json!({
                    "type": "object",
                    "properties": {"x-api-key": {"type": "string"}}
                })),
            ),
        );

        let mut doc = doc_with_operation();
        let info = internals.stash().get(mw.id()).unwrap();
        process_spec_info(&mut doc, &info, &route());

        let op = doc.operation("/items/{id}", "post").unwrap();
        assert!(op.parameters.is_empty());
    }

    #[test]
    fn test_middleware_skips_validation_when_no_schemas_declared() {
        let internals = PluginInternals::new();
        let plugin = SpecificationPlugin::new();
        let mw = plugin.middleware(&internals, EndpointSchema::new());

        let mut req = RequestContext::new();
        let mut res = ResponseContext::new();
        mw.handle(&mut req, &mut res).unwrap();
        assert!(!res.has_pending_validation());
    }

    #[test]
    fn test_middleware_installs_response_hook_before_request_validation() {
        let internals = PluginInternals::new();
        let plugin = SpecificationPlugin::new();
        let mw = plugin.middleware(
            &internals,
            EndpointSchema::new()
                .request(
                    RequestSegment::Query,
                    schema(json!({"type": "object", "required": ["q"]})),
                )
                .response_body("default", schema(json!({"type": "object"}))),
        );

        let mut req = RequestContext::new();
        let mut res = ResponseContext::new();
        assert!(mw.handle(&mut req, &mut res).is_err());
        // hook is installed even though request validation failed
        assert!(res.has_pending_validation());
    }
}
