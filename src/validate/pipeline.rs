//! Validation pipeline: schema sets and the ordered fail-fast runner.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ValidationError;
use crate::schema::SchemaContract;

use super::context::{RequestContext, ResponseContext};
use super::{RequestSegment, ResponseSegment};

/// Request schemas keyed by segment, held in validation order.
#[derive(Clone, Default)]
pub struct RequestSchemas {
    entries: Vec<(RequestSegment, Arc<dyn SchemaContract>)>,
}

impl RequestSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a segment schema, replacing any earlier entry for the same
    /// segment.
    pub fn insert(&mut self, segment: RequestSegment, schema: Arc<dyn SchemaContract>) {
        self.entries.retain(|(s, _)| *s != segment);
        self.entries.push((segment, schema));
    }

    pub fn get(&self, segment: RequestSegment) -> Option<&Arc<dyn SchemaContract>> {
        self.entries
            .iter()
            .find(|(s, _)| *s == segment)
            .map(|(_, schema)| schema)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (RequestSegment, &Arc<dyn SchemaContract>)> {
        self.entries.iter().map(|(s, schema)| (*s, schema))
    }
}

impl fmt::Debug for RequestSchemas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let segments: Vec<_> = self.entries.iter().map(|(s, _)| s).collect();
        f.debug_struct("RequestSchemas")
            .field("segments", &segments)
            .finish()
    }
}

/// Body and header schemas for one response status.
#[derive(Clone, Default)]
pub struct ResponseSchemaSet {
    pub body: Option<Arc<dyn SchemaContract>>,
    pub headers: Option<Arc<dyn SchemaContract>>,
}

impl fmt::Debug for ResponseSchemaSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseSchemaSet")
            .field("body", &self.body.is_some())
            .field("headers", &self.headers.is_some())
            .finish()
    }
}

/// Response schema sets keyed by status (`"200"`, `"default"`, ...), held
/// in declaration order.
#[derive(Clone, Default)]
pub struct ResponseSchemas {
    entries: Vec<(String, ResponseSchemaSet)>,
}

impl ResponseSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a status entry, replacing any earlier entry for the same
    /// key.
    pub fn insert(&mut self, status: impl Into<String>, set: ResponseSchemaSet) {
        let status = status.into();
        self.entries.retain(|(s, _)| *s != status);
        self.entries.push((status, set));
    }

    /// Schema set for a concrete status code: an exact match on the
    /// numeric key, falling back to the `"default"` entry.
    pub fn lookup(&self, status: u16) -> Option<&ResponseSchemaSet> {
        let key = status.to_string();
        self.entries
            .iter()
            .find(|(s, _)| *s == key)
            .or_else(|| self.entries.iter().find(|(s, _)| s == "default"))
            .map(|(_, set)| set)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, status: &str) -> bool {
        self.entries.iter().any(|(s, _)| s == status)
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ResponseSchemaSet)> {
        self.entries.iter().map(|(s, set)| (s.as_str(), set))
    }
}

impl fmt::Debug for ResponseSchemas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let statuses: Vec<_> = self.entries.iter().map(|(s, _)| s).collect();
        f.debug_struct("ResponseSchemas")
            .field("statuses", &statuses)
            .finish()
    }
}

/// Validates request segments in `order`, fail-fast.
///
/// Each segment with a schema is validated in turn; a passing segment's
/// coerced value is written back into the context before the next one
/// runs. Segments without a schema are skipped. Segments carrying a
/// schema but absent from `order` are never validated.
///
/// ## Errors
///
/// Returns [`ValidationError::Request`] for the first failing segment.
/// Segments validated before the failure keep their coerced values;
/// later segments are untouched.
pub fn validate_request(
    req: &mut RequestContext,
    schemas: &RequestSchemas,
    order: &[RequestSegment],
) -> Result<(), ValidationError> {
    for &segment in order {
        let Some(schema) = schemas.get(segment) else {
            continue;
        };
        match schema.validate(req.segment(segment)) {
            Ok(coerced) => {
                debug!(segment = segment.as_str(), "request segment validated");
                req.set_segment(segment, coerced);
            }
            Err(detail) => {
                warn!(
                    segment = segment.as_str(),
                    error = %detail,
                    "request segment failed validation"
                );
                return Err(ValidationError::Request { segment, detail });
            }
        }
    }
    Ok(())
}

/// Installs the single-use response validation hook on `res`.
///
/// The hook runs on the first send only; see
/// [`ResponseContext::send_json`].
pub fn install_response_validation(
    res: &mut ResponseContext,
    schemas: Arc<ResponseSchemas>,
    order: Vec<ResponseSegment>,
) {
    res.install_validation(ResponseValidation { schemas, order });
}

/// Pending response validation, consumed by the first send.
#[derive(Debug)]
pub(crate) struct ResponseValidation {
    schemas: Arc<ResponseSchemas>,
    order: Vec<ResponseSegment>,
}

impl ResponseValidation {
    /// Validates the outgoing payload against the schema set for
    /// `status`, returning the coerced body. Header coercions are
    /// checked but not written back; headers go out as set.
    pub(crate) fn run(
        self,
        status: u16,
        headers: &Value,
        body: Value,
    ) -> Result<Value, ValidationError> {
        let Some(set) = self.schemas.lookup(status) else {
            warn!(status, "no response schema declared for status");
            return Err(ValidationError::MissingResponseSchema { status });
        };

        let mut out = body;
        for segment in &self.order {
            match segment {
                ResponseSegment::Body => {
                    if let Some(schema) = &set.body {
                        out = schema.validate(&out).map_err(|detail| {
                            ValidationError::Response {
                                segment: ResponseSegment::Body,
                                detail,
                            }
                        })?;
                    }
                }
                ResponseSegment::Headers => {
                    if let Some(schema) = &set.headers {
                        schema.validate(headers).map_err(|detail| {
                            ValidationError::Response {
                                segment: ResponseSegment::Headers,
                                detail,
                            }
                        })?;
                    }
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::schema::JsonSchema;

    use super::*;

    fn schema(value: Value) -> Arc<dyn SchemaContract> {
        Arc::new(JsonSchema::new(value).unwrap())
    }

    #[test]
    fn test_fail_fast_preserves_earlier_coercions() {
        let mut schemas = RequestSchemas::new();
        schemas.insert(
            RequestSegment::Query,
            schema(json!({
                "type": "object",
                "properties": {"limit": {"type": "integer"}}
            })),
        );
        schemas.insert(
            RequestSegment::Body,
            schema(json!({"type": "object", "required": ["name"]})),
        );

        let mut req = RequestContext::new()
            .with_segment(RequestSegment::Query, json!({"limit": "25"}))
            .with_segment(RequestSegment::Body, json!({}));

        let err = validate_request(&mut req, &schemas, &super::super::DEFAULT_REQUEST_ORDER)
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Request {
                segment: RequestSegment::Body,
                ..
            }
        ));
        // query was validated first and keeps its coerced value
        assert_eq!(req.segment(RequestSegment::Query), &json!({"limit": 25}));
    }

    #[test]
    fn test_order_controls_which_segment_fails_first() {
        let mut schemas = RequestSchemas::new();
        schemas.insert(
            RequestSegment::Query,
            schema(json!({"type": "object", "required": ["q"]})),
        );
        schemas.insert(
            RequestSegment::Body,
            schema(json!({"type": "object", "required": ["name"]})),
        );

        let mut req = RequestContext::new();
        let err = validate_request(
            &mut req,
            &schemas,
            &[RequestSegment::Body, RequestSegment::Query],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Request {
                segment: RequestSegment::Body,
                ..
            }
        ));
    }

    #[test]
    fn test_segment_absent_from_order_is_skipped() {
        let mut schemas = RequestSchemas::new();
        schemas.insert(
            RequestSegment::Headers,
            schema(json!({"type": "object", "required": ["x-api-key"]})),
        );

        let mut req = RequestContext::new();
        validate_request(&mut req, &schemas, &[RequestSegment::Query]).unwrap();
    }

    #[test]
    fn test_status_fallback_to_default() {
        let mut schemas = ResponseSchemas::new();
        schemas.insert(
            "200",
            ResponseSchemaSet {
                body: Some(schema(json!({"type": "object"}))),
                headers: None,
            },
        );
        schemas.insert(
            "default",
            ResponseSchemaSet {
                body: Some(schema(json!({"type": "string"}))),
                headers: None,
            },
        );

        assert!(schemas.lookup(200).unwrap().body.is_some());
        // 404 has no exact entry; the default applies
        let fallback = schemas.lookup(404).unwrap();
        let validated = fallback
            .body
            .as_ref()
            .unwrap()
            .validate(&json!("not found"))
            .unwrap();
        assert_eq!(validated, json!("not found"));
    }

    #[test]
    fn test_missing_schema_for_status() {
        let mut res = ResponseContext::new();
        let mut schemas = ResponseSchemas::new();
        schemas.insert(
            "201",
            ResponseSchemaSet {
                body: Some(schema(json!({"type": "object"}))),
                headers: None,
            },
        );
        install_response_validation(
            &mut res,
            Arc::new(schemas),
            super::super::DEFAULT_RESPONSE_ORDER.to_vec(),
        );

        res.set_status(500);
        let err = res.send_json(json!({"error": "boom"})).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingResponseSchema { status: 500 }
        ));
        // nothing was sent and the hook is gone
        assert!(!res.is_sent());
        assert!(!res.has_pending_validation());
    }

    #[test]
    fn test_second_send_bypasses_validation() {
        let mut res = ResponseContext::new();
        let mut schemas = ResponseSchemas::new();
        schemas.insert(
            "200",
            ResponseSchemaSet {
                body: Some(schema(json!({"type": "object", "required": ["id"]}))),
                headers: None,
            },
        );
        install_response_validation(
            &mut res,
            Arc::new(schemas),
            super::super::DEFAULT_RESPONSE_ORDER.to_vec(),
        );

        assert!(res.send_json(json!({})).is_err());
        // the hook was consumed; an error payload can still go out
        res.set_status(500);
        res.send_json(json!({"error": "invalid response"})).unwrap();
        assert!(res.is_sent());
    }

    #[test]
    fn test_response_headers_validated_not_coerced() {
        let mut res = ResponseContext::new();
        res.set_header("x-count", "3");

        let mut schemas = ResponseSchemas::new();
        schemas.insert(
            "200",
            ResponseSchemaSet {
                body: None,
                headers: Some(schema(json!({
                    "type": "object",
                    "properties": {"x-count": {"type": "integer"}}
                }))),
            },
        );
        install_response_validation(
            &mut res,
            Arc::new(schemas),
            super::super::DEFAULT_RESPONSE_ORDER.to_vec(),
        );

        res.send_json(json!(null)).unwrap();
        // header stays a string on the wire; coercion applied only for the check
        assert_eq!(res.headers().get("x-count"), Some(&json!("3")));
    }
}
