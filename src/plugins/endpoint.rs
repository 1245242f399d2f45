//! Endpoint plugin: the specification plugin plus endpoint conveniences.
//!
//! On top of the plain validation middleware, the endpoint flavor tracks
//! an implicit success status (the last declared 2xx other than 200) and
//! adds an accept-anything `default` response whenever statuses are
//! declared without one, so unexpected statuses never trip the missing
//! schema check.

use std::sync::Arc;

use crate::document::SpecDocument;
use crate::plugin::{ApiPlugin, PluginInternals, RouteInfo};
use crate::schema::AnySchema;
use crate::stash::HandlerId;
use crate::validate::{RequestContext, ResponseContext};
use crate::error::ValidationError;

use super::spec_plugin::{
    process_spec_info, EndpointSchema, SpecInfo, SpecificationConfig, SpecificationPlugin,
    ValidationMiddleware,
};

/// Validation middleware plus the endpoint's implicit success status.
#[derive(Debug, Clone)]
pub struct EndpointMiddleware {
    inner: ValidationMiddleware,
    default_status: u16,
}

impl EndpointMiddleware {
    /// Identity to bind on the route this middleware guards.
    pub fn id(&self) -> HandlerId {
        self.inner.id()
    }

    /// The status a handler gets when it returns a value without setting
    /// one explicitly.
    pub fn default_status(&self) -> u16 {
        self.default_status
    }

    /// Replaces a still-untouched 200 with the endpoint's implicit
    /// success status. Adapters call this after the handler returns a
    /// value but before the send.
    pub fn apply_default_status(&self, res: &mut ResponseContext) {
        if res.status() == 200 {
            res.set_status(self.default_status);
        }
    }

    /// Runs validation for one exchange; see
    /// [`ValidationMiddleware::handle`].
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
        self.inner.handle(req, res)
    }
}

/// Endpoint-flavored wrapper around [`SpecificationPlugin`].
#[derive(Debug, Clone, Default)]
pub struct EndpointPlugin {
    inner: SpecificationPlugin,
}

impl EndpointPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SpecificationConfig) -> Self {
        Self {
            inner: SpecificationPlugin::with_config(config),
        }
    }

    /// Builds endpoint middleware for one declared schema.
    ///
    /// The last declared 2xx status other than 200 becomes the implicit
    /// success status. If any response status is declared without a
    /// `"default"` entry, an accept-anything default body is added.
    pub fn middleware(
        &self,
        internals: &PluginInternals<SpecInfo>,
        schema: EndpointSchema,
    ) -> EndpointMiddleware {
        let mut default_status = 200;
        for (status, _) in schema.response_entries() {
            if let Ok(code) = status.parse::<u16>() {
                if code > 200 && code < 300 {
                    default_status = code;
                }
            }
        }

        let schema = if schema.has_response() && !schema.contains_response("default") {
            schema.response_body("default", Arc::new(AnySchema))
        } else {
            schema
        };

        EndpointMiddleware {
            inner: self.inner.middleware(internals, schema),
            default_status,
        }
    }
}

impl ApiPlugin for EndpointPlugin {
    type Metadata = SpecInfo;

    fn name(&self) -> &str {
        "schema-endpoint"
    }

    fn process_route(&self, doc: &mut SpecDocument, metadata: &SpecInfo, route: &RouteInfo) {
        process_spec_info(doc, metadata, route);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::schema::{JsonSchema, SchemaContract};
    use crate::validate::ResponseSegment;

    use super::*;

    fn schema(value: Value) -> Arc<dyn SchemaContract> {
        Arc::new(JsonSchema::new(value).unwrap())
    }

    #[test]
    fn test_last_declared_2xx_wins_as_default_status() {
        let internals = PluginInternals::new();
        let plugin = EndpointPlugin::new();
        let mw = plugin.middleware(
            &internals,
            EndpointSchema::new()
                .response_body("201", schema(json!({"type": "object"})))
                .response_body("204", schema(json!({"type": "null"}))),
        );
        assert_eq!(mw.default_status(), 204);
    }

    #[test]
    fn test_plain_200_keeps_default_status() {
        let internals = PluginInternals::new();
        let plugin = EndpointPlugin::new();
        let mw = plugin.middleware(
            &internals,
            EndpointSchema::new().response_body("200", schema(json!({"type": "object"}))),
        );
        assert_eq!(mw.default_status(), 200);
    }

    #[test]
    fn test_apply_default_status_only_overrides_untouched_200() {
        let internals = PluginInternals::new();
        let plugin = EndpointPlugin::new();
        let mw = plugin.middleware(
            &internals,
            EndpointSchema::new().response_body("201", schema(json!({"type": "object"}))),
        );

        let mut res = ResponseContext::new();
        mw.apply_default_status(&mut res);
        assert_eq!(res.status(), 201);

        let mut explicit = ResponseContext::new();
        explicit.set_status(418);
        mw.apply_default_status(&mut explicit);
        assert_eq!(explicit.status(), 418);
    }

    #[test]
    fn test_auto_default_response_accepts_unexpected_status() {
        let internals = PluginInternals::new();
        let plugin = EndpointPlugin::new();
        let mw = plugin.middleware(
            &internals,
            EndpointSchema::new().response_body(
                "201",
                schema(json!({"type": "object", "required": ["id"]})),
            ),
        );

        let mut req = RequestContext::new();
        let mut res = ResponseContext::new();
        mw.handle(&mut req, &mut res).unwrap();

        // 500 has no declared schema; the auto-added default accepts it
        res.set_status(500);
        res.send_json(json!({"error": "boom"})).unwrap();
        assert!(res.is_sent());
    }

    #[test]
    fn test_declared_default_is_not_replaced() {
        let internals = PluginInternals::new();
        let plugin = EndpointPlugin::new();
        let mw = plugin.middleware(
            &internals,
            EndpointSchema::new()
                .response_body("200", schema(json!({"type": "object"})))
                .response_body("default", schema(json!({"type": "string"}))),
        );

        let mut req = RequestContext::new();
        let mut res = ResponseContext::new();
        mw.handle(&mut req, &mut res).unwrap();

        // the declared default (string) rejects object payloads
        res.set_status(404);
        let err = res.send_json(json!({"error": "missing"})).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Response {
                segment: ResponseSegment::Body,
                ..
            }
        ));
    }
}
