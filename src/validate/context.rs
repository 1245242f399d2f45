//! Request and response contexts.
//!
//! Framework adapters copy the incoming request's segments into a
//! [`RequestContext`] before validation and read the coerced values back
//! afterwards. The [`ResponseContext`] carries the outgoing status,
//! headers, and body, plus the single-use validation hook that runs
//! before the first send.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ValidationError;

use super::pipeline::ResponseValidation;
use super::RequestSegment;

/// Mutable view of an incoming request's validatable segments.
///
/// Structured segments default to empty objects and the body defaults to
/// `Null`, mirroring a request where nothing was supplied.
#[derive(Debug, Clone)]
pub struct RequestContext {
    headers: Value,
    params: Value,
    query: Value,
    cookies: Value,
    signed_cookies: Value,
    body: Value,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            headers: Value::Object(Map::new()),
            params: Value::Object(Map::new()),
            query: Value::Object(Map::new()),
            cookies: Value::Object(Map::new()),
            signed_cookies: Value::Object(Map::new()),
            body: Value::Null,
        }
    }

    /// Current value of a segment.
    pub fn segment(&self, segment: RequestSegment) -> &Value {
        match segment {
            RequestSegment::Headers => &self.headers,
            RequestSegment::Params => &self.params,
            RequestSegment::Query => &self.query,
            RequestSegment::Cookies => &self.cookies,
            RequestSegment::SignedCookies => &self.signed_cookies,
            RequestSegment::Body => &self.body,
        }
    }

    /// Replaces a segment's value. Validation uses this to write coerced
    /// values back so downstream handlers observe typed data.
    pub fn set_segment(&mut self, segment: RequestSegment, value: Value) {
        match segment {
            RequestSegment::Headers => self.headers = value,
            RequestSegment::Params => self.params = value,
            RequestSegment::Query => self.query = value,
            RequestSegment::Cookies => self.cookies = value,
            RequestSegment::SignedCookies => self.signed_cookies = value,
            RequestSegment::Body => self.body = value,
        }
    }

    /// Builder-style segment assignment, for adapters and tests.
    pub fn with_segment(mut self, segment: RequestSegment, value: Value) -> Self {
        self.set_segment(segment, value);
        self
    }
}

/// Mutable view of an outgoing response.
///
/// When a validation hook is installed, the first [`send_json`] consumes
/// it: body and headers are checked (and the body coerced) before the
/// response is marked sent. A failed validation sends nothing — the
/// adapter is expected to surface the error instead. The hook never runs
/// twice; a later send after a failure goes out unvalidated, which lets
/// error-handling paths emit their own payloads.
///
/// [`send_json`]: ResponseContext::send_json
#[derive(Debug)]
pub struct ResponseContext {
    status: u16,
    headers: Map<String, Value>,
    body: Option<Value>,
    sent: bool,
    validation: Option<ResponseValidation>,
}

impl Default for ResponseContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseContext {
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: Map::new(),
            body: None,
            sent: false,
            validation: None,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Sets an outgoing header.
    pub fn set_header(&mut self, name: &str, value: impl Into<Value>) {
        self.headers.insert(name.to_string(), value.into());
    }

    pub fn headers(&self) -> &Map<String, Value> {
        &self.headers
    }

    /// Body as sent, if a send has happened.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Whether a validation hook is installed and has not yet run.
    pub fn has_pending_validation(&self) -> bool {
        self.validation.is_some()
    }

    pub(crate) fn install_validation(&mut self, validation: ResponseValidation) {
        self.validation = Some(validation);
    }

    /// Sends a JSON body.
    ///
    /// If a validation hook is pending it runs exactly once, here. On
    /// success the coerced body is stored and the response is marked
    /// sent. On failure nothing is sent and the error is returned; the
    /// hook is gone either way.
    ///
    /// ## Errors
    ///
    /// [`ValidationError::MissingResponseSchema`] when the hook has no
    /// schema set for the current status and no `"default"` entry, or
    /// [`ValidationError::Response`] when a segment fails its schema.
    pub fn send_json(&mut self, body: Value) -> Result<(), ValidationError> {
        if let Some(validation) = self.validation.take() {
            let headers = Value::Object(self.headers.clone());
            let validated = validation.run(self.status, &headers, body)?;
            debug!(status = self.status, "response validated before send");
            self.body = Some(validated);
            self.sent = true;
            return Ok(());
        }

        self.body = Some(body);
        self.sent = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_segments_default_shape() {
        let ctx = RequestContext::new();
        assert_eq!(ctx.segment(RequestSegment::Query), &json!({}));
        assert_eq!(ctx.segment(RequestSegment::Body), &Value::Null);
    }

    #[test]
    fn test_send_without_validation_passes_through() {
        let mut res = ResponseContext::new();
        res.send_json(json!({"ok": true})).unwrap();
        assert!(res.is_sent());
        assert_eq!(res.body(), Some(&json!({"ok": true})));
    }
}
