//! # Validation Module
//!
//! Ordered, fail-fast request and response validation.
//!
//! Request segments (headers, params, query, cookies, signed cookies,
//! body) are validated one at a time in a configurable order. Each
//! segment that passes has its coerced value written back into the
//! request context before the next segment runs, so a failure leaves
//! earlier segments coerced and later ones untouched. The first failure
//! stops the pipeline.
//!
//! Response validation is an explicit pre-send hook installed on the
//! [`ResponseContext`]: the first send consumes it, validates body and
//! headers against the schema set for the response status (falling back
//! to the `"default"` entry), and only a passing payload is marked sent.

mod context;
mod pipeline;

use std::fmt;

pub use context::{RequestContext, ResponseContext};
pub use pipeline::{
    install_response_validation, validate_request, RequestSchemas, ResponseSchemaSet,
    ResponseSchemas,
};

/// One validatable part of an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestSegment {
    Headers,
    Params,
    Query,
    Cookies,
    SignedCookies,
    Body,
}

/// Default request validation order. Body runs last so header and
/// parameter failures short-circuit before the payload is touched.
pub const DEFAULT_REQUEST_ORDER: [RequestSegment; 6] = [
    RequestSegment::Headers,
    RequestSegment::Params,
    RequestSegment::Query,
    RequestSegment::Cookies,
    RequestSegment::SignedCookies,
    RequestSegment::Body,
];

impl RequestSegment {
    /// Wire-level label, used in error messages and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestSegment::Headers => "headers",
            RequestSegment::Params => "params",
            RequestSegment::Query => "query",
            RequestSegment::Cookies => "cookies",
            RequestSegment::SignedCookies => "signedCookies",
            RequestSegment::Body => "body",
        }
    }
}

impl fmt::Display for RequestSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validatable part of an outgoing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseSegment {
    Body,
    Headers,
}

/// Default response validation order.
pub const DEFAULT_RESPONSE_ORDER: [ResponseSegment; 2] =
    [ResponseSegment::Body, ResponseSegment::Headers];

impl ResponseSegment {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSegment::Body => "body",
            ResponseSegment::Headers => "headers",
        }
    }
}

impl fmt::Display for ResponseSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
