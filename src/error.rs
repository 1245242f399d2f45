use std::fmt;

use crate::validate::{RequestSegment, ResponseSegment};

/// Detail carried by a failed schema check.
///
/// Collects every issue the schema reported for the offending value so the
/// caller can render all of them, not just the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// Human readable issue messages, one per violated constraint
    pub issues: Vec<String>,
}

impl SchemaError {
    pub fn new(issues: Vec<String>) -> Self {
        Self { issues }
    }

    pub fn single(issue: impl Into<String>) -> Self {
        Self {
            issues: vec![issue.into()],
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.len() == 1 {
            write!(f, "{}", self.issues[0])
        } else {
            write!(f, "{} issues: {}", self.issues.len(), self.issues.join("; "))
        }
    }
}

impl std::error::Error for SchemaError {}

/// Validation pipeline failure
///
/// Request failures are recoverable and intended to be mapped to a 4xx
/// response by the caller's error handling. Response failures mean the
/// server produced an invalid response and must never be sent as-is.
/// `MissingResponseSchema` signals an incomplete response-schema declaration
/// relative to the status the handler actually set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A request segment failed its schema; no later segment was validated
    Request {
        segment: RequestSegment,
        detail: SchemaError,
    },
    /// A response segment failed its schema; nothing was transmitted
    Response {
        segment: ResponseSegment,
        detail: SchemaError,
    },
    /// No schema set declared for the response status and no `default` entry
    MissingResponseSchema { status: u16 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Request { segment, detail } => {
                write!(f, "request validation failed on {segment}: {detail}")
            }
            ValidationError::Response { segment, detail } => {
                write!(f, "response validation failed on {segment}: {detail}")
            }
            ValidationError::MissingResponseSchema { status } => {
                write!(f, "validation schema not found for response ({status})")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Route tree resolution failure
///
/// `StructuralMismatch` is fatal: the framework's compiled mount pattern and
/// its reported parameter-name list diverged, which cannot happen under
/// correct framework behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Capture-group count exceeds the pattern's parameter-name list
    StructuralMismatch {
        /// Source text of the compiled pattern being decoded
        pattern: String,
        /// Parameter names the framework reported for the pattern
        param_count: usize,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::StructuralMismatch {
                pattern,
                param_count,
            } => {
                write!(
                    f,
                    "mount pattern '{pattern}' has more capture groups than its \
                     {param_count} reported parameter name(s)"
                )
            }
        }
    }
}

impl std::error::Error for ResolveError {}
