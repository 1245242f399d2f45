use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Where a request parameter lives, per the OpenAPI parameter object model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Path,
    Header,
    Cookie,
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParameterLocation::Query => "query",
            ParameterLocation::Path => "path",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        };
        write!(f, "{}", s)
    }
}

/// One operation parameter (query/path/header/cookie).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub required: bool,
    /// JSON-Schema fragment produced by the schema's introspect capability
    pub schema: Value,
}

/// Media type entry inside a request body or response `content` map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaType {
    pub schema: Value,
}

/// Request body description, keyed by content type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBody {
    pub content: BTreeMap<String, MediaType>,
}

impl RequestBody {
    /// Request body with a single `application/json` schema.
    pub fn json(schema: Value) -> Self {
        let mut content = BTreeMap::new();
        content.insert("application/json".to_string(), MediaType { schema });
        Self { content }
    }
}

/// Per-header schema inside a response object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderObject {
    pub required: bool,
    pub schema: Value,
}

/// One response entry (per status key) of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ResponseObject {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub headers: BTreeMap<String, HeaderObject>,
}

/// Partial response update merged into an existing [`ResponseObject`].
///
/// Fields left as `None` keep whatever the existing response already holds,
/// so a plugin setting headers for a status never erases a body another
/// plugin set for the same status.
#[derive(Debug, Clone, Default)]
pub struct ResponsePatch {
    pub description: Option<String>,
    pub content: Option<BTreeMap<String, MediaType>>,
    pub headers: Option<BTreeMap<String, HeaderObject>>,
}

impl ResponsePatch {
    /// Patch carrying an `application/json` body schema.
    pub fn json_body(schema: Value) -> Self {
        let mut content = BTreeMap::new();
        content.insert("application/json".to_string(), MediaType { schema });
        Self {
            description: Some(String::new()),
            content: Some(content),
            headers: None,
        }
    }

    /// Patch carrying per-header schemas.
    pub fn headers(headers: BTreeMap<String, HeaderObject>) -> Self {
        Self {
            description: Some(String::new()),
            content: None,
            headers: Some(headers),
        }
    }
}

/// Response map key: a concrete status code or the `default` fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusKey {
    Code(u16),
    Default,
}

impl StatusKey {
    /// Parse `"default"` or a numeric status string. Non-numeric,
    /// non-default keys are rejected.
    pub fn parse(key: &str) -> Option<StatusKey> {
        if key == "default" {
            return Some(StatusKey::Default);
        }
        key.parse::<u16>().ok().map(StatusKey::Code)
    }
}

impl std::fmt::Display for StatusKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusKey::Code(code) => write!(f, "{}", code),
            StatusKey::Default => write!(f, "default"),
        }
    }
}

impl Serialize for StatusKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// One HTTP operation on a path.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<StatusKey, ResponseObject>,
}

impl Operation {
    /// Operation seeded with the empty `default` response placeholder the
    /// resolver registers for every discovered method.
    pub fn with_default_response() -> Self {
        let mut responses = BTreeMap::new();
        responses.insert(StatusKey::Default, ResponseObject::default());
        Self {
            responses,
            ..Self::default()
        }
    }
}

/// Operations of one path, keyed by lowercase HTTP method.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(transparent)]
pub struct PathItem {
    pub operations: HashMap<String, Operation>,
}

/// `info` section of the emitted document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Info {
    pub title: String,
    pub version: String,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "API".to_string(),
            version: "0.0.0".to_string(),
        }
    }
}
