use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use super::types::{
    Info, Operation, Parameter, PathItem, RequestBody, ResponseObject, ResponsePatch, StatusKey,
};

/// Serializable snapshot of a populated [`SpecDocument`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    pub paths: HashMap<String, PathItem>,
}

/// Mutable, incrementally-built API description.
///
/// Created once per application instance, mutated by plugin processors while
/// the route tree is walked, and read by the caller at the end. Path keys
/// always use `{name}` placeholder syntax, never framework-specific syntax.
#[derive(Debug, Clone, Default)]
pub struct SpecDocument {
    info: Info,
    paths: HashMap<String, PathItem>,
}

impl SpecDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the document `info` section (defaults to a placeholder).
    pub fn set_info(&mut self, title: impl Into<String>, version: impl Into<String>) {
        self.info = Info {
            title: title.into(),
            version: version.into(),
        };
    }

    /// Ensure a path item exists for `path`. Idempotent.
    pub fn set_path_item(&mut self, path: &str) {
        if !self.paths.contains_key(path) {
            debug!(path = %path, "Path item registered");
            self.paths.insert(path.to_string(), PathItem::default());
        }
    }

    pub fn path_item(&self, path: &str) -> Option<&PathItem> {
        self.paths.get(path)
    }

    pub fn paths(&self) -> &HashMap<String, PathItem> {
        &self.paths
    }

    /// Replace the operation for (path, method), creating the path item if
    /// needed. `method` must be lowercase.
    pub fn set_operation(&mut self, path: &str, method: &str, operation: Operation) {
        self.set_path_item(path);
        let item = self.paths.entry(path.to_string()).or_default();
        item.operations.insert(method.to_string(), operation);
    }

    pub fn operation(&self, path: &str, method: &str) -> Option<&Operation> {
        self.paths.get(path).and_then(|p| p.operations.get(method))
    }

    /// Ensure an operation exists for (path, method), seeded with the empty
    /// `default` response placeholder. Existing operations are untouched.
    pub fn ensure_operation(&mut self, path: &str, method: &str) {
        if self.operation(path, method).is_none() {
            self.set_operation(path, method, Operation::with_default_response());
        }
    }

    /// Set the operation id for an existing (path, method) operation.
    pub fn set_operation_id(&mut self, path: &str, method: &str, operation_id: &str) {
        if let Some(op) = self.operation_mut(path, method) {
            op.operation_id = Some(operation_id.to_string());
        }
    }

    /// Append a parameter to an operation, de-duplicated by (name, location).
    ///
    /// Re-adding an existing parameter merges in place (last write wins for
    /// the schema and required flag) so two plugins describing the same
    /// query parameter yield exactly one entry.
    pub fn add_parameter(&mut self, path: &str, method: &str, parameter: Parameter) {
        let Some(op) = self.operation_mut(path, method) else {
            return;
        };
        if let Some(existing) = op
            .parameters
            .iter_mut()
            .find(|p| p.name == parameter.name && p.location == parameter.location)
        {
            debug!(
                path = %path,
                method = %method,
                name = %parameter.name,
                location = %parameter.location,
                "Parameter merged into existing entry"
            );
            *existing = parameter;
        } else {
            op.parameters.push(parameter);
        }
    }

    /// Overwrite the request body of an operation.
    pub fn set_request_body(&mut self, path: &str, method: &str, body: RequestBody) {
        if let Some(op) = self.operation_mut(path, method) {
            op.request_body = Some(body);
        }
    }

    pub fn response(&self, path: &str, method: &str, key: StatusKey) -> Option<&ResponseObject> {
        self.operation(path, method).and_then(|op| op.responses.get(&key))
    }

    /// Merge a partial response into the operation's response map.
    ///
    /// Patch fields left unset preserve whatever the existing response
    /// already holds: setting headers for a status code that already carries
    /// a body keeps the body, and vice versa.
    pub fn merge_response(&mut self, path: &str, method: &str, key: StatusKey, patch: ResponsePatch) {
        let Some(op) = self.operation_mut(path, method) else {
            return;
        };
        let entry = op.responses.entry(key).or_default();
        if let Some(description) = patch.description {
            entry.description = description;
        }
        if let Some(content) = patch.content {
            entry.content = Some(content);
        }
        if let Some(headers) = patch.headers {
            entry.headers = headers;
        }
    }

    /// Deep snapshot safe for serialization. Later mutations of the live
    /// document never show through the snapshot.
    pub fn to_document(&self) -> OpenApiDocument {
        OpenApiDocument {
            openapi: "3.1.0".to_string(),
            info: self.info.clone(),
            paths: self.paths.clone(),
        }
    }

    fn operation_mut(&mut self, path: &str, method: &str) -> Option<&mut Operation> {
        self.paths
            .get_mut(path)
            .and_then(|p| p.operations.get_mut(method))
    }
}
