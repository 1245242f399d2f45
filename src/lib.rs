//! # Retrospec
//!
//! **Retrospec** builds an [OpenAPI 3.1.0](https://spec.openapis.org/oas/v3.1.0)
//! document *from* an application's compiled routing tree, instead of
//! generating routes from a hand-written document.
//!
//! ## Overview
//!
//! Web frameworks compile mount paths into pattern matchers and discard
//! the original strings. Retrospec walks the compiled tree, decodes the
//! patterns back into path templates, and registers every discovered
//! (path, method) pair in an incrementally-built specification document.
//! Plugins attach schema metadata to individual handlers through an
//! identity-keyed stash; during the walk, each plugin folds its stashed
//! metadata into the document. The same declared schemas also drive
//! ordered, fail-fast request validation and a single-use pre-send
//! response validation hook.
//!
//! ## Architecture
//!
//! - **[`document`]** - incremental OpenAPI document model and accumulator
//! - **[`routing`]** - routing-tree node model, per-framework pattern
//!   decoder, and the tree resolver
//! - **[`stash`]** - identity-keyed per-handler metadata arena
//! - **[`schema`]** - the [`SchemaContract`] seam between declared schemas
//!   and validation/introspection
//! - **[`validate`]** - request/response contexts and the fail-fast
//!   validation pipeline
//! - **[`plugin`]** / **[`registry`]** - plugin trait, type-erased
//!   registration, and the [`OpenApiRegistry`] facade
//! - **[`plugins`]** - built-in specification and endpoint plugins
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use http::Method;
//! use retrospec::plugins::{EndpointSchema, SpecificationPlugin};
//! use retrospec::routing::{MethodKey, RouterNode, TerminalRoute};
//! use retrospec::schema::JsonSchema;
//! use retrospec::validate::RequestSegment;
//! use retrospec::OpenApiRegistry;
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = OpenApiRegistry::new();
//!     let handle = registry.register_plugin(SpecificationPlugin::new());
//!
//!     let params = Arc::new(JsonSchema::new(json!({
//!         "type": "object",
//!         "properties": { "petId": { "type": "integer" } },
//!         "required": ["petId"]
//!     }))?);
//!
//!     let middleware = handle.plugin().middleware(
//!         handle.internals(),
//!         EndpointSchema::new()
//!             .operation_id("getPet")
//!             .request(RequestSegment::Params, params),
//!     );
//!
//!     let mut root = RouterNode::new();
//!     let mut route = TerminalRoute::single("/pets/:petId");
//!     route.bind(MethodKey::Method(Method::GET), middleware.id());
//!     root.route(route);
//!
//!     let doc = registry.populate(Some(&root), None)?;
//!     println!("{}", serde_json::to_string_pretty(&doc.to_document())?);
//!     Ok(())
//! }
//! ```

pub mod document;
pub mod error;
pub mod plugin;
pub mod plugins;
pub mod registry;
pub mod routing;
pub mod schema;
pub mod stash;
pub mod validate;

pub use document::{OpenApiDocument, SpecDocument};
pub use error::{ResolveError, SchemaError, ValidationError};
pub use plugin::{ApiPlugin, PluginInternals, RouteInfo};
pub use registry::{OpenApiRegistry, PluginHandle};
pub use schema::{AnySchema, JsonSchema, SchemaContract};
pub use stash::{HandlerId, Stash};
