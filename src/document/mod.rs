//! # Document Module
//!
//! The incrementally-built OpenAPI description of every discovered route.
//!
//! [`SpecDocument`] is a pure accumulator: the route tree resolver and the
//! registered plugins mutate it path by path during a populate walk, and the
//! caller snapshots it with [`SpecDocument::to_document`] once the walk is
//! done. All mutations are idempotent-additive — setting a path, operation,
//! or parameter that already exists merges instead of duplicating.

mod spec;
mod types;

pub use spec::{OpenApiDocument, SpecDocument};
pub use types::{
    HeaderObject, Info, MediaType, Operation, Parameter, ParameterLocation, PathItem, RequestBody,
    ResponseObject, ResponsePatch, StatusKey,
};
