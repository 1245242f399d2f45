//! # Plugins Module
//!
//! Built-in documentation plugins.
//!
//! [`SpecificationPlugin`] is the workhorse: its middleware validates
//! requests and responses against a declared [`EndpointSchema`] and its
//! processor folds the declared schemas into the specification document.
//! [`EndpointPlugin`] layers endpoint conveniences on top — an implicit
//! success status and an automatic catch-all `default` response.

mod endpoint;
mod spec_plugin;

pub use endpoint::{EndpointMiddleware, EndpointPlugin};
pub use spec_plugin::{
    EndpointSchema, SpecInfo, SpecificationConfig, SpecificationPlugin, ValidationMiddleware,
};
