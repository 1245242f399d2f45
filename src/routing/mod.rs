//! # Routing Module
//!
//! Read-only view of a framework's compiled routing tree plus the resolver
//! that walks it.
//!
//! ## Overview
//!
//! Frameworks compile mount paths into pattern matchers and throw the
//! original strings away. This module reconstructs them:
//!
//! 1. **Model**: [`RouterNode`] / [`TerminalRoute`] mirror the framework's
//!    structure — ordered children, each behind a [`MountPattern`], with
//!    terminal routes exposing their method → handler bindings.
//! 2. **Decoding**: [`decode_pattern`] turns a compiled mount pattern back
//!    into a literal path template, an opaque marker, or a catch-all. It is
//!    the only piece that must be rewritten per target framework.
//! 3. **Resolution**: [`resolve_tree`] descends the tree accumulating the
//!    base path, registers every concrete (path, method) pair in the
//!    [`SpecDocument`](crate::document::SpecDocument), and hands each
//!    plugin its stashed metadata for the matched handler chain.
//!
//! Traversal order always equals registration order; earlier-registered
//! handlers take precedence.

mod node;
mod pattern;
mod resolver;

pub use node::{HandlerBinding, MethodKey, Mounted, RouteNode, RouterNode, TerminalRoute};
pub use pattern::{decode_pattern, DecodedPattern, MountPattern};
pub use resolver::resolve_tree;
