//! Plugin trait and the type-erased registration record.
//!
//! A plugin contributes framework-independent documentation logic: it
//! declares a metadata type, hands out middleware that stashes metadata
//! per handler, and processes each stashed value into the specification
//! document when the routing tree is resolved.

use std::sync::Arc;

use http::Method;

use crate::document::SpecDocument;
use crate::routing::TerminalRoute;
use crate::stash::Stash;

/// The (path, method) pair a plugin is processing, with the path already
/// in `{name}` parameter form and the method lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub path: String,
    pub method: String,
}

/// A documentation plugin.
///
/// `Metadata` is whatever the plugin stashes per handler; the registry
/// stores it in a plugin-private [`Stash`] and feeds it back through
/// [`process_route`](ApiPlugin::process_route) during resolution.
pub trait ApiPlugin {
    type Metadata: Send + Sync + 'static;

    /// Stable plugin name, for logs.
    fn name(&self) -> &str;

    /// Folds one stashed metadata value into the document for the route
    /// it was found on.
    fn process_route(&self, doc: &mut SpecDocument, metadata: &Self::Metadata, route: &RouteInfo);
}

/// Per-registration state handed back to the caller: the plugin's
/// private stash. Middleware factories store metadata through it.
#[derive(Clone)]
pub struct PluginInternals<T> {
    stash: Stash<T>,
}

impl<T> std::fmt::Debug for PluginInternals<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInternals")
            .field("stash", &self.stash)
            .finish()
    }
}

impl<T: Send + Sync + 'static> PluginInternals<T> {
    pub(crate) fn new() -> Self {
        Self {
            stash: Stash::new(),
        }
    }

    pub fn stash(&self) -> &Stash<T> {
        &self.stash
    }
}

/// A registered plugin with its metadata type erased, so the registry
/// can hold plugins of different metadata types in one ordered list.
pub struct RegisteredPlugin {
    name: String,
    runner: Box<dyn Fn(&mut SpecDocument, &TerminalRoute, &Method, &RouteInfo) -> bool + Send + Sync>,
}

impl RegisteredPlugin {
    pub(crate) fn new<P>(plugin: Arc<P>, stash: Stash<P::Metadata>) -> Self
    where
        P: ApiPlugin + Send + Sync + 'static,
    {
        let name = plugin.name().to_string();
        let runner = Box::new(
            move |doc: &mut SpecDocument, route: &TerminalRoute, method: &Method, info: &RouteInfo| {
                match stash.find(route, method) {
                    Some(metadata) => {
                        plugin.process_route(doc, &metadata, info);
                        true
                    }
                    None => false,
                }
            },
        );
        Self { name, runner }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the plugin against one resolved operation. Returns whether a
    /// stashed value was found and processed.
    pub(crate) fn process(
        &self,
        doc: &mut SpecDocument,
        route: &TerminalRoute,
        method: &Method,
        info: &RouteInfo,
    ) -> bool {
        (self.runner)(doc, route, method, info)
    }
}

impl std::fmt::Debug for RegisteredPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredPlugin")
            .field("name", &self.name)
            .finish()
    }
}
