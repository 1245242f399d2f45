//! # Registry Module
//!
//! [`OpenApiRegistry`] is the library facade: it owns the specification
//! document and the ordered plugin list, and drives tree resolution.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use retrospec::plugins::{EndpointSchema, SpecificationPlugin};
//! use retrospec::routing::{MethodKey, RouterNode, TerminalRoute};
//! use retrospec::OpenApiRegistry;
//! use http::Method;
//!
//! let mut registry = OpenApiRegistry::new();
//! let handle = registry.register_plugin(SpecificationPlugin::new());
//!
//! let middleware = handle
//!     .plugin()
//!     .middleware(handle.internals(), EndpointSchema::new().operation_id("ping"));
//!
//! let mut root = RouterNode::new();
//! let mut route = TerminalRoute::single("/ping");
//! route.bind(MethodKey::Method(Method::GET), middleware.id());
//! root.route(route);
//!
//! let doc = registry.populate(Some(&root), None).unwrap();
//! let rendered = serde_json::to_string_pretty(&doc.to_document()).unwrap();
//! println!("{rendered}");
//! ```

use std::sync::Arc;

use tracing::info;

use crate::document::SpecDocument;
use crate::error::ResolveError;
use crate::plugin::{ApiPlugin, PluginInternals, RegisteredPlugin};
use crate::routing::{resolve_tree, RouterNode};

/// A plugin registration: the plugin itself plus its private internals.
pub struct PluginHandle<P: ApiPlugin> {
    plugin: Arc<P>,
    internals: PluginInternals<P::Metadata>,
}

impl<P: ApiPlugin> std::fmt::Debug for PluginHandle<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHandle")
            .field("plugin", &self.plugin.name())
            .finish()
    }
}

impl<P: ApiPlugin> PluginHandle<P> {
    pub fn plugin(&self) -> &P {
        &self.plugin
    }

    pub fn internals(&self) -> &PluginInternals<P::Metadata> {
        &self.internals
    }
}

/// Facade over the specification document, the plugin list, and tree
/// resolution.
///
/// Plugins run in registration order for every resolved operation.
/// [`populate`](OpenApiRegistry::populate) may be called repeatedly as
/// routes are added; document writes merge rather than duplicate.
#[derive(Debug, Default)]
pub struct OpenApiRegistry {
    document: SpecDocument,
    plugins: Vec<RegisteredPlugin>,
}

impl OpenApiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry around an existing document, e.g. one carrying
    /// pre-filled info metadata.
    pub fn with_document(document: SpecDocument) -> Self {
        Self {
            document,
            plugins: Vec::new(),
        }
    }

    /// Registers a plugin and returns its handle. The handle carries the
    /// plugin's private stash, through which its middleware factories
    /// record per-handler metadata.
    pub fn register_plugin<P>(&mut self, plugin: P) -> PluginHandle<P>
    where
        P: ApiPlugin + Send + Sync + 'static,
    {
        let plugin = Arc::new(plugin);
        let internals = PluginInternals::new();
        info!(plugin = plugin.name(), "registered plugin");
        self.plugins
            .push(RegisteredPlugin::new(Arc::clone(&plugin), internals.stash().clone()));
        PluginHandle { plugin, internals }
    }

    /// Resolves a routing tree into the document and returns a view of
    /// it. `base_path` defaults to the empty prefix.
    ///
    /// ## Errors
    ///
    /// Propagates [`ResolveError`] from pattern decoding. Entries
    /// registered before the failure remain in the document.
    pub fn populate(
        &mut self,
        root: Option<&RouterNode>,
        base_path: Option<&str>,
    ) -> Result<&SpecDocument, ResolveError> {
        resolve_tree(
            &mut self.document,
            root,
            base_path.unwrap_or(""),
            &self.plugins,
        )?;
        info!(paths = self.document.paths().len(), "specification populated");
        Ok(&self.document)
    }

    pub fn document(&self) -> &SpecDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut SpecDocument {
        &mut self.document
    }
}
