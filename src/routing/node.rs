//! Polymorphic routing-tree node model.
//!
//! A framework adapter translates the framework's internal layer stack into
//! this model once; everything downstream (pattern decoding, resolution,
//! stash lookup) is framework-agnostic.

use http::Method;

use crate::stash::HandlerId;

use super::pattern::MountPattern;

/// Method selector attached to a handler binding.
///
/// `All` mirrors a wildcard registration (a handler attached to every
/// method). It participates in route structure but never satisfies a
/// concrete method lookup, so wildcard handlers cannot shadow
/// method-specific metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodKey {
    /// A specific HTTP method.
    Method(Method),
    /// Wildcard registration across all methods.
    All,
}

impl MethodKey {
    /// Whether this binding applies to a lookup for `method`.
    ///
    /// Wildcard bindings always return `false`: metadata stashed on a
    /// wildcard handler is intentionally invisible to per-method lookups.
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            MethodKey::Method(m) => m == method,
            MethodKey::All => false,
        }
    }
}

/// One handler registered on a terminal route.
#[derive(Debug, Clone)]
pub struct HandlerBinding {
    /// Method this handler was registered under.
    pub method: MethodKey,
    /// Identity of the handler, as used for stash lookup.
    pub handler: HandlerId,
}

/// A leaf of the routing tree: one or more local path templates plus the
/// ordered list of handler bindings attached to them.
///
/// Binding order is registration order; the first binding whose method
/// matches wins during stash lookup.
#[derive(Debug, Clone)]
pub struct TerminalRoute {
    paths: Vec<String>,
    bindings: Vec<HandlerBinding>,
}

impl TerminalRoute {
    /// Creates a route answering on the given local path templates.
    pub fn new(paths: Vec<String>) -> Self {
        Self {
            paths,
            bindings: Vec::new(),
        }
    }

    /// Convenience constructor for the common single-path case.
    pub fn single(path: &str) -> Self {
        Self::new(vec![path.to_string()])
    }

    /// Appends a handler binding, preserving registration order.
    pub fn bind(&mut self, method: MethodKey, handler: HandlerId) -> &mut Self {
        self.bindings.push(HandlerBinding { method, handler });
        self
    }

    /// Local path templates this route answers on.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Handler bindings in registration order.
    pub fn bindings(&self) -> &[HandlerBinding] {
        &self.bindings
    }

    /// Concrete methods registered on this route, deduplicated, in first
    /// appearance order. Wildcard bindings are excluded.
    pub fn methods(&self) -> Vec<Method> {
        let mut out: Vec<Method> = Vec::new();
        for binding in &self.bindings {
            if let MethodKey::Method(m) = &binding.method {
                if !out.contains(m) {
                    out.push(m.clone());
                }
            }
        }
        out
    }
}

/// A node of the routing tree.
#[derive(Debug, Clone)]
pub enum RouteNode {
    /// A terminal route with handler bindings.
    Terminal(TerminalRoute),
    /// A nested router, or a mounted sub-application whose routing tree is
    /// absent (`None`). An absent tree still contributes a bare path entry
    /// at its mount point.
    Router(Option<RouterNode>),
    /// Framework-internal middleware (body parsers, static file servers).
    /// Skipped entirely during resolution.
    Internal {
        /// Diagnostic name, e.g. `"jsonParser"`.
        name: String,
    },
}

/// A child node together with the compiled pattern it was mounted under.
#[derive(Debug, Clone)]
pub struct Mounted {
    /// Compiled mount pattern for this child.
    pub pattern: MountPattern,
    /// The mounted node.
    pub node: RouteNode,
}

/// A router: an ordered list of mounted children.
#[derive(Debug, Clone, Default)]
pub struct RouterNode {
    children: Vec<Mounted>,
}

impl RouterNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts a terminal route. The mount pattern is derived from the
    /// route's first path template, falling back to the root pattern.
    pub fn route(&mut self, route: TerminalRoute) -> &mut Self {
        let pattern = match route.paths().first() {
            Some(path) => MountPattern::literal(path),
            None => MountPattern::root(),
        };
        self.children.push(Mounted {
            pattern,
            node: RouteNode::Terminal(route),
        });
        self
    }

    /// Mounts an arbitrary node under an explicit pattern.
    pub fn mount(&mut self, pattern: MountPattern, node: RouteNode) -> &mut Self {
        self.children.push(Mounted { pattern, node });
        self
    }

    /// Children in registration order.
    pub fn children(&self) -> &[Mounted] {
        &self.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_key_wildcard_never_matches() {
        assert!(MethodKey::Method(Method::GET).matches(&Method::GET));
        assert!(!MethodKey::Method(Method::GET).matches(&Method::POST));
        assert!(!MethodKey::All.matches(&Method::GET));
    }

    #[test]
    fn test_methods_dedup_and_order() {
        let mut route = TerminalRoute::single("/widgets");
        route
            .bind(MethodKey::Method(Method::POST), HandlerId::next())
            .bind(MethodKey::All, HandlerId::next())
            .bind(MethodKey::Method(Method::GET), HandlerId::next())
            .bind(MethodKey::Method(Method::POST), HandlerId::next());
        assert_eq!(route.methods(), vec![Method::POST, Method::GET]);
    }

    #[test]
    fn test_router_route_derives_mount_pattern() {
        let mut router = RouterNode::new();
        router.route(TerminalRoute::single("/users/:id"));
        let child = &router.children()[0];
        assert_eq!(child.pattern.param_names(), ["id"]);
    }
}
