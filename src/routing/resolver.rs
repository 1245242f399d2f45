//! Route-tree resolution.
//!
//! Walks a compiled routing tree depth-first in registration order,
//! reconstructing the full mount path for every terminal route and
//! registering each (path, method) pair in the specification document.
//! Plugins observe each registered operation through their stashes.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::document::SpecDocument;
use crate::error::ResolveError;
use crate::plugin::{RegisteredPlugin, RouteInfo};

use super::node::{RouteNode, RouterNode, TerminalRoute};
use super::pattern::{decode_pattern, DecodedPattern};

/// Matches `:name` parameter segments for rewriting into `{name}` form.
static PARAM_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r":([a-zA-Z0-9_]+)").expect("param name regex should be valid")
});

/// Resolves a routing tree into `doc`, starting from `base_path`.
///
/// ## Arguments
/// - `doc`: specification document to register paths and operations into
/// - `root`: the tree to walk. `None` models a mounted sub-application
///   with no compiled routes; it contributes a bare path entry at
///   `base_path` and nothing else.
/// - `base_path`: accumulated mount prefix, `""` at the top level
/// - `plugins`: registered plugins in registration order; each gets a
///   chance to process every registered operation via its stash
///
/// ## Errors
///
/// Fails with [`ResolveError`] when a mount pattern violates the
/// decoder's structural assumptions. No partial cleanup is attempted;
/// entries registered before the failure remain in the document.
pub fn resolve_tree(
    doc: &mut SpecDocument,
    root: Option<&RouterNode>,
    base_path: &str,
    plugins: &[RegisteredPlugin],
) -> Result<(), ResolveError> {
    let Some(router) = root else {
        debug!(path = base_path, "mounted application without routes");
        doc.set_path_item(base_path);
        return Ok(());
    };

    for child in router.children() {
        match &child.node {
            RouteNode::Terminal(route) => process_terminal(doc, route, base_path, plugins),
            RouteNode::Internal { name } => {
                debug!(layer = name.as_str(), "skipping internal layer");
            }
            RouteNode::Router(sub) => match decode_pattern(&child.pattern)? {
                DecodedPattern::Literal { template } => {
                    resolve_tree(doc, sub.as_ref(), &format!("{base_path}/{template}"), plugins)?;
                }
                DecodedPattern::Opaque { marker } => {
                    resolve_tree(doc, sub.as_ref(), &format!("{base_path}/{marker}"), plugins)?;
                }
                DecodedPattern::CatchAll => {
                    resolve_tree(doc, sub.as_ref(), base_path, plugins)?;
                }
                DecodedPattern::Unresolved => {
                    debug!(pattern = child.pattern.source(), "skipping undecodable mount");
                }
            },
        }
    }

    Ok(())
}

/// Registers one terminal route under every local path it answers on.
fn process_terminal(
    doc: &mut SpecDocument,
    route: &TerminalRoute,
    base_path: &str,
    plugins: &[RegisteredPlugin],
) {
    for route_path in route.paths() {
        let joined = if base_path.is_empty() {
            route_path.clone()
        } else if route_path == "/" {
            base_path.to_string()
        } else {
            format!("{base_path}{route_path}")
        };
        let path = PARAM_NAME.replace_all(&joined, "{$1}").into_owned();

        doc.set_path_item(&path);

        for method in route.methods() {
            let method_label = method.as_str().to_ascii_lowercase();
            doc.ensure_operation(&path, &method_label);
            info!(path = path.as_str(), method = method_label.as_str(), "registered operation");

            let info = RouteInfo {
                path: path.clone(),
                method: method_label,
            };
            for plugin in plugins {
                let hit = plugin.process(doc, route, &method, &info);
                if hit {
                    debug!(
                        plugin = plugin.name(),
                        path = info.path.as_str(),
                        method = info.method.as_str(),
                        "plugin processed stashed metadata"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use crate::routing::{MethodKey, MountPattern, RouteNode};
    use crate::stash::HandlerId;

    use super::*;

    #[test]
    fn test_absent_tree_registers_bare_path() {
        let mut doc = SpecDocument::new();
        resolve_tree(&mut doc, None, "/mounted", &[]).unwrap();
        assert!(doc.path_item("/mounted").is_some());
        assert!(doc.paths().len() == 1);
    }

    #[test]
    fn test_param_segments_rewritten_in_full_path() {
        let mut doc = SpecDocument::new();
        let mut inner = RouterNode::new();
        let mut route = TerminalRoute::single("/:petId");
        route.bind(MethodKey::Method(Method::GET), HandlerId::next());
        inner.route(route);

        let mut root = RouterNode::new();
        root.mount(
            MountPattern::literal("/pets"),
            RouteNode::Router(Some(inner)),
        );

        resolve_tree(&mut doc, Some(&root), "", &[]).unwrap();
        let op = doc.operation("/pets/{petId}", "get");
        assert!(op.is_some());
    }

    #[test]
    fn test_root_route_under_mount_contributes_nothing() {
        let mut doc = SpecDocument::new();
        let mut inner = RouterNode::new();
        let mut route = TerminalRoute::single("/");
        route.bind(MethodKey::Method(Method::POST), HandlerId::next());
        inner.route(route);

        let mut root = RouterNode::new();
        root.mount(
            MountPattern::literal("/orders"),
            RouteNode::Router(Some(inner)),
        );

        resolve_tree(&mut doc, Some(&root), "", &[]).unwrap();
        assert!(doc.operation("/orders", "post").is_some());
        assert!(doc.path_item("/orders/").is_none());
    }

    #[test]
    fn test_internal_layers_are_skipped() {
        let mut doc = SpecDocument::new();
        let mut root = RouterNode::new();
        root.mount(
            MountPattern::root(),
            RouteNode::Internal {
                name: "jsonParser".to_string(),
            },
        );
        resolve_tree(&mut doc, Some(&root), "", &[]).unwrap();
        assert!(doc.paths().is_empty());
    }

    #[test]
    fn test_default_response_placeholder_seeded() {
        let mut doc = SpecDocument::new();
        let mut root = RouterNode::new();
        let mut route = TerminalRoute::single("/ping");
        route.bind(MethodKey::Method(Method::GET), HandlerId::next());
        root.route(route);

        resolve_tree(&mut doc, Some(&root), "", &[]).unwrap();
        let op = doc.operation("/ping", "get").unwrap();
        assert!(op.responses.contains_key(&crate::document::StatusKey::Default));
    }
}
