//! # Stash Module
//!
//! Per-plugin-instance side table mapping a middleware's identity to
//! plugin-specific metadata.
//!
//! Each installed validation middleware carries a [`HandlerId`], and the
//! route tree exposes the same id on the terminal route's handler bindings.
//! A plugin stores its metadata under the middleware's id at
//! middleware-construction time and the resolver looks it up again by
//! (route, method) during the populate walk. The arena replaces the
//! property-injection trick of attaching values to function objects: no
//! route or handler object is ever mutated.
//!
//! Stash keys are unique per *instance*, never derived from the plugin
//! name, so two registrations of the same plugin kind on one application
//! can never observe each other's metadata.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::routing::TerminalRoute;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_STASH_KEY: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of one installed middleware function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    /// Allocate a fresh identity. Ids are process-unique and never reused.
    pub fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

/// Key identifying one stash instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StashKey(u64);

impl StashKey {
    fn next() -> Self {
        Self(NEXT_STASH_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity-keyed metadata store for one plugin registration.
///
/// Cloning a `Stash` yields a second handle onto the same table; the
/// middleware factory stores through one handle while the registry's walk
/// reads through another.
pub struct Stash<T> {
    key: StashKey,
    entries: Arc<RwLock<HashMap<HandlerId, Arc<T>>>>,
}

impl<T> Clone for Stash<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Stash<T> {
    pub fn new() -> Self {
        Self {
            key: StashKey::next(),
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn key(&self) -> StashKey {
        self.key
    }

    /// Attach `value` to the identity of one middleware function.
    pub fn store(&self, handler: HandlerId, value: T) {
        debug!(handler = %handler, stash_key = self.key.0, "Metadata stashed");
        self.entries
            .write()
            .expect("stash lock poisoned")
            .insert(handler, Arc::new(value));
    }

    /// Direct lookup by handler identity, bypassing route matching.
    pub fn get(&self, handler: HandlerId) -> Option<Arc<T>> {
        self.entries
            .read()
            .expect("stash lock poisoned")
            .get(&handler)
            .map(Arc::clone)
    }

    /// Scan the route's bound handler chain for `method`, in registration
    /// order, and return the first stashed value.
    ///
    /// The route's `All` wildcard bindings exist only for the framework's
    /// internal matching and never carry plugin metadata, so they do not
    /// match here. When re-registration leaves multiple bindings stashing
    /// under this key for one method, the first in chain order wins.
    pub fn find(&self, route: &TerminalRoute, method: &http::Method) -> Option<Arc<T>> {
        let entries = self.entries.read().expect("stash lock poisoned");
        for binding in route.bindings() {
            if !binding.method.matches(method) {
                continue;
            }
            if let Some(value) = entries.get(&binding.handler) {
                debug!(
                    handler = %binding.handler,
                    stash_key = self.key.0,
                    method = %method,
                    "Stashed metadata found on handler chain"
                );
                return Some(Arc::clone(value));
            }
        }
        None
    }
}

impl<T> std::fmt::Debug for Stash<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stash").field("key", &self.key).finish()
    }
}

impl<T> Default for Stash<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{MethodKey, TerminalRoute};
    use http::Method;

    fn route_with(bindings: Vec<(MethodKey, HandlerId)>) -> TerminalRoute {
        let mut route = TerminalRoute::new(vec!["/".to_string()]);
        for (method, handler) in bindings {
            route.bind(method, handler);
        }
        route
    }

    #[test]
    fn test_store_and_find() {
        let stash: Stash<&str> = Stash::new();
        let handler = HandlerId::next();
        stash.store(handler, "forty-two");

        let route = route_with(vec![(MethodKey::Method(Method::POST), handler)]);
        let found = stash.find(&route, &Method::POST);
        assert_eq!(found.as_deref(), Some(&"forty-two"));
        assert!(stash.find(&route, &Method::GET).is_none());
    }

    #[test]
    fn test_first_match_wins_in_chain_order() {
        let stash: Stash<u32> = Stash::new();
        let first = HandlerId::next();
        let second = HandlerId::next();
        stash.store(first, 1);
        stash.store(second, 2);

        let route = route_with(vec![
            (MethodKey::Method(Method::GET), first),
            (MethodKey::Method(Method::GET), second),
        ]);
        assert_eq!(stash.find(&route, &Method::GET).as_deref(), Some(&1));
    }

    #[test]
    fn test_instances_are_disjoint_even_with_same_plugin_name() {
        // Keys are per-instance, not per-name: both stashes belong to a
        // plugin called "spec" and still never observe each other.
        let a: Stash<&str> = Stash::new();
        let b: Stash<&str> = Stash::new();
        assert_ne!(a.key(), b.key());

        let handler = HandlerId::next();
        a.store(handler, "a-value");

        let route = route_with(vec![(MethodKey::Method(Method::GET), handler)]);
        assert!(a.find(&route, &Method::GET).is_some());
        assert!(b.find(&route, &Method::GET).is_none());
    }

    #[test]
    fn test_wildcard_binding_does_not_match() {
        let stash: Stash<&str> = Stash::new();
        let handler = HandlerId::next();
        stash.store(handler, "hidden");

        let route = route_with(vec![(MethodKey::All, handler)]);
        assert!(stash.find(&route, &Method::GET).is_none());
    }
}
