//! Batch grant evaluation over several roles
//!
//! Each call evaluates every role against one consistent view of the graph:
//! the shared lock is taken once for the whole batch, so no mutation can land
//! between two individual checks.

use crate::graph::{GraphView, RoleGraph};
use crate::permission::Permission;
use crate::role::Role;
use crate::types::Key;

/// Returns true if at least one of `ids` is granted `permission`
///
/// Evaluates in order and stops at the first grant. An empty `ids` denies.
pub fn any_granted<K: Key, R: Role<K>>(
    graph: &RoleGraph<K, R>,
    ids: &[K],
    permission: &dyn Permission<K>,
) -> bool {
    graph.with_view(|view| ids.iter().any(|id| view.is_granted(id, permission)))
}

/// Returns true if every one of `ids` is granted `permission`
///
/// Evaluates in order and stops at the first denial. An empty `ids` grants.
pub fn all_granted<K: Key, R: Role<K>>(
    graph: &RoleGraph<K, R>,
    ids: &[K],
    permission: &dyn Permission<K>,
) -> bool {
    graph.with_view(|view| ids.iter().all(|id| view.is_granted(id, permission)))
}

/// [`any_granted`] with an assertion evaluated before each role is resolved
pub fn any_granted_with<K, R, F>(
    graph: &RoleGraph<K, R>,
    ids: &[K],
    permission: &dyn Permission<K>,
    assertion: F,
) -> bool
where
    K: Key,
    R: Role<K>,
    F: Fn(&GraphView<'_, K, R>, &K, &dyn Permission<K>) -> bool,
{
    graph.with_view(|view| {
        ids.iter()
            .any(|id| view.is_granted_with(id, permission, &assertion))
    })
}

/// [`all_granted`] with an assertion evaluated before each role is resolved
pub fn all_granted_with<K, R, F>(
    graph: &RoleGraph<K, R>,
    ids: &[K],
    permission: &dyn Permission<K>,
    assertion: F,
) -> bool
where
    K: Key,
    R: Role<K>,
    F: Fn(&GraphView<'_, K, R>, &K, &dyn Permission<K>) -> bool,
{
    graph.with_view(|view| {
        ids.iter()
            .all(|id| view.is_granted_with(id, permission, &assertion))
    })
}
