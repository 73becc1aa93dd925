//! Read-only view over a locked role graph

use super::GraphState;
use crate::permission::Permission;
use crate::role::Role;
use crate::types::Key;
use std::sync::Arc;

/// Read-only view of a role graph
///
/// Handed to assertions and to [`RoleGraph::with_view`](super::RoleGraph::with_view).
/// The view borrows state that is already locked for the current query, so
/// everything read through it is consistent, and none of its methods lock
/// again.
pub struct GraphView<'a, K: Key, R> {
    state: &'a GraphState<K, R>,
}

impl<'a, K: Key, R: Role<K>> GraphView<'a, K, R> {
    pub(crate) fn new(state: &'a GraphState<K, R>) -> Self {
        Self { state }
    }

    /// Returns true if `id` is registered
    pub fn contains(&self, id: &K) -> bool {
        self.state.roles.contains_key(id)
    }

    /// Role handle registered under `id`
    pub fn role(&self, id: &K) -> Option<Arc<R>> {
        self.state.roles.get(id).cloned()
    }

    /// Direct parents of `id`, or `None` if it is not registered
    pub fn parents(&self, id: &K) -> Option<Vec<K>> {
        self.contains(id).then(|| self.state.parent_ids(id))
    }

    /// Number of registered roles
    pub fn len(&self) -> usize {
        self.state.roles.len()
    }

    /// Returns true if no role is registered
    pub fn is_empty(&self) -> bool {
        self.state.roles.is_empty()
    }

    /// Inheritance-aware grant check, without assertion
    pub fn is_granted(&self, id: &K, permission: &dyn Permission<K>) -> bool {
        self.state.resolve(id, permission)
    }

    pub(crate) fn is_granted_with<F>(&self, id: &K, permission: &dyn Permission<K>, assertion: &F) -> bool
    where
        F: Fn(&GraphView<'_, K, R>, &K, &dyn Permission<K>) -> bool,
    {
        assertion(self, id, permission) && self.is_granted(id, permission)
    }
}
