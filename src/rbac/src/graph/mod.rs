//! Role graph: role registry plus inheritance edges
//!
//! The graph owns every registered role and the `child -> parents` edges
//! between them. One reader/writer lock covers both maps so they are never
//! observed out of step with each other:
//!
//! - structural mutations (`add`, `remove`, `set_parent(s)`, `remove_parent`)
//!   take the lock exclusively
//! - queries (`get`, `get_parents`, `is_granted`, bulk evaluation, `walk`)
//!   take it shared, and grant resolution runs entirely under one acquisition
//!
//! Each role guards its own permission set with a separate lock. Code holding
//! the graph lock may take a role lock; the reverse order never happens.
//!
//! Edges are validated when written: both endpoints must be registered.
//! Cycles are *not* rejected (unless [`GraphConfig::reject_mutual_parentage`]
//! is set, and then only two-node cycles); run
//! [`detect_cycle`](crate::detect_cycle) after structural edits, because grant
//! resolution assumes an acyclic graph.

mod view;


pub use view::GraphView;

use crate::config::GraphConfig;
use crate::error::{RbacError, Result};
use crate::permission::Permission;
use crate::role::{Role, StdRole};
use crate::types::Key;
use parking_lot::{RwLock, RwLockWriteGuard};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Roles and edges guarded together by the graph lock
pub(crate) struct GraphState<K: Key, R> {
    pub(crate) roles: HashMap<K, Arc<R>>,
    pub(crate) parents: HashMap<K, HashSet<K>>,
}

impl<K: Key, R: Role<K>> GraphState<K, R> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            roles: HashMap::with_capacity(capacity),
            parents: HashMap::with_capacity(capacity),
        }
    }

    fn ensure_exists(&self, id: &K) -> Result<()> {
        if self.roles.contains_key(id) {
            Ok(())
        } else {
            Err(RbacError::role_not_exist(id))
        }
    }

    pub(crate) fn parent_ids(&self, id: &K) -> Vec<K> {
        self.parents
            .get(id)
            .map(|parents| parents.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn is_mutual(&self, id: &K, parent: &K) -> bool {
        id == parent
            || self
                .parents
                .get(parent)
                .is_some_and(|grandparents| grandparents.contains(id))
    }

    /// Depth-first grant resolution; unbounded on a cyclic graph
    pub(crate) fn resolve(&self, id: &K, permission: &dyn Permission<K>) -> bool {
        let Some(role) = self.roles.get(id) else {
            return false;
        };
        if role.permit(permission) {
            return true;
        }
        self.parents.get(id).is_some_and(|parents| {
            parents
                .iter()
                .any(|parent| self.resolve(parent, permission))
        })
    }
}

/// Role graph
///
/// Generic over the role key `K` (equality and hashing only) and the role
/// record `R`, which defaults to [`StdRole`].
///
/// # Example
///
/// ```
/// use cretoai_rbac::{ExactPermission, Role, RoleGraph, StdRole};
///
/// let graph: RoleGraph<String> = RoleGraph::new();
///
/// let editor: StdRole<String> = StdRole::new("editor");
/// editor.assign(ExactPermission::shared("add-text"));
///
/// graph.add(editor).unwrap();
/// graph.add(StdRole::new("chief-editor")).unwrap();
/// graph
///     .set_parent(&"chief-editor".to_string(), &"editor".to_string())
///     .unwrap();
///
/// let add_text = ExactPermission::<String>::new("add-text");
/// assert!(graph.is_granted(&"chief-editor".to_string(), &add_text));
/// assert!(!graph.is_granted(&"nobody".to_string(), &add_text));
/// ```
pub struct RoleGraph<K: Key, R: Role<K> = StdRole<K>> {
    state: RwLock<GraphState<K, R>>,
    config: GraphConfig,
}

impl<K: Key, R: Role<K>> RoleGraph<K, R> {
    /// Create an empty graph with the default configuration
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Create an empty graph with the given configuration
    pub fn with_config(config: GraphConfig) -> Self {
        info!(
            "RoleGraph initialized with reject_mutual_parentage={}, capacity={}",
            config.reject_mutual_parentage, config.initial_capacity
        );
        Self {
            state: RwLock::new(GraphState::with_capacity(config.initial_capacity)),
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Register a role
    ///
    /// # Errors
    ///
    /// [`RbacError::RoleExists`] if the ID is already registered.
    pub fn add(&self, role: impl Into<Arc<R>>) -> Result<()> {
        let role = role.into();
        let mut state = self.state.write();

        if state.roles.contains_key(role.id()) {
            return Err(RbacError::RoleExists(role.id().to_string()));
        }

        debug!("Adding role: {}", role.id());
        state.roles.insert(role.id().clone(), role);
        Ok(())
    }

    /// Remove a role and every edge naming it
    ///
    /// Descendants are kept; they only lose the inheritance path through `id`.
    ///
    /// # Errors
    ///
    /// [`RbacError::RoleNotExist`] if `id` is not registered.
    pub fn remove(&self, id: &K) -> Result<()> {
        let mut state = self.state.write();

        if state.roles.remove(id).is_none() {
            return Err(RbacError::role_not_exist(id));
        }
        state.parents.remove(id);
        state.parents.retain(|_, parents| {
            parents.remove(id);
            !parents.is_empty()
        });

        debug!("Removed role: {}", id);
        Ok(())
    }

    /// Add the edge `id -> parent`; re-adding an existing edge is a no-op
    ///
    /// # Errors
    ///
    /// [`RbacError::RoleNotExist`] if either endpoint is missing, or
    /// [`RbacError::CircularInheritance`] when mutual parentage is rejected.
    pub fn set_parent(&self, id: &K, parent: &K) -> Result<()> {
        let mut state = self.state.write();

        state.ensure_exists(id)?;
        state.ensure_exists(parent)?;
        self.check_mutual(&state, id, parent)?;

        debug!("Setting parent: {} -> {}", id, parent);
        state
            .parents
            .entry(id.clone())
            .or_default()
            .insert(parent.clone());
        Ok(())
    }

    /// Add an edge from `id` to each of `parents`
    ///
    /// Every parent is validated before any edge is written; on error no
    /// edge from this call is added.
    ///
    /// # Errors
    ///
    /// Same as [`set_parent`](Self::set_parent).
    pub fn set_parents(&self, id: &K, parents: &[K]) -> Result<()> {
        let mut state = self.state.write();

        state.ensure_exists(id)?;
        for parent in parents {
            state.ensure_exists(parent)?;
            self.check_mutual(&state, id, parent)?;
        }

        debug!("Setting {} parents for role: {}", parents.len(), id);
        state
            .parents
            .entry(id.clone())
            .or_default()
            .extend(parents.iter().cloned());
        Ok(())
    }

    /// Remove the edge `id -> parent`; removing a missing edge is a no-op
    ///
    /// # Errors
    ///
    /// [`RbacError::RoleNotExist`] if either endpoint is missing.
    pub fn remove_parent(&self, id: &K, parent: &K) -> Result<()> {
        let mut state = self.state.write();

        state.ensure_exists(id)?;
        state.ensure_exists(parent)?;

        let now_empty = match state.parents.get_mut(id) {
            Some(parents) => {
                parents.remove(parent);
                parents.is_empty()
            }
            None => false,
        };
        if now_empty {
            state.parents.remove(id);
        }

        debug!("Removed parent: {} -> {}", id, parent);
        Ok(())
    }

    /// Direct parents of `id`, in no particular order
    ///
    /// # Errors
    ///
    /// [`RbacError::RoleNotExist`] if `id` is not registered.
    pub fn get_parents(&self, id: &K) -> Result<Vec<K>> {
        let state = self.state.read();
        state.ensure_exists(id)?;
        Ok(state.parent_ids(id))
    }

    /// The role registered under `id` together with its direct parents
    ///
    /// # Errors
    ///
    /// [`RbacError::RoleNotExist`] if `id` is not registered.
    pub fn get(&self, id: &K) -> Result<(Arc<R>, Vec<K>)> {
        let state = self.state.read();
        match state.roles.get(id) {
            Some(role) => Ok((Arc::clone(role), state.parent_ids(id))),
            None => Err(RbacError::role_not_exist(id)),
        }
    }

    /// Returns true if `id` is registered
    pub fn contains(&self, id: &K) -> bool {
        self.state.read().roles.contains_key(id)
    }

    /// Number of registered roles
    pub fn len(&self) -> usize {
        self.state.read().roles.len()
    }

    /// Returns true if no role is registered
    pub fn is_empty(&self) -> bool {
        self.state.read().roles.is_empty()
    }

    /// IDs of all registered roles, in no particular order
    pub fn role_ids(&self) -> Vec<K> {
        self.state.read().roles.keys().cloned().collect()
    }

    /// Returns true if `id` or any of its ancestors covers `permission`
    ///
    /// Missing roles and missing permissions deny; this never errors.
    pub fn is_granted(&self, id: &K, permission: &dyn Permission<K>) -> bool {
        let granted = self.with_view(|view| view.is_granted(id, permission));
        debug!("Grant check: role={} permission={} granted={}", id, permission.id(), granted);
        granted
    }

    /// [`is_granted`](Self::is_granted) behind an assertion
    ///
    /// The assertion runs first, with a read-only view of the graph; if it
    /// returns false the request is denied without resolving inheritance.
    pub fn is_granted_with<F>(&self, id: &K, permission: &dyn Permission<K>, assertion: F) -> bool
    where
        F: Fn(&GraphView<'_, K, R>, &K, &dyn Permission<K>) -> bool,
    {
        let granted = self.with_view(|view| view.is_granted_with(id, permission, &assertion));
        debug!(
            "Asserted grant check: role={} permission={} granted={}",
            id,
            permission.id(),
            granted
        );
        granted
    }

    /// Run `f` against a consistent view under one shared acquisition
    ///
    /// Calling mutating methods of this graph from inside `f` deadlocks.
    pub fn with_view<T>(&self, f: impl FnOnce(&GraphView<'_, K, R>) -> T) -> T {
        let state = self.state.read();
        f(&GraphView::new(&state))
    }

    /// Copy of every role handle with its parents, taken under the read lock
    pub(crate) fn entries(&self) -> Vec<(Arc<R>, Vec<K>)> {
        let state = self.state.read();
        state
            .roles
            .iter()
            .map(|(id, role)| (Arc::clone(role), state.parent_ids(id)))
            .collect()
    }

    /// Exclusive access for whole-graph analysis passes
    pub(crate) fn lock_exclusive(&self) -> RwLockWriteGuard<'_, GraphState<K, R>> {
        self.state.write()
    }

    fn check_mutual(&self, state: &GraphState<K, R>, id: &K, parent: &K) -> Result<()> {
        if self.config.reject_mutual_parentage && state.is_mutual(id, parent) {
            warn!("Rejected mutual parentage: {} -> {}", id, parent);
            return Err(RbacError::circular([id, parent]));
        }
        Ok(())
    }
}

impl<K: Key, R: Role<K>> Default for RoleGraph<K, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, R: Role<K>> fmt::Debug for RoleGraph<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("RoleGraph")
            .field("roles", &state.roles.len())
            .field("edges", &state.parents.values().map(HashSet::len).sum::<usize>())
            .field("config", &self.config)
            .finish()
    }
}
