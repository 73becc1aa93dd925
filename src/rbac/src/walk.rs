//! Role graph traversal for export and inspection

use crate::graph::RoleGraph;
use crate::role::Role;
use crate::types::Key;
use tracing::debug;

/// Visit every registered role together with its direct parents
///
/// The roles and edges are copied under the read lock and the lock is
/// released before the first call to `handler`, so the handler may call back
/// into the graph, mutations included. Edits made during the walk are not
/// reflected in the remaining visits.
///
/// Stops at, and returns, the first error produced by `handler`. Roles are
/// visited in no particular order.
pub fn walk<K, R, E, F>(graph: &RoleGraph<K, R>, mut handler: F) -> Result<(), E>
where
    K: Key,
    R: Role<K>,
    F: FnMut(&R, &[K]) -> Result<(), E>,
{
    let entries = graph.entries();
    debug!("Walking {} roles", entries.len());

    for (role, parents) in &entries {
        handler(role, parents)?;
    }
    Ok(())
}

impl<K: Key, R: Role<K>> RoleGraph<K, R> {
    /// Method form of [`walk`]
    pub fn walk<E, F>(&self, handler: F) -> Result<(), E>
    where
        F: FnMut(&R, &[K]) -> Result<(), E>,
    {
        walk(self, handler)
    }
}
