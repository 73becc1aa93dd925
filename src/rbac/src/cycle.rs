//! Circular inheritance detection
//!
//! Depth-first search from every role, following `child -> parent` edges.
//!
//! # Algorithm
//!
//! - `finished`: roles whose ancestry is proven acyclic; never explored again
//! - `path`: the roles on the active DFS branch, mirrored in `on_path`
//!
//! Reaching a role that is already on the path closes a cycle. The reported
//! path runs from that role's first occurrence to the end of the branch, so
//! it names exactly the cycle members in discovery order.
//!
//! The search keeps an explicit frame stack rather than recursing: each frame
//! owns the iterator over one role's parents, and the path is pushed and
//! popped in lockstep with the frames. Total work is O(V + E).

use crate::error::{RbacError, Result};
use crate::graph::{GraphState, RoleGraph};
use crate::role::Role;
use crate::types::Key;
use std::collections::HashSet;
use std::vec;
use tracing::{debug, warn};

/// Check the inheritance edges of `graph` for a cycle
///
/// Holds the graph lock exclusively for the whole run, so the answer reflects
/// a single point in time.
///
/// # Errors
///
/// [`RbacError::CircularInheritance`] carrying the offending cycle.
pub fn detect_cycle<K: Key, R: Role<K>>(graph: &RoleGraph<K, R>) -> Result<()> {
    let guard = graph.lock_exclusive();
    let state: &GraphState<K, R> = &guard;
    let mut finished: HashSet<&K> = HashSet::with_capacity(state.roles.len());

    for root in state.roles.keys() {
        if finished.contains(root) {
            continue;
        }
        if let Err(err) = explore(state, root, &mut finished) {
            warn!("{}", err);
            return Err(err);
        }
    }

    debug!("No circular inheritance among {} roles", state.roles.len());
    Ok(())
}

fn explore<'a, K: Key, R: Role<K>>(
    state: &'a GraphState<K, R>,
    root: &'a K,
    finished: &mut HashSet<&'a K>,
) -> Result<()> {
    let mut path: Vec<&'a K> = vec![root];
    let mut on_path: HashSet<&'a K> = HashSet::from([root]);
    let mut frames: Vec<vec::IntoIter<&'a K>> = vec![parents_of(state, root)];

    while let Some(frame) = frames.last_mut() {
        match frame.next() {
            Some(parent) => {
                if finished.contains(parent) {
                    continue;
                }
                if on_path.contains(parent) {
                    let start = path.iter().position(|id| *id == parent).unwrap_or(0);
                    return Err(RbacError::circular(path[start..].iter().copied()));
                }
                path.push(parent);
                on_path.insert(parent);
                frames.push(parents_of(state, parent));
            }
            None => {
                frames.pop();
                if let Some(done) = path.pop() {
                    on_path.remove(done);
                    finished.insert(done);
                }
            }
        }
    }

    Ok(())
}

fn parents_of<'a, K: Key, R>(state: &'a GraphState<K, R>, id: &K) -> vec::IntoIter<&'a K> {
    state
        .parents
        .get(id)
        .map(|parents| parents.iter().collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
}

impl<K: Key, R: Role<K>> RoleGraph<K, R> {
    /// Method form of [`detect_cycle`]
    pub fn detect_cycle(&self) -> Result<()> {
        detect_cycle(self)
    }
}
