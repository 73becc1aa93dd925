//! Role graph configuration

use serde::{Deserialize, Serialize};

/// Role graph configuration
///
/// Loading is left to the host application; missing fields fall back to
/// [`GraphConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Reject a self-edge or an edge whose reverse already exists
    ///
    /// Longer cycles are still only found by
    /// [`detect_cycle`](crate::detect_cycle).
    pub reject_mutual_parentage: bool,

    /// Capacity reserved for the role arena
    pub initial_capacity: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            reject_mutual_parentage: false,
            initial_capacity: 64,
        }
    }
}
