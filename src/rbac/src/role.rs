//! Role capability and the standard role implementation

use crate::permission::{Permission, PermissionRef};
use crate::types::Key;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

/// Role capability
///
/// A role owns its permissions directly. It knows nothing about parents;
/// inheritance edges live in the [`RoleGraph`](crate::RoleGraph).
///
/// All methods take `&self`: implementations guard their permission set with
/// their own lock so a registered role can still be edited through a shared
/// handle. Custom roles usually hold a [`StdRole`] and delegate to it.
pub trait Role<K: Key>: Send + Sync + 'static {
    /// Role identifier
    fn id(&self) -> &K;

    /// Add a permission, replacing any held permission with the same ID
    fn assign(&self, permission: PermissionRef<K>);

    /// Remove the permission with the same ID; a no-op if not held
    fn revoke(&self, permission: &dyn Permission<K>);

    /// Returns true if a directly held permission covers `permission`
    fn permit(&self, permission: &dyn Permission<K>) -> bool;

    /// Snapshot of the directly held permissions
    fn permissions(&self) -> Vec<PermissionRef<K>>;
}

/// Standard role: an ID plus a lock-guarded permission map
pub struct StdRole<K: Key> {
    id: K,
    permissions: RwLock<HashMap<K, PermissionRef<K>>>,
}

impl<K: Key> StdRole<K> {
    /// Create a role with no permissions
    pub fn new(id: impl Into<K>) -> Self {
        Self {
            id: id.into(),
            permissions: RwLock::new(HashMap::new()),
        }
    }

    /// Builder-style `assign`
    pub fn with_permission(self, permission: PermissionRef<K>) -> Self {
        self.assign(permission);
        self
    }

    /// Number of directly held permissions
    pub fn permission_count(&self) -> usize {
        self.permissions.read().len()
    }
}

impl<K: Key> Role<K> for StdRole<K> {
    fn id(&self) -> &K {
        &self.id
    }

    fn assign(&self, permission: PermissionRef<K>) {
        let id = permission.id().clone();
        self.permissions.write().insert(id, permission);
    }

    fn revoke(&self, permission: &dyn Permission<K>) {
        self.permissions.write().remove(permission.id());
    }

    fn permit(&self, permission: &dyn Permission<K>) -> bool {
        if permission.is_unset() {
            return false;
        }
        self.permissions
            .read()
            .values()
            .any(|held| held.matches(permission))
    }

    fn permissions(&self) -> Vec<PermissionRef<K>> {
        self.permissions.read().values().cloned().collect()
    }
}

impl<K: Key> fmt::Debug for StdRole<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let permissions = self.permissions.read();
        f.debug_struct("StdRole")
            .field("id", &self.id)
            .field("permissions", &permissions.keys().collect::<Vec<_>>())
            .finish()
    }
}
