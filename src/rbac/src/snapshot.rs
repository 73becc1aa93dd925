//! Exchange format for exporting and rebuilding a role graph
//!
//! A snapshot is two relations keyed by role ID: the IDs of the permissions a
//! role holds directly, and the IDs of its direct parents. It is read through
//! [`walk`](crate::walk) and rebuilt with `add`, `assign` and `set_parents`
//! only, so custom role and permission types round-trip through factories.

use crate::error::{RbacError, Result};
use crate::graph::RoleGraph;
use crate::permission::{ExactPermission, Permission, PermissionRef};
use crate::role::{Role, StdRole};
use crate::types::Key;
use crate::walk::walk;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use tracing::{info, warn};

/// Permissions and parents of one role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "K: Deserialize<'de>"))]
pub struct RoleRecord<K> {
    /// IDs of directly held permissions
    #[serde(default)]
    pub permissions: Vec<K>,

    /// IDs of direct parents
    #[serde(default)]
    pub parents: Vec<K>,
}

/// Point-in-time export of a role graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot<K: Key> {
    /// Records keyed by role ID
    pub roles: HashMap<K, RoleRecord<K>>,
}

impl<K: Key> GraphSnapshot<K> {
    /// Export every role of `graph`
    pub fn capture<R: Role<K>>(graph: &RoleGraph<K, R>) -> Self {
        let mut roles = HashMap::new();

        let captured: std::result::Result<(), Infallible> = walk(graph, |role: &R, parents: &[K]| {
            let permissions = role
                .permissions()
                .iter()
                .map(|permission| permission.id().clone())
                .collect();
            roles.insert(
                role.id().clone(),
                RoleRecord {
                    permissions,
                    parents: parents.to_vec(),
                },
            );
            Ok(())
        });
        if let Err(never) = captured {
            match never {}
        }

        Self { roles }
    }

    /// Check that every parent named in the snapshot is itself a role
    ///
    /// # Errors
    ///
    /// [`RbacError::Unmarshal`] naming the first dangling parent.
    pub fn validate(&self) -> Result<()> {
        for (id, record) in &self.roles {
            if let Some(parent) = record.parents.iter().find(|p| !self.roles.contains_key(*p)) {
                return Err(RbacError::Unmarshal(format!(
                    "role {} names unknown parent {}",
                    id, parent
                )));
            }
        }
        Ok(())
    }

    /// Rebuild the snapshot into `graph`
    ///
    /// All roles are registered before any edge is written. `role` builds an
    /// empty role for an ID and `permission` builds the permission for an ID;
    /// a permission factory may hand out cached handles so roles share them.
    ///
    /// Either the whole snapshot is applied or the graph is left as it was:
    /// if a step fails after roles were added, the roles added by this call
    /// are removed again, together with their edges.
    ///
    /// # Errors
    ///
    /// [`RbacError::Unmarshal`] if the snapshot is inconsistent,
    /// [`RbacError::RoleExists`] if a role is already registered in `graph`,
    /// [`RbacError::CircularInheritance`] if `graph` rejects mutual parentage
    /// and the snapshot contains it.
    pub fn restore<R, FR, FP>(&self, graph: &RoleGraph<K, R>, role: FR, permission: FP) -> Result<()>
    where
        R: Role<K>,
        FR: Fn(&K) -> R,
        FP: Fn(&K) -> PermissionRef<K>,
    {
        self.validate()?;
        if graph.config().reject_mutual_parentage {
            self.check_mutual()?;
        }
        if let Some(existing) = self.roles.keys().find(|id| graph.contains(id)) {
            return Err(RbacError::RoleExists(existing.to_string()));
        }

        let mut added: Vec<&K> = Vec::with_capacity(self.roles.len());
        if let Err(err) = self.apply(graph, &role, &permission, &mut added) {
            warn!("Snapshot restore failed, rolling back {} roles: {}", added.len(), err);
            for id in added {
                // Purges every edge written by this call as well
                let _ = graph.remove(id);
            }
            return Err(err);
        }

        info!("Restored {} roles from snapshot", self.roles.len());
        Ok(())
    }

    fn apply<'a, R, FR, FP>(
        &'a self,
        graph: &RoleGraph<K, R>,
        role: &FR,
        permission: &FP,
        added: &mut Vec<&'a K>,
    ) -> Result<()>
    where
        R: Role<K>,
        FR: Fn(&K) -> R,
        FP: Fn(&K) -> PermissionRef<K>,
    {
        for (id, record) in &self.roles {
            let new_role = role(id);
            for permission_id in &record.permissions {
                new_role.assign(permission(permission_id));
            }
            graph.add(new_role)?;
            added.push(id);
        }
        for (id, record) in &self.roles {
            if !record.parents.is_empty() {
                graph.set_parents(id, &record.parents)?;
            }
        }
        Ok(())
    }

    /// Self-edges and two-role cycles, as rejected by
    /// [`GraphConfig::reject_mutual_parentage`](crate::GraphConfig::reject_mutual_parentage)
    fn check_mutual(&self) -> Result<()> {
        for (id, record) in &self.roles {
            for parent in &record.parents {
                let reverse = self
                    .roles
                    .get(parent)
                    .is_some_and(|other| other.parents.contains(id));
                if parent == id || reverse {
                    return Err(RbacError::circular([id, parent]));
                }
            }
        }
        Ok(())
    }

    /// Rebuild into a graph of [`StdRole`]s holding [`ExactPermission`]s
    pub fn restore_exact(&self, graph: &RoleGraph<K, StdRole<K>>) -> Result<()> {
        let mut cache: HashMap<K, PermissionRef<K>> = HashMap::new();
        for record in self.roles.values() {
            for id in &record.permissions {
                cache
                    .entry(id.clone())
                    .or_insert_with(|| ExactPermission::shared(id.clone()));
            }
        }

        self.restore(
            graph,
            |id| StdRole::new(id.clone()),
            |id| match cache.get(id) {
                Some(shared) => shared.clone(),
                None => ExactPermission::shared(id.clone()),
            },
        )
    }

    /// Encode as JSON
    pub fn to_json(&self) -> serde_json::Result<String>
    where
        K: Serialize,
    {
        serde_json::to_string(self)
    }

    /// Decode from JSON
    ///
    /// # Errors
    ///
    /// [`RbacError::Unmarshal`] for malformed input.
    pub fn from_json(json: &str) -> Result<Self>
    where
        K: DeserializeOwned,
    {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;

    fn newsroom() -> RoleGraph<String> {
        let graph: RoleGraph<String> = RoleGraph::new();
        graph
            .add(StdRole::new("editor").with_permission(ExactPermission::shared("add-text")))
            .unwrap();
        graph
            .add(StdRole::new("photographer").with_permission(ExactPermission::shared("add-photo")))
            .unwrap();
        graph.add(StdRole::new("chief-editor")).unwrap();
        graph
            .set_parents(
                &"chief-editor".to_string(),
                &["editor".to_string(), "photographer".to_string()],
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_capture_records_permissions_and_parents() {
        let snapshot = GraphSnapshot::capture(&newsroom());

        assert_eq!(snapshot.roles.len(), 3);
        assert_eq!(snapshot.roles["editor"].permissions, vec!["add-text".to_string()]);
        let mut parents = snapshot.roles["chief-editor"].parents.clone();
        parents.sort();
        assert_eq!(parents, vec!["editor", "photographer"]);
    }

    #[test]
    fn test_json_restore_preserves_grants() {
        let json = GraphSnapshot::capture(&newsroom()).to_json().unwrap();
        let snapshot: GraphSnapshot<String> = GraphSnapshot::from_json(&json).unwrap();

        let restored: RoleGraph<String> = RoleGraph::new();
        snapshot.restore_exact(&restored).unwrap();

        let add_photo = ExactPermission::<String>::new("add-photo");
        assert!(restored.is_granted(&"chief-editor".to_string(), &add_photo));
        assert!(!restored.is_granted(&"editor".to_string(), &add_photo));
        assert_eq!(GraphSnapshot::capture(&restored).roles.len(), 3);
    }

    #[test]
    fn test_restore_shares_permission_handles() {
        let json = r#"{"roles":{"a":{"permissions":["read"]},"b":{"permissions":["read"]}}}"#;
        let snapshot: GraphSnapshot<String> = GraphSnapshot::from_json(json).unwrap();
        let graph: RoleGraph<String> = RoleGraph::new();
        snapshot.restore_exact(&graph).unwrap();

        let (a, _) = graph.get(&"a".to_string()).unwrap();
        let (b, _) = graph.get(&"b".to_string()).unwrap();
        let pa = a.permissions().pop().unwrap();
        let pb = b.permissions().pop().unwrap();
        assert!(std::sync::Arc::ptr_eq(&pa, &pb));
        assert_eq!(pa.id(), "read");
    }

    #[test]
    fn test_malformed_json_is_unmarshal_error() {
        let err = GraphSnapshot::<String>::from_json("{\"roles\": [").unwrap_err();
        assert!(matches!(err, RbacError::Unmarshal(_)));
    }

    #[test]
    fn test_dangling_parent_rejected_before_restore() {
        let json = r#"{"roles":{"a":{"parents":["ghost"]}}}"#;
        let snapshot: GraphSnapshot<String> = GraphSnapshot::from_json(json).unwrap();
        let graph: RoleGraph<String> = RoleGraph::new();

        assert!(matches!(snapshot.restore_exact(&graph), Err(RbacError::Unmarshal(_))));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_restore_into_populated_graph_fails_untouched() {
        let graph = newsroom();
        let snapshot = GraphSnapshot::capture(&graph);

        assert!(matches!(snapshot.restore_exact(&graph), Err(RbacError::RoleExists(_))));
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_integer_keys_round_trip() {
        let graph: RoleGraph<u64> = RoleGraph::new();
        graph
            .add(StdRole::new(1u64).with_permission(ExactPermission::shared(100u64)))
            .unwrap();
        graph.add(StdRole::new(2u64)).unwrap();
        graph.set_parent(&2, &1).unwrap();

        let json = GraphSnapshot::capture(&graph).to_json().unwrap();
        let restored: RoleGraph<u64> = RoleGraph::new();
        GraphSnapshot::<u64>::from_json(&json)
            .unwrap()
            .restore_exact(&restored)
            .unwrap();

        assert!(restored.is_granted(&2, &ExactPermission::<u64>::new(100u64)));
    }

    #[test]
    fn test_mutual_parents_rejected_without_partial_restore() {
        let json = r#"{"roles":{"a":{"parents":["b"]},"b":{"parents":["a"]}}}"#;
        let snapshot: GraphSnapshot<String> = GraphSnapshot::from_json(json).unwrap();
        let graph: RoleGraph<String> = RoleGraph::with_config(GraphConfig {
            reject_mutual_parentage: true,
            ..Default::default()
        });
        graph.add(StdRole::new("existing")).unwrap();

        let err = snapshot.restore_exact(&graph).unwrap_err();
        assert!(err.cycle_path().is_some());
        assert_eq!(graph.role_ids(), vec!["existing".to_string()]);

        // The permissive default accepts the same snapshot
        let permissive: RoleGraph<String> = RoleGraph::new();
        snapshot.restore_exact(&permissive).unwrap();
        assert_eq!(permissive.len(), 2);
    }

    #[test]
    fn test_conflicting_add_mid_restore_rolls_back() {
        let json = r#"{"roles":{"a":{"permissions":["read"]},"b":{"parents":["a"]},"c":{"parents":["a"]}}}"#;
        let snapshot: GraphSnapshot<String> = GraphSnapshot::from_json(json).unwrap();
        let graph: RoleGraph<String> = RoleGraph::new();

        // Another writer registers `c` after the up-front existence check
        let result = snapshot.restore(
            &graph,
            |id| {
                if id == "c" {
                    graph.add(StdRole::new("c")).unwrap();
                }
                StdRole::new(id.clone())
            },
            |id| ExactPermission::shared(id.clone()),
        );

        assert!(matches!(result, Err(RbacError::RoleExists(id)) if id == "c"));
        // Only the concurrently added role remains, with no edges
        assert_eq!(graph.role_ids(), vec!["c".to_string()]);
        assert!(graph.get_parents(&"c".to_string()).unwrap().is_empty());
    }

    /// Key type without a `Default` impl
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    struct TenantRole(String);

    impl std::fmt::Display for TenantRole {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    #[test]
    fn test_records_decode_for_keys_without_default() {
        let json = r#"{"roles":{"viewer":{"permissions":["read"]},"owner":{"parents":["viewer"]}}}"#;
        let snapshot: GraphSnapshot<TenantRole> = GraphSnapshot::from_json(json).unwrap();

        let owner = &snapshot.roles[&TenantRole("owner".into())];
        assert!(owner.permissions.is_empty());
        assert_eq!(owner.parents, vec![TenantRole("viewer".into())]);

        let graph: RoleGraph<TenantRole> = RoleGraph::new();
        snapshot.restore_exact(&graph).unwrap();
        assert!(graph.is_granted(
            &TenantRole("owner".into()),
            &ExactPermission::<TenantRole>::new(TenantRole("read".into()))
        ));
    }
}
