//! # CretoAI RBAC
//!
//! In-memory role-based access control with role inheritance.
//!
//! ## Model
//!
//! - a **permission** is an identifier plus a match rule
//! - a **role** owns a set of permissions
//! - the **role graph** owns the roles and the `child -> parents` edges; a
//!   role is granted everything its ancestors are granted
//!
//! Grant queries are fail-closed and total: a missing role, permission or
//! parent means "deny", never an error. Cycles are not rejected on write;
//! run [`detect_cycle`] after structural edits.
//!
//! ## Example
//!
//! ```rust
//! use cretoai_rbac::{detect_cycle, LayeredPermission, Role, RoleGraph, StdRole};
//!
//! let graph: RoleGraph<String> = RoleGraph::new();
//!
//! let admin: StdRole<String> = StdRole::new("admin");
//! admin.assign(LayeredPermission::shared("admin"));
//! graph.add(admin).unwrap();
//! graph.add(StdRole::new("ops")).unwrap();
//! graph.set_parent(&"ops".to_string(), &"admin".to_string()).unwrap();
//!
//! detect_cycle(&graph).unwrap();
//!
//! let dashboard = LayeredPermission::new("admin:dashboard");
//! assert!(graph.is_granted(&"ops".to_string(), &dashboard));
//! ```

pub mod bulk;
pub mod config;
pub mod cycle;
pub mod error;
pub mod graph;
pub mod permission;
pub mod role;
pub mod snapshot;
pub mod types;
pub mod walk;

// Re-export commonly used types
pub use bulk::{all_granted, all_granted_with, any_granted, any_granted_with};
pub use config::GraphConfig;
pub use cycle::detect_cycle;
pub use error::{RbacError, Result};
pub use graph::{GraphView, RoleGraph};
pub use permission::{
    ExactPermission, LayeredPermission, Permission, PermissionRef, DEFAULT_LAYER_SEPARATOR,
};
pub use role::{Role, StdRole};
pub use snapshot::{GraphSnapshot, RoleRecord};
pub use types::Key;
pub use walk::walk;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
