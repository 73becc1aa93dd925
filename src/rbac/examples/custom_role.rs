//! Role records carrying application metadata
//!
//! `LabeledRole` adds a label and a description to a role and delegates the
//! permission set to an embedded `StdRole`.

use anyhow::Result;
use cretoai_rbac::{
    detect_cycle, LayeredPermission, Permission, PermissionRef, Role, RoleGraph, StdRole,
};

struct LabeledRole {
    inner: StdRole<String>,
    label: String,
    description: String,
}

impl LabeledRole {
    fn new(id: &str, label: &str, description: &str) -> Self {
        Self {
            inner: StdRole::new(id),
            label: label.to_string(),
            description: description.to_string(),
        }
    }
}

impl Role<String> for LabeledRole {
    fn id(&self) -> &String {
        self.inner.id()
    }

    fn assign(&self, permission: PermissionRef<String>) {
        self.inner.assign(permission)
    }

    fn revoke(&self, permission: &dyn Permission<String>) {
        self.inner.revoke(permission)
    }

    fn permit(&self, permission: &dyn Permission<String>) -> bool {
        self.inner.permit(permission)
    }

    fn permissions(&self) -> Vec<PermissionRef<String>> {
        self.inner.permissions()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let graph: RoleGraph<String, LabeledRole> = RoleGraph::new();

    let admin = LabeledRole::new("admin", "Administrator", "Full access to the console");
    admin.assign(LayeredPermission::shared("console"));
    graph.add(admin)?;

    let auditor = LabeledRole::new("auditor", "Auditor", "Read-only access to reports");
    auditor.assign(LayeredPermission::shared("console:reports:read"));
    graph.add(auditor)?;

    graph.add(LabeledRole::new("ops", "Operations", "Inherits administrator access"))?;
    graph.set_parent(&"ops".to_string(), &"admin".to_string())?;
    detect_cycle(&graph)?;

    let requests = [
        "console:users:delete",
        "console:reports:read",
        "console:reports:read:2024",
        "billing",
    ];

    graph.walk(|role, parents| {
        println!("{} ({}): {}", role.label, role.id(), role.description);
        if !parents.is_empty() {
            println!("  inherits from: {}", parents.join(", "));
        }
        for request in requests {
            let granted = graph.is_granted(role.id(), &LayeredPermission::new(request));
            println!("  {:<28} {}", request, if granted { "granted" } else { "denied" });
        }
        Ok::<_, anyhow::Error>(())
    })?;

    Ok(())
}
