//! Save a role graph to JSON and load it back
//!
//! Run with `RUST_LOG=debug` to see every graph mutation.

use anyhow::{ensure, Context, Result};
use cretoai_rbac::{detect_cycle, ExactPermission, GraphSnapshot, Role, RoleGraph, StdRole};
use std::fs;

fn build_newsroom() -> Result<RoleGraph<String>> {
    let graph: RoleGraph<String> = RoleGraph::new();

    let add_text = ExactPermission::shared("add-text");
    let edit_text = ExactPermission::shared("edit-text");
    let add_photo = ExactPermission::shared("add-photo");
    let read_text = ExactPermission::shared("read-text");

    let editor: StdRole<String> = StdRole::new("editor");
    editor.assign(add_text);
    editor.assign(edit_text);
    graph.add(editor)?;

    let photographer: StdRole<String> = StdRole::new("photographer");
    photographer.assign(add_photo);
    graph.add(photographer)?;

    let reader: StdRole<String> = StdRole::new("reader");
    reader.assign(read_text);
    graph.add(reader)?;

    graph.add(StdRole::new("chief-editor"))?;

    graph.set_parents(
        &"chief-editor".to_string(),
        &["editor".to_string(), "photographer".to_string()],
    )?;
    graph.set_parent(&"editor".to_string(), &"reader".to_string())?;

    detect_cycle(&graph)?;
    Ok(graph)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cretoai_rbac=info".into()),
        )
        .with_target(true)
        .init();

    println!("=== Role Graph Persistence ===\n");

    let graph = build_newsroom()?;
    println!("1. Built newsroom graph with {} roles", graph.len());

    let json = GraphSnapshot::capture(&graph)
        .to_json()
        .context("failed to encode snapshot")?;
    let path = std::env::temp_dir().join("cretoai-rbac-newsroom.json");
    fs::write(&path, &json).with_context(|| format!("failed to write {}", path.display()))?;
    println!("2. Saved snapshot to {}", path.display());

    let loaded = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let restored: RoleGraph<String> = RoleGraph::new();
    GraphSnapshot::<String>::from_json(&loaded)?.restore_exact(&restored)?;
    detect_cycle(&restored)?;
    println!("3. Restored {} roles", restored.len());

    let chief = "chief-editor".to_string();
    println!("\n=== Grants for {} ===", chief);
    for permission in ["add-text", "edit-text", "add-photo", "read-text", "delete-text"] {
        let requested = ExactPermission::<String>::new(permission);
        let before = graph.is_granted(&chief, &requested);
        let after = restored.is_granted(&chief, &requested);
        ensure!(
            before == after,
            "grant for {} changed across the round trip",
            permission
        );
        println!("  {:<12} {}", permission, if after { "granted" } else { "denied" });
    }

    fs::remove_file(&path).ok();
    Ok(())
}
