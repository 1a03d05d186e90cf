use crate::output::{print_json, print_table};
use anyhow::Context;
use sched_core::{is_failed_remote_node, node_state, Snapshot};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct NodeRow {
    node: String,
    kind: &'static str,
    connection: Option<String>,
    container: Option<String>,
    /// Current role of the connection, with the planned one if it changes.
    role: Option<String>,
    /// `None` for orphaned nodes with no connection resource.
    state: Option<&'static str>,
    failed_remote: bool,
}

pub fn run(snapshot_path: &Path, json: bool) -> anyhow::Result<()> {
    let snapshot = Snapshot::load(snapshot_path)
        .with_context(|| format!("failed to load snapshot {}", snapshot_path.display()))?;

    let mut rows = Vec::new();
    for (id, node) in snapshot.nodes().filter(|(_, n)| n.is_remote_or_guest()) {
        let connection = node.connection.map(|c| snapshot.resource(c));
        let state = match node.connection {
            Some(_) => Some(
                node_state(&snapshot, id)
                    .with_context(|| format!("failed to classify {}", node.name))?
                    .as_str(),
            ),
            None => None,
        };
        rows.push(NodeRow {
            node: node.name.clone(),
            kind: node.kind.as_str(),
            connection: connection.map(|c| c.name.clone()),
            container: connection
                .and_then(|c| c.container)
                .map(|v| snapshot.resource(v).name.clone()),
            role: connection.map(|c| {
                if c.role == c.next_role {
                    c.role.to_string()
                } else {
                    format!("{} -> {}", c.role, c.next_role)
                }
            }),
            state,
            failed_remote: is_failed_remote_node(&snapshot, id),
        });
    }

    if json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No remote or guest nodes.");
        return Ok(());
    }

    let dash = || "-".to_string();
    let table = rows
        .iter()
        .map(|r| {
            vec![
                r.node.clone(),
                r.kind.to_string(),
                r.connection.clone().unwrap_or_else(dash),
                r.container.clone().unwrap_or_else(dash),
                r.role.clone().unwrap_or_else(dash),
                r.state.map(str::to_string).unwrap_or_else(|| "orphaned".to_string()),
            ]
        })
        .collect();
    print_table(&["NODE", "KIND", "CONNECTION", "CONTAINER", "ROLE", "STATE"], table);
    Ok(())
}
