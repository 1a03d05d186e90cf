use crate::output::{print_json, print_table};
use anyhow::Context;
use sched_core::Snapshot;
use std::path::Path;

pub fn run(snapshot_path: &Path, out: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let snapshot = Snapshot::load(snapshot_path)
        .with_context(|| format!("failed to load snapshot {}", snapshot_path.display()))?;

    let transition = sched_core::plan(&snapshot).context("ordering pass failed")?;
    let report = transition.report(&snapshot);

    if let Some(out) = out {
        sched_core::io::write_json(out, &report)
            .with_context(|| format!("failed to write {}", out.display()))?;
    }

    if json {
        return print_json(&report);
    }

    if report.orderings.is_empty() && report.fencing.is_empty() {
        println!("No remote connection orderings.");
        return Ok(());
    }

    if !report.orderings.is_empty() {
        let rows = report
            .orderings
            .iter()
            .map(|o| vec![o.first.clone(), o.then.clone(), o.flags.join("|")])
            .collect();
        print_table(&["FIRST", "THEN", "FLAGS"], rows);
    }

    if !report.fencing.is_empty() {
        if !report.orderings.is_empty() {
            println!();
        }
        let rows = report
            .fencing
            .iter()
            .map(|f| {
                vec![
                    f.node.clone(),
                    f.reason.clone(),
                    if f.immediate { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect();
        print_table(&["NODE", "REASON", "IMMEDIATE"], rows);
    }

    Ok(())
}
