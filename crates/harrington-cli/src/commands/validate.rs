//! The `harrington validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use harrington_core::parser::{parse_snapshot, validate_snapshot};
use harrington_store::MemoryStore;

pub fn execute(snapshot_path: PathBuf) -> Result<()> {
    let snapshot = parse_snapshot(&snapshot_path)?;

    println!(
        "Snapshot: {} ({} ecosystems, {} projects, {} characteristics, {} terms, {} ranks)",
        snapshot_path.display(),
        snapshot.ecosystems.len(),
        snapshot.projects.len(),
        snapshot.characteristics.len(),
        snapshot.characteristic_terms.len(),
        snapshot.ranks.len()
    );

    let warnings = validate_snapshot(&snapshot);
    for w in &warnings {
        let prefix = w
            .ecosystem
            .as_ref()
            .map(|e| format!("  [{e}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    MemoryStore::from_snapshot(snapshot).context("snapshot violates a store constraint")?;

    if warnings.is_empty() {
        println!("Snapshot valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
