//! The `harrington init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("harrington.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("snapshots").context("failed to create snapshots/")?;
    write_if_missing(Path::new("snapshots/example.toml"), EXAMPLE_SNAPSHOT)?;

    println!("\nNext steps:");
    println!("  1. Edit snapshots/example.toml with your ecosystems and ranks");
    println!("  2. Run: harrington validate --snapshot snapshots/example.toml");
    println!("  3. Run: harrington score --ecosystem Example");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# harrington configuration

snapshot = "snapshots/example.toml"
parallelism = 4
output_dir = "./harrington-results"
drift_threshold = 0.05
"#;

const EXAMPLE_SNAPSHOT: &str = r#"# Terms of a leaf characteristic are defined over its rank.
# Terms of a potential are defined over the term indices of its leaves.

[[users]]
username = "admin"

[[terms]]
name = "small"
[[terms]]
name = "large"

[[characteristics]]
name = "Team Size"

[[characteristics]]
name = "Growth"
kind = "potential"

[[ecosystems]]
name = "Example"
owners = ["admin"]

[[projects]]
name = "First Project"
owners = ["admin"]

[[characteristic_terms]]
ecosystem = "Example"
characteristic = "Team Size"
index = 0
term = "small"
a1 = 0.0
a2 = 0.0
a3 = 5.0
a4 = 10.0

[[characteristic_terms]]
ecosystem = "Example"
characteristic = "Team Size"
index = 1
term = "large"
a1 = 5.0
a2 = 10.0
a3 = 20.0
a4 = 20.0

[[characteristic_terms]]
ecosystem = "Example"
characteristic = "Growth"
index = 0
term = "small"
a1 = 0.0
a2 = 0.0
a3 = 0.0
a4 = 1.0

[[characteristic_terms]]
ecosystem = "Example"
characteristic = "Growth"
index = 1
term = "large"
a1 = 0.0
a2 = 1.0
a3 = 1.0
a4 = 1.0

[[potential_weights]]
ecosystem = "Example"
potential = "Growth"
characteristic = "Team Size"
weight = 1.0

[[ranks]]
ecosystem = "Example"
project = "First Project"
characteristic = "Team Size"
rank = 7
"#;
