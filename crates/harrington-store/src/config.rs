//! Configuration loading and store factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use harrington_core::parser::parse_snapshot;

use crate::memory::MemoryStore;

/// Top-level harrington configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarringtonConfig {
    /// Snapshot loaded when no `--snapshot` is given.
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
    /// Max projects scored concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for score reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Absolute score change below which a comparison counts as unchanged.
    #[serde(default = "default_drift_threshold")]
    pub drift_threshold: f64,
}

fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./harrington-results")
}
fn default_drift_threshold() -> f64 {
    0.05
}

impl Default for HarringtonConfig {
    fn default() -> Self {
        Self {
            snapshot: None,
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
            drift_threshold: default_drift_threshold(),
        }
    }
}

impl HarringtonConfig {
    /// The snapshot to load: an explicit path wins over the configured one.
    pub fn snapshot_path(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.snapshot.clone())
            .context("no snapshot given: pass --snapshot or set `snapshot` in harrington.toml")
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again, so a value containing `${...}`
/// is inserted literally.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut cursor = 0;
    while let Some(offset) = result[cursor..].find("${") {
        let start = cursor + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        cursor = start + value.len();
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `harrington.toml` in the current directory
/// 2. `~/.config/harrington/config.toml`
///
/// Environment variable overrides: `HARRINGTON_SNAPSHOT`, `HARRINGTON_PARALLELISM`.
pub fn load_config() -> Result<HarringtonConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<HarringtonConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("harrington.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<HarringtonConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => HarringtonConfig::default(),
    };

    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply `HARRINGTON_*` overrides, then resolve `${VAR}` references in paths.
fn apply_overrides(
    mut config: HarringtonConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<HarringtonConfig> {
    if let Some(snapshot) = lookup("HARRINGTON_SNAPSHOT") {
        config.snapshot = Some(PathBuf::from(snapshot));
    }
    if let Some(parallelism) = lookup("HARRINGTON_PARALLELISM") {
        config.parallelism = parallelism
            .trim()
            .parse()
            .with_context(|| format!("invalid HARRINGTON_PARALLELISM: {parallelism}"))?;
    }

    config.snapshot = config.snapshot.as_deref().map(resolve_path);
    config.output_dir = resolve_path(&config.output_dir);
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("harrington"))
}

/// Parse a snapshot file and load it into a fresh store.
pub fn open_store(path: &Path) -> Result<MemoryStore> {
    let snapshot = parse_snapshot(path)?;
    MemoryStore::from_snapshot(snapshot)
        .with_context(|| format!("snapshot {} violates a store constraint", path.display()))
}
