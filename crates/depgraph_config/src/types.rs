//! Configuration types deserialized from `depgraph.toml`.

use std::path::{Path, PathBuf};

use depgraph_graph::{DiffOptions, DEFAULT_PARALLEL_THRESHOLD};
use serde::Deserialize;

/// The top-level configuration parsed from `depgraph.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct DepGraphConfig {
    /// Where prior-state snapshots are kept.
    #[serde(default)]
    pub store: StoreConfig,
    /// How snapshot diffs are scheduled.
    #[serde(default)]
    pub diff: DiffConfig,
}

/// Snapshot store settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Store directory, relative to the project directory unless absolute.
    #[serde(default = "default_store_dir")]
    pub dir: String,
    /// Version stamped on stored snapshots. A store written under another
    /// version is discarded on open.
    #[serde(default = "default_tool_version")]
    pub tool_version: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
            tool_version: default_tool_version(),
        }
    }
}

impl StoreConfig {
    /// Resolves [`dir`](Self::dir) against `project_dir`.
    pub fn resolve_dir(&self, project_dir: &Path) -> PathBuf {
        let dir = Path::new(&self.dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            project_dir.join(dir)
        }
    }
}

fn default_store_dir() -> String {
    ".depgraph".to_string()
}

fn default_tool_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Snapshot diff scheduling.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DiffConfig {
    /// Allow matched node pairs to be diffed in parallel.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Matched pair count at which diffing goes parallel.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

fn default_parallel() -> bool {
    true
}

fn default_parallel_threshold() -> usize {
    DEFAULT_PARALLEL_THRESHOLD
}

impl From<&DiffConfig> for DiffOptions {
    fn from(config: &DiffConfig) -> Self {
        DiffOptions {
            parallel: config.parallel,
            parallel_threshold: config.parallel_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn defaults_match_diff_options() {
        let config = DepGraphConfig::default();
        assert_eq!(DiffOptions::from(&config.diff), DiffOptions::default());
        assert_eq!(config.store.dir, ".depgraph");
        assert_eq!(config.store.tool_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = load_config_from_str("[diff]\nparallel = false\n").unwrap();
        assert!(!config.diff.parallel);
        assert_eq!(config.diff.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
        assert_eq!(config.store, StoreConfig::default());
    }

    #[test]
    fn diff_config_converts() {
        let config = DiffConfig {
            parallel: true,
            parallel_threshold: 8,
        };
        let options = DiffOptions::from(&config);
        assert!(options.parallel);
        assert_eq!(options.parallel_threshold, 8);
    }

    #[test]
    fn relative_dir_resolves_under_project() {
        let store = StoreConfig::default();
        let resolved = store.resolve_dir(Path::new("/work/app"));
        assert_eq!(resolved, PathBuf::from("/work/app/.depgraph"));
    }

    #[cfg(unix)]
    #[test]
    fn absolute_dir_is_kept() {
        let store = StoreConfig {
            dir: "/var/cache/depgraph".to_string(),
            ..StoreConfig::default()
        };
        assert_eq!(
            store.resolve_dir(Path::new("/work/app")),
            PathBuf::from("/var/cache/depgraph")
        );
    }
}
