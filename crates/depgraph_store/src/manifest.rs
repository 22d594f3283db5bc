//! Manifest of the named snapshots held by a store.
//!
//! Stored as `manifest.json` in the store directory. Each entry maps a
//! snapshot name (typically a build target) to the artifact key holding
//! its encoded graph.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;

/// Name of the manifest file within the store directory.
const MANIFEST_FILE: &str = "manifest.json";

/// Index of persisted snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotManifest {
    /// Tool version that produced the store. Invalidate on version change.
    pub tool_version: String,

    /// Snapshot entries keyed by name.
    pub snapshots: BTreeMap<String, SnapshotEntry>,
}

/// One persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Key of the artifact holding the encoded graph.
    pub artifact_key: String,

    /// Number of nodes in the snapshot when it was written.
    pub node_count: usize,
}

impl SnapshotManifest {
    /// Creates an empty manifest for the given tool version.
    pub fn new(tool_version: &str) -> Self {
        Self {
            tool_version: tool_version.to_string(),
            snapshots: BTreeMap::new(),
        }
    }

    /// Loads the manifest from `dir`, returning `None` if it is absent or unreadable.
    pub fn load(dir: &Path) -> Option<Self> {
        let path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        match Self::parse(&content) {
            Ok(manifest) => Some(manifest),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable snapshot manifest");
                None
            }
        }
    }

    /// Parses manifest JSON.
    pub fn parse(content: &str) -> Result<Self, StoreError> {
        serde_json::from_str(content).map_err(|e| StoreError::ManifestParse {
            reason: e.to_string(),
        })
    }

    /// Saves the manifest to `dir`, creating the directory if needed.
    pub fn save(&self, dir: &Path) -> Result<(), StoreError> {
        std::fs::create_dir_all(dir).map_err(|e| StoreError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| StoreError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| StoreError::Io { path, source: e })
    }

    /// Returns `true` if this manifest was produced by `current_version`.
    pub fn is_compatible(&self, current_version: &str) -> bool {
        self.tool_version == current_version
    }

    /// Artifact keys still referenced by some entry.
    pub fn live_keys(&self) -> Vec<&str> {
        self.snapshots
            .values()
            .map(|e| e.artifact_key.as_str())
            .collect()
    }
}
