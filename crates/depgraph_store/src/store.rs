//! Named graph snapshots persisted between builds.
//!
//! `SnapshotStore` ties the manifest and the artifact store together: the
//! build saves the graph it just produced under a name, and the next build
//! loads it back as the past state to diff against.

use std::path::{Path, PathBuf};

use depgraph_graph::GraphSnapshot;
use tracing::{debug, info, warn};

use crate::artifact::ArtifactStore;
use crate::error::StoreError;
use crate::manifest::{SnapshotEntry, SnapshotManifest};

/// Subdirectory holding encoded snapshots.
const SNAPSHOT_SUBDIR: &str = "snapshots";

/// File extension of encoded snapshots.
const SNAPSHOT_EXT: &str = "graph";

/// Persistent store of named [`GraphSnapshot`]s.
///
/// Opening never fails: a missing, unreadable, or version-incompatible
/// manifest starts an empty store, so the next build simply sees no past
/// state.
pub struct SnapshotStore {
    dir: PathBuf,
    manifest: SnapshotManifest,
    artifacts: ArtifactStore,
    tool_version: String,
}

impl SnapshotStore {
    /// Opens the store in `dir`, or starts a fresh one.
    pub fn open(dir: &Path, tool_version: &str) -> Self {
        let manifest = match SnapshotManifest::load(dir) {
            Some(m) if m.is_compatible(tool_version) => m,
            Some(m) => {
                info!(
                    found = %m.tool_version,
                    current = tool_version,
                    "snapshot store written by another version, starting fresh"
                );
                SnapshotManifest::new(tool_version)
            }
            None => SnapshotManifest::new(tool_version),
        };

        Self {
            dir: dir.to_path_buf(),
            manifest,
            artifacts: ArtifactStore::new(dir),
            tool_version: tool_version.to_string(),
        }
    }

    /// Directory the store lives in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The current manifest.
    pub fn manifest(&self) -> &SnapshotManifest {
        &self.manifest
    }

    /// Names of all stored snapshots, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.manifest.snapshots.keys().map(String::as_str)
    }

    /// Encodes and stores `snapshot` under `name`, replacing any previous entry.
    ///
    /// The manifest is written to disk before returning. Returns the artifact key.
    pub fn save_snapshot(
        &mut self,
        name: &str,
        snapshot: &GraphSnapshot,
    ) -> Result<String, StoreError> {
        let bytes = snapshot.write_to_bytes()?;
        let key = self.artifacts.write_artifact(
            SNAPSHOT_SUBDIR,
            SNAPSHOT_EXT,
            &bytes,
            &self.tool_version,
        )?;

        self.manifest.snapshots.insert(
            name.to_string(),
            SnapshotEntry {
                artifact_key: key.clone(),
                node_count: snapshot.len(),
            },
        );
        self.manifest.save(&self.dir)?;

        info!(name, key = %key, nodes = snapshot.len(), bytes = bytes.len(), "snapshot saved");
        Ok(key)
    }

    /// Loads the snapshot stored under `name`.
    ///
    /// Returns `Ok(None)` when there is no such entry or its artifact is
    /// missing or fails header validation. A payload that passes its
    /// checksum but does not decode is reported as
    /// [`StoreError::Graph`].
    pub fn load_snapshot(&self, name: &str) -> Result<Option<GraphSnapshot>, StoreError> {
        let Some(entry) = self.manifest.snapshots.get(name) else {
            debug!(name, "no stored snapshot");
            return Ok(None);
        };
        let Some(bytes) =
            self.artifacts
                .read_artifact(SNAPSHOT_SUBDIR, &entry.artifact_key, SNAPSHOT_EXT)
        else {
            return Ok(None);
        };

        let snapshot = GraphSnapshot::read_from_bytes(&bytes)?;
        if snapshot.len() != entry.node_count {
            warn!(
                name,
                expected = entry.node_count,
                actual = snapshot.len(),
                "snapshot node count differs from manifest"
            );
        }
        debug!(name, nodes = snapshot.len(), "snapshot loaded");
        Ok(Some(snapshot))
    }

    /// Drops the entry for `name` and persists the manifest.
    ///
    /// The artifact itself is reclaimed by [`gc`](Self::gc). Returns `true`
    /// if an entry was removed.
    pub fn remove(&mut self, name: &str) -> Result<bool, StoreError> {
        if self.manifest.snapshots.remove(name).is_none() {
            return Ok(false);
        }
        self.manifest.save(&self.dir)?;
        Ok(true)
    }

    /// Deletes artifacts no manifest entry refers to. Returns the number removed.
    pub fn gc(&self) -> Result<usize, StoreError> {
        let live = self.manifest.live_keys();
        let removed = self.artifacts.gc(SNAPSHOT_SUBDIR, SNAPSHOT_EXT, &live)?;
        if removed > 0 {
            info!(removed, "collected stale snapshots");
        }
        Ok(removed)
    }
}
