//! Content-addressed binary artifact storage.
//!
//! Encoded graph snapshots are stored as binary files in subdirectories of
//! the store. Each artifact has a header containing magic bytes, format
//! version, the producing tool version, and a checksum of the payload.

use std::path::{Path, PathBuf};

use depgraph_common::ContentHash;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;

/// Magic bytes identifying a dependency-graph artifact.
const ARTIFACT_MAGIC: [u8; 4] = *b"DGPH";

/// Current artifact format version. Increment on breaking changes to
/// the header or payload format.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Header prepended to every stored artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Magic bytes: must be `b"DGPH"`.
    pub magic: [u8; 4],

    /// Artifact format version.
    pub format_version: u32,

    /// Version of the tool that produced this artifact.
    pub tool_version: String,

    /// Content hash of the payload.
    pub checksum: ContentHash,
}

/// Content-addressed store for binary artifacts.
///
/// Each artifact lives at `<dir>/<subdir>/<key>.<ext>`.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Creates an artifact store rooted at `dir`.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Ensures that the subdirectory for the given artifact type exists.
    pub fn ensure_dirs(&self, subdir: &str) -> Result<(), StoreError> {
        let dir = self.dir.join(subdir);
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Io {
            path: dir,
            source: e,
        })
    }

    /// Returns the file path for an artifact with the given key.
    pub fn artifact_path(&self, subdir: &str, key: &str, ext: &str) -> PathBuf {
        self.dir.join(subdir).join(format!("{key}.{ext}"))
    }

    /// Writes `data` under the key derived from its content hash and returns the key.
    ///
    /// File layout: 4-byte little-endian header length, bincode header, payload.
    pub fn write_artifact(
        &self,
        subdir: &str,
        ext: &str,
        data: &[u8],
        tool_version: &str,
    ) -> Result<String, StoreError> {
        self.ensure_dirs(subdir)?;

        let checksum = ContentHash::from_bytes(data);
        let key = checksum.to_string();
        let path = self.artifact_path(subdir, &key, ext);

        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            tool_version: tool_version.to_string(),
            checksum,
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| StoreError::Serialization {
                reason: e.to_string(),
            })?;

        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + data.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(data);

        std::fs::write(&path, &output).map_err(|e| StoreError::Io { path, source: e })?;
        Ok(key)
    }

    /// Reads and validates an artifact, reporting why it was rejected.
    pub fn read_artifact_checked(
        &self,
        subdir: &str,
        key: &str,
        ext: &str,
    ) -> Result<Vec<u8>, StoreError> {
        let path = self.artifact_path(subdir, key, ext);
        let raw = std::fs::read(&path).map_err(|e| StoreError::Io {
            path: path.clone(),
            source: e,
        })?;

        let invalid = |reason: &str| StoreError::InvalidHeader {
            path: path.clone(),
            reason: reason.to_string(),
        };

        let len_bytes: [u8; 4] = raw
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| invalid("missing header length"))?;
        let header_len = u32::from_le_bytes(len_bytes) as usize;
        let header_bytes = raw
            .get(4..4 + header_len)
            .ok_or_else(|| invalid("truncated header"))?;

        let (header, _): (ArtifactHeader, usize) =
            bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
                .map_err(|e| invalid(&e.to_string()))?;

        if header.magic != ARTIFACT_MAGIC {
            return Err(invalid("bad magic bytes"));
        }
        if header.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(StoreError::VersionMismatch {
                path,
                expected: ARTIFACT_FORMAT_VERSION,
                actual: header.format_version,
            });
        }

        let payload = &raw[4 + header_len..];
        let actual = ContentHash::from_bytes(payload);
        if actual != header.checksum {
            return Err(StoreError::ChecksumMismatch {
                path,
                expected: header.checksum.to_string(),
                actual: actual.to_string(),
            });
        }

        Ok(payload.to_vec())
    }

    /// Reads an artifact, returning `None` if it is missing or fails validation.
    ///
    /// Corruption is a miss, not an error; rejected files are logged.
    pub fn read_artifact(&self, subdir: &str, key: &str, ext: &str) -> Option<Vec<u8>> {
        if !self.artifact_path(subdir, key, ext).exists() {
            return None;
        }
        match self.read_artifact_checked(subdir, key, ext) {
            Ok(payload) => Some(payload),
            Err(err) => {
                warn!(key, error = %err, "discarding unreadable artifact");
                None
            }
        }
    }

    /// Removes the artifact with `key`, if present.
    pub fn remove_artifact(&self, subdir: &str, key: &str, ext: &str) -> Result<bool, StoreError> {
        let path = self.artifact_path(subdir, key, ext);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path).map_err(|e| StoreError::Io { path, source: e })?;
        Ok(true)
    }

    /// Removes artifacts that are not in the set of live keys.
    ///
    /// Returns the number of files removed.
    pub fn gc(&self, subdir: &str, ext: &str, live_keys: &[&str]) -> Result<usize, StoreError> {
        let dir = self.dir.join(subdir);
        if !dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        let entries = std::fs::read_dir(&dir).map_err(|e| StoreError::Io {
            path: dir.clone(),
            source: e,
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io {
                path: dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ext) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !live_keys.contains(&stem) {
                    std::fs::remove_file(&path).map_err(|e| StoreError::Io {
                        path: path.clone(),
                        source: e,
                    })?;
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBDIR: &str = "snapshots";
    const EXT: &str = "graph";

    fn make_store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        (dir, store)
    }

    fn write_raw(store: &ArtifactStore, key: &str, header: &ArtifactHeader, payload: &[u8]) {
        store.ensure_dirs(SUBDIR).unwrap();
        let header_bytes =
            bincode::serde::encode_to_vec(header, bincode::config::standard()).unwrap();
        let mut output = Vec::new();
        output.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(payload);
        std::fs::write(store.artifact_path(SUBDIR, key, EXT), &output).unwrap();
    }

    fn header(magic: [u8; 4], format_version: u32, checksum_of: &[u8]) -> ArtifactHeader {
        ArtifactHeader {
            magic,
            format_version,
            tool_version: "0.1.0".to_string(),
            checksum: ContentHash::from_bytes(checksum_of),
        }
    }

    #[test]
    fn write_and_read_roundtrip() {
        let (_dir, store) = make_store();
        let data = b"encoded graph";
        let key = store.write_artifact(SUBDIR, EXT, data, "0.1.0").unwrap();
        assert_eq!(key, ContentHash::from_bytes(data).to_string());
        assert_eq!(store.read_artifact(SUBDIR, &key, EXT).unwrap(), data);
    }

    #[test]
    fn read_missing_returns_none() {
        let (_dir, store) = make_store();
        assert!(store.read_artifact(SUBDIR, "nonexistent", EXT).is_none());
        assert!(matches!(
            store.read_artifact_checked(SUBDIR, "nonexistent", EXT),
            Err(StoreError::Io { .. })
        ));
    }

    #[test]
    fn garbage_file_is_invalid_header() {
        let (_dir, store) = make_store();
        store.ensure_dirs(SUBDIR).unwrap();
        std::fs::write(store.artifact_path(SUBDIR, "junk", EXT), b"garbage data").unwrap();
        assert!(store.read_artifact(SUBDIR, "junk", EXT).is_none());
        assert!(matches!(
            store.read_artifact_checked(SUBDIR, "junk", EXT),
            Err(StoreError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn truncated_header_length() {
        let (_dir, store) = make_store();
        store.ensure_dirs(SUBDIR).unwrap();
        std::fs::write(store.artifact_path(SUBDIR, "short", EXT), b"AB").unwrap();
        assert!(store.read_artifact(SUBDIR, "short", EXT).is_none());
    }

    #[test]
    fn wrong_magic_rejected() {
        let (_dir, store) = make_store();
        write_raw(
            &store,
            "badmagic",
            &header(*b"AION", ARTIFACT_FORMAT_VERSION, b"data"),
            b"data",
        );
        let err = store
            .read_artifact_checked(SUBDIR, "badmagic", EXT)
            .unwrap_err();
        assert!(err.to_string().contains("bad magic"));
        assert!(store.read_artifact(SUBDIR, "badmagic", EXT).is_none());
    }

    #[test]
    fn wrong_version_rejected() {
        let (_dir, store) = make_store();
        write_raw(&store, "oldver", &header(ARTIFACT_MAGIC, 999, b"data"), b"data");
        assert!(matches!(
            store.read_artifact_checked(SUBDIR, "oldver", EXT),
            Err(StoreError::VersionMismatch { actual: 999, .. })
        ));
        assert!(store.read_artifact(SUBDIR, "oldver", EXT).is_none());
    }

    #[test]
    fn tampered_payload_rejected() {
        let (_dir, store) = make_store();
        write_raw(
            &store,
            "tampered",
            &header(ARTIFACT_MAGIC, ARTIFACT_FORMAT_VERSION, b"data"),
            b"tampered",
        );
        assert!(matches!(
            store.read_artifact_checked(SUBDIR, "tampered", EXT),
            Err(StoreError::ChecksumMismatch { .. })
        ));
        assert!(store.read_artifact(SUBDIR, "tampered", EXT).is_none());
    }

    #[test]
    fn remove_artifact_reports_presence() {
        let (_dir, store) = make_store();
        let key = store.write_artifact(SUBDIR, EXT, b"x", "0.1.0").unwrap();
        assert!(store.remove_artifact(SUBDIR, &key, EXT).unwrap());
        assert!(!store.remove_artifact(SUBDIR, &key, EXT).unwrap());
    }

    #[test]
    fn gc_removes_stale_artifacts() {
        let (_dir, store) = make_store();
        let key_a = store.write_artifact(SUBDIR, EXT, b"graph A", "0.1.0").unwrap();
        let _key_b = store.write_artifact(SUBDIR, EXT, b"graph B", "0.1.0").unwrap();

        let removed = store.gc(SUBDIR, EXT, &[key_a.as_str()]).unwrap();
        assert_eq!(removed, 1);
        assert!(store.read_artifact(SUBDIR, &key_a, EXT).is_some());
    }

    #[test]
    fn gc_nonexistent_dir_returns_zero() {
        let (_dir, store) = make_store();
        assert_eq!(store.gc("nonexistent", EXT, &[]).unwrap(), 0);
    }

    #[test]
    fn gc_ignores_other_extensions() {
        let (_dir, store) = make_store();
        store.ensure_dirs(SUBDIR).unwrap();
        std::fs::write(store.dir.join(SUBDIR).join("notes.txt"), b"keep").unwrap();
        assert_eq!(store.gc(SUBDIR, EXT, &[]).unwrap(), 0);
    }
}
