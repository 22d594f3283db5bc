//! Content hashing and output-path fingerprinting.
//!
//! Both hashes are XXH3, which is stable across process runs and platforms.
//! Persisted graphs depend on that stability: a fingerprint written by one
//! build must compare equal to the one recomputed by the next.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit content hash computed using XXH3 for integrity checks.
///
/// Used by the snapshot store to key artifacts and to validate payloads
/// read back from disk.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// A 64-bit XXH3 fingerprint of a node's declared output file path.
///
/// Together with the node's [`ReferenceId`](crate::ReferenceId) this forms
/// the content-independent identity used to pair nodes across snapshots.
/// On the wire it is written as a raw signed 64-bit integer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathFingerprint(u64);

impl PathFingerprint {
    /// Fingerprints the UTF-8 encoding of `path`.
    pub fn of(path: &str) -> Self {
        Self(xxhash_rust::xxh3::xxh3_64(path.as_bytes()))
    }

    /// Reconstructs a fingerprint from its raw wire value.
    pub fn from_raw(raw: i64) -> Self {
        Self(raw as u64)
    }

    /// Returns the raw wire value.
    pub fn as_raw(self) -> i64 {
        self.0 as i64
    }

    /// Returns the low 32 bits, reinterpreted as signed.
    pub fn low32(self) -> i32 {
        self.0 as u32 as i32
    }
}

impl fmt::Debug for PathFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathFingerprint({:016x})", self.0)
    }
}
