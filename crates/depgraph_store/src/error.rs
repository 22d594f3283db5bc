//! Error types for snapshot storage.

use std::path::PathBuf;

use depgraph_graph::GraphError;

/// Errors that can occur while persisting or loading graph snapshots.
///
/// Header and checksum problems are normally absorbed by the store as a
/// missing snapshot; they surface as values of this enum only through the
/// checked read path and in log output.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred while reading or writing store files.
    #[error("store I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The snapshot manifest could not be parsed as valid JSON.
    #[error("failed to parse snapshot manifest: {reason}")]
    ManifestParse {
        /// Description of the parse failure.
        reason: String,
    },

    /// An artifact file has an invalid or missing header.
    #[error("invalid artifact header in {path}: {reason}")]
    InvalidHeader {
        /// The artifact file path.
        path: PathBuf,
        /// Description of the header problem.
        reason: String,
    },

    /// The stored checksum does not match the payload.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The artifact file path.
        path: PathBuf,
        /// Checksum recorded in the header.
        expected: String,
        /// Checksum computed from the payload.
        actual: String,
    },

    /// The artifact format version is not the one this build writes.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The artifact file path.
        path: PathBuf,
        /// The expected format version.
        expected: u32,
        /// The format version found in the file.
        actual: u32,
    },

    /// A header or manifest could not be encoded.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The snapshot payload passed its checksum but does not decode.
    #[error(transparent)]
    Graph(#[from] GraphError),
}
