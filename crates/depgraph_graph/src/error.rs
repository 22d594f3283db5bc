//! Error types for graph element encoding and decoding.

/// Errors that can occur while reading or writing graph data.
///
/// Decoding never produces a partially populated node: any malformed or
/// truncated input surfaces as [`GraphError::CorruptGraphData`] and the
/// caller decides how to recover.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The serialized input is truncated or malformed.
    #[error("corrupt graph data: {reason}")]
    CorruptGraphData {
        /// Description of what could not be decoded.
        reason: String,
    },

    /// A value could not be encoded.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the encoding failure.
        reason: String,
    },
}

impl GraphError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptGraphData {
            reason: reason.into(),
        }
    }

    /// A kind tag with no entry in the registry of `family`.
    pub(crate) fn unknown_tag(family: &str, tag: u8) -> Self {
        Self::corrupt(format!("unknown {family} kind tag {tag}"))
    }
}

/// Result alias for graph encoding and decoding.
pub type GraphResult<T> = Result<T, GraphError>;
