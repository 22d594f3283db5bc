//! Node reference identifiers.

use std::fmt;
use std::sync::Arc;

/// Identifier of a graph node, derived from its fully-qualified name.
///
/// Two nodes with equal names have equal ids. The name is shared, so cloning
/// an id is cheap. [`hash_code`](Self::hash_code) is a deterministic 32-bit
/// hash of the name, computed once at construction.
#[derive(Clone)]
pub struct ReferenceId {
    name: Arc<str>,
    hash: i32,
}

impl ReferenceId {
    /// Creates the id for the node named `name`.
    pub fn new(name: &str) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_64(name.as_bytes()) as u32 as i32;
        Self {
            name: Arc::from(name),
            hash,
        }
    }

    /// Returns the fully-qualified node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the deterministic 32-bit hash of the name.
    pub fn hash_code(&self) -> i32 {
        self.hash
    }
}

impl PartialEq for ReferenceId {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.name == other.name
    }
}

impl Eq for ReferenceId {}

impl std::hash::Hash for ReferenceId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReferenceId({})", self.name)
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
