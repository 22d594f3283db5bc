//! Base attributes shared by every graph node.

use bitflags::bitflags;
use depgraph_diff::{presence_diff, Difference, PresenceDiff};
use serde::{Deserialize, Serialize};

use crate::codec::{ElementReader, ElementWriter};
use crate::error::GraphResult;

bitflags! {
    /// Access and property flags of a compiled unit.
    ///
    /// The low 16 bits mirror class-file access flags. Higher bits carry
    /// properties the compiler reports that have no class-file counterpart.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AccessFlags: u32 {
        /// Visible everywhere.
        const PUBLIC = 0x0001;
        /// Visible to the declaring unit only.
        const PRIVATE = 0x0002;
        /// Visible to subclasses and the package.
        const PROTECTED = 0x0004;
        /// Declared static.
        const STATIC = 0x0008;
        /// Cannot be subclassed or overridden.
        const FINAL = 0x0010;
        /// Legacy invokespecial semantics.
        const SUPER = 0x0020;
        /// An interface.
        const INTERFACE = 0x0200;
        /// Declared abstract.
        const ABSTRACT = 0x0400;
        /// Compiler-generated.
        const SYNTHETIC = 0x1000;
        /// An annotation type.
        const ANNOTATION = 0x2000;
        /// An enum type.
        const ENUM = 0x4000;
        /// A module descriptor.
        const MODULE = 0x8000;
        /// Declared inside a method body.
        const LOCAL = 0x1_0000;
        /// Anonymous class.
        const ANONYMOUS = 0x2_0000;
        /// Produced by an annotation processor.
        const GENERATED = 0x4_0000;
        /// Permits a closed set of subclasses.
        const SEALED = 0x8_0000;
    }
}

/// An annotation attached to a compiled unit, carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementAnnotation {
    /// Fully-qualified annotation type.
    pub type_name: String,
    /// Fingerprint of the annotation's argument values.
    pub content_hash: u64,
}

impl ElementAnnotation {
    /// Creates an annotation record.
    pub fn new(type_name: impl Into<String>, content_hash: u64) -> Self {
        Self {
            type_name: type_name.into(),
            content_hash,
        }
    }
}

/// Flags, optional generic signature, name, and annotations of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proto {
    flags: AccessFlags,
    signature: Option<String>,
    name: String,
    annotations: Vec<ElementAnnotation>,
}

impl Proto {
    /// Creates the base attributes of a node named `name`.
    pub fn new(
        flags: AccessFlags,
        signature: Option<String>,
        name: impl Into<String>,
        annotations: impl IntoIterator<Item = ElementAnnotation>,
    ) -> Self {
        Self {
            flags,
            signature,
            name: name.into(),
            annotations: annotations.into_iter().collect(),
        }
    }

    /// Access and property flags.
    pub fn flags(&self) -> AccessFlags {
        self.flags
    }

    /// Generic signature, if the unit declares one.
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Fully-qualified name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Annotations attached to the unit.
    pub fn annotations(&self) -> &[ElementAnnotation] {
        &self.annotations
    }

    /// Writes flags, signature, name, then the annotation list.
    pub fn write<W: ElementWriter>(&self, out: &mut W) -> GraphResult<()> {
        out.write_i32(self.flags.bits() as i32);
        out.write_opt_str(self.signature.as_deref())?;
        out.write_str(&self.name)?;
        out.write_count(self.annotations.len())?;
        for annotation in &self.annotations {
            out.write_serde(annotation)?;
        }
        Ok(())
    }

    /// Reads the fields written by [`write`](Self::write).
    pub fn read<R: ElementReader>(input: &mut R) -> GraphResult<Self> {
        let flags = AccessFlags::from_bits_retain(input.read_i32()? as u32);
        let signature = input.read_opt_str()?;
        let name = input.read_str()?;
        let count = input.read_count()?;
        let mut annotations = Vec::new();
        for _ in 0..count {
            annotations.push(input.read_serde()?);
        }
        Ok(Self {
            flags,
            signature,
            name,
            annotations,
        })
    }

    /// Compares `self` (present) against `past`.
    pub fn diff<'a>(&'a self, past: &'a Proto) -> ProtoDiff<'a> {
        ProtoDiff {
            past,
            present: self,
            annotations: presence_diff(&past.annotations, &self.annotations),
        }
    }
}

/// Difference of the base attributes between two snapshots of a node.
pub struct ProtoDiff<'a> {
    past: &'a Proto,
    present: &'a Proto,
    annotations: PresenceDiff<'a, ElementAnnotation>,
}

impl<'a> ProtoDiff<'a> {
    /// Flags set now that were clear before.
    pub fn flags_added(&self) -> AccessFlags {
        self.present.flags - self.past.flags
    }

    /// Flags clear now that were set before.
    pub fn flags_removed(&self) -> AccessFlags {
        self.past.flags - self.present.flags
    }

    /// Returns `true` if the generic signature changed.
    pub fn signature_changed(&self) -> bool {
        self.past.signature != self.present.signature
    }

    /// Annotation presence difference.
    pub fn annotations(&self) -> &PresenceDiff<'a, ElementAnnotation> {
        &self.annotations
    }
}

impl Difference for ProtoDiff<'_> {
    fn unchanged(&self) -> bool {
        self.past.flags == self.present.flags
            && !self.signature_changed()
            && self.annotations.unchanged()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{BinaryReader, BinaryWriter};
    use depgraph_diff::Specifier;

    fn proto(flags: AccessFlags, signature: Option<&str>, annotations: &[&str]) -> Proto {
        Proto::new(
            flags,
            signature.map(str::to_owned),
            "com/acme/Widget",
            annotations.iter().map(|a| ElementAnnotation::new(*a, 1)),
        )
    }

    #[test]
    fn write_read_roundtrip() {
        let p = proto(
            AccessFlags::PUBLIC | AccessFlags::FINAL | AccessFlags::SEALED,
            Some("<T:Ljava/lang/Object;>Ljava/lang/Object;"),
            &["Deprecated", "JvmInline"],
        );
        let mut out = BinaryWriter::new();
        p.write(&mut out).unwrap();
        let bytes = out.into_bytes();
        let mut input = BinaryReader::new(&bytes);
        let back = Proto::read(&mut input).unwrap();
        input.finish().unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn identical_protos_unchanged() {
        let p = proto(AccessFlags::PUBLIC, None, &["Deprecated"]);
        let q = p.clone();
        assert!(q.diff(&p).unchanged());
    }

    #[test]
    fn flag_changes_reported() {
        let past = proto(AccessFlags::PUBLIC | AccessFlags::FINAL, None, &[]);
        let now = proto(AccessFlags::PUBLIC | AccessFlags::ABSTRACT, None, &[]);
        let diff = now.diff(&past);
        assert!(!diff.unchanged());
        assert_eq!(diff.flags_added(), AccessFlags::ABSTRACT);
        assert_eq!(diff.flags_removed(), AccessFlags::FINAL);
        assert!(!diff.signature_changed());
    }

    #[test]
    fn signature_change_reported() {
        let past = proto(AccessFlags::PUBLIC, None, &[]);
        let now = proto(AccessFlags::PUBLIC, Some("<T:Ljava/lang/Object;>"), &[]);
        let diff = now.diff(&past);
        assert!(diff.signature_changed());
        assert!(!diff.unchanged());
    }

    #[test]
    fn annotation_changes_reported() {
        let past = proto(AccessFlags::PUBLIC, None, &["Deprecated"]);
        let now = proto(AccessFlags::PUBLIC, None, &["Nullable"]);
        let diff = now.diff(&past);
        assert!(!diff.unchanged());
        let added: Vec<_> = diff.annotations().added().map(|a| a.type_name.as_str()).collect();
        assert_eq!(added, vec!["Nullable"]);
    }
}
