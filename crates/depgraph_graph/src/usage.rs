//! Usages: references from a compiled unit to other named entities.

use serde::{Deserialize, Serialize};

use crate::codec::{ElementReader, ElementWriter, GraphElement, KindTag};
use crate::error::GraphResult;

/// A reference to a class by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassRef {
    /// Fully-qualified class name.
    pub class_name: String,
}

/// A reference to a field or method of some owner class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberRef {
    /// Fully-qualified owner class name.
    pub owner: String,
    /// Simple member name.
    pub name: String,
    /// Type descriptor of the member.
    pub descriptor: String,
}

/// A reference to a module by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleRef {
    /// Module name.
    pub module_name: String,
}

/// Where an annotation may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationTarget {
    /// Class, interface, or enum declaration.
    Type,
    /// Field declaration.
    Field,
    /// Method declaration.
    Method,
    /// Formal parameter.
    Parameter,
    /// Constructor declaration.
    Constructor,
    /// Local variable declaration.
    LocalVariable,
    /// Any use of a type.
    TypeUse,
}

/// A use of an annotation type, with the arguments the use site relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationRef {
    /// Fully-qualified annotation type.
    pub annotation_type: String,
    /// Names of the arguments explicitly given at the use site.
    pub used_arguments: Vec<String>,
    /// Targets the annotation is applied to.
    pub targets: Vec<AnnotationTarget>,
}

/// A single dependency edge recorded for a compiled unit.
///
/// Duplicates are allowed in a node's usage list; order is not meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Usage {
    /// Any reference to a class.
    Class(ClassRef),
    /// Instantiation of a class.
    ClassNew(ClassRef),
    /// Extension or implementation of a class.
    ClassExtends(ClassRef),
    /// Appearance in a sealed class's permits list.
    ClassPermits(ClassRef),
    /// `import static Owner.*`.
    ImportStaticOnDemand(ClassRef),
    /// Read of a field.
    Field(MemberRef),
    /// Write to a field.
    FieldAssign(MemberRef),
    /// Call of a method.
    Method(MemberRef),
    /// `import static Owner.member`.
    ImportStaticMember(MemberRef),
    /// Requirement on a module.
    Module(ModuleRef),
    /// Use of an annotation type.
    Annotation(AnnotationRef),
}

/// Wire tags of [`Usage`] variants.
///
/// Tags are persisted; never renumber an existing kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum UsageKind {
    /// Tag of [`Usage::Class`].
    Class = 1,
    /// Tag of [`Usage::ClassNew`].
    ClassNew = 2,
    /// Tag of [`Usage::ClassExtends`].
    ClassExtends = 3,
    /// Tag of [`Usage::ClassPermits`].
    ClassPermits = 4,
    /// Tag of [`Usage::ImportStaticOnDemand`].
    ImportStaticOnDemand = 5,
    /// Tag of [`Usage::Field`].
    Field = 6,
    /// Tag of [`Usage::FieldAssign`].
    FieldAssign = 7,
    /// Tag of [`Usage::Method`].
    Method = 8,
    /// Tag of [`Usage::ImportStaticMember`].
    ImportStaticMember = 9,
    /// Tag of [`Usage::Module`].
    Module = 10,
    /// Tag of [`Usage::Annotation`].
    Annotation = 11,
}

impl UsageKind {
    /// Every registered usage kind.
    pub const ALL: [UsageKind; 11] = [
        UsageKind::Class,
        UsageKind::ClassNew,
        UsageKind::ClassExtends,
        UsageKind::ClassPermits,
        UsageKind::ImportStaticOnDemand,
        UsageKind::Field,
        UsageKind::FieldAssign,
        UsageKind::Method,
        UsageKind::ImportStaticMember,
        UsageKind::Module,
        UsageKind::Annotation,
    ];
}

impl KindTag for UsageKind {
    const FAMILY: &'static str = "usage";

    fn tag(self) -> u8 {
        self as u8
    }

    fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl Usage {
    /// Returns the name of the entity this usage points at.
    ///
    /// For member usages this is the owner class.
    pub fn element_owner(&self) -> &str {
        match self {
            Usage::Class(r)
            | Usage::ClassNew(r)
            | Usage::ClassExtends(r)
            | Usage::ClassPermits(r)
            | Usage::ImportStaticOnDemand(r) => &r.class_name,
            Usage::Field(m) | Usage::FieldAssign(m) | Usage::Method(m) | Usage::ImportStaticMember(m) => {
                &m.owner
            }
            Usage::Module(m) => &m.module_name,
            Usage::Annotation(a) => &a.annotation_type,
        }
    }

    /// Shorthand for [`Usage::Class`].
    pub fn class(class_name: impl Into<String>) -> Self {
        Usage::Class(ClassRef {
            class_name: class_name.into(),
        })
    }

    /// Shorthand for [`Usage::Method`].
    pub fn method(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Usage::Method(MemberRef {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        })
    }

    /// Shorthand for [`Usage::Field`].
    pub fn field(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Usage::Field(MemberRef {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        })
    }
}

impl GraphElement for Usage {
    type Kind = UsageKind;

    fn kind(&self) -> UsageKind {
        match self {
            Usage::Class(_) => UsageKind::Class,
            Usage::ClassNew(_) => UsageKind::ClassNew,
            Usage::ClassExtends(_) => UsageKind::ClassExtends,
            Usage::ClassPermits(_) => UsageKind::ClassPermits,
            Usage::ImportStaticOnDemand(_) => UsageKind::ImportStaticOnDemand,
            Usage::Field(_) => UsageKind::Field,
            Usage::FieldAssign(_) => UsageKind::FieldAssign,
            Usage::Method(_) => UsageKind::Method,
            Usage::ImportStaticMember(_) => UsageKind::ImportStaticMember,
            Usage::Module(_) => UsageKind::Module,
            Usage::Annotation(_) => UsageKind::Annotation,
        }
    }

    fn write_payload<W: ElementWriter>(&self, out: &mut W) -> GraphResult<()> {
        match self {
            Usage::Class(r)
            | Usage::ClassNew(r)
            | Usage::ClassExtends(r)
            | Usage::ClassPermits(r)
            | Usage::ImportStaticOnDemand(r) => out.write_serde(r),
            Usage::Field(m) | Usage::FieldAssign(m) | Usage::Method(m) | Usage::ImportStaticMember(m) => {
                out.write_serde(m)
            }
            Usage::Module(m) => out.write_serde(m),
            Usage::Annotation(a) => out.write_serde(a),
        }
    }

    fn read_payload<R: ElementReader>(kind: UsageKind, input: &mut R) -> GraphResult<Self> {
        Ok(match kind {
            UsageKind::Class => Usage::Class(input.read_serde()?),
            UsageKind::ClassNew => Usage::ClassNew(input.read_serde()?),
            UsageKind::ClassExtends => Usage::ClassExtends(input.read_serde()?),
            UsageKind::ClassPermits => Usage::ClassPermits(input.read_serde()?),
            UsageKind::ImportStaticOnDemand => Usage::ImportStaticOnDemand(input.read_serde()?),
            UsageKind::Field => Usage::Field(input.read_serde()?),
            UsageKind::FieldAssign => Usage::FieldAssign(input.read_serde()?),
            UsageKind::Method => Usage::Method(input.read_serde()?),
            UsageKind::ImportStaticMember => Usage::ImportStaticMember(input.read_serde()?),
            UsageKind::Module => Usage::Module(input.read_serde()?),
            UsageKind::Annotation => Usage::Annotation(input.read_serde()?),
        })
    }
}
