//! Semantic model types.
//!
//! ## Key Types
//!
//! - [`Entity`] / [`EntityId`] - arena-allocated specification elements
//! - [`DataType`] - base types, custom (enum/bitmap/struct/typedef) references, lists
//! - [`Conformance`] - when an element is mandatory, optional or disallowed
//! - [`Constraint`] - legal values of a field
//! - [`Resolution`] - the slot every reference leaf carries
//!
//! Reference leaves are visited through [`ReferenceLeaf`], which is what the
//! resolver mutates.

mod conformance;
mod constraint;
mod entity;
mod quality;
mod types;


use smol_str::SmolStr;

use crate::doc::CrossReference;

pub use conformance::{
    Choice, ChoiceLimit, ComparisonExpression, ComparisonOperator, ComparisonValue, Conformance,
    ConformanceItem, EqualityExpression, Expression, IdentifierExpression, LogicalExpression,
    LogicalOperator, ReferenceExpression,
};
pub use constraint::{Constraint, Limit, MathOperator};
pub use entity::{
    Bitmap, BitmapBit, Cluster, ClusterRef, ClusterRequirement, ClusterSide, Command,
    CommandDirection, CommandResponse, Condition, DeviceType, ElementKind, ElementRequirement,
    Entity, EntityData, EntityId, EntityKind, Enum, EnumValue, Event, Feature, Field, FieldKind,
    Namespace, Revision, SemanticTag, Struct, TypeDef,
};
pub use quality::{Access, Privilege, Quality};
pub use types::{BaseType, CustomType, DataType};

/// Resolution state of one reference leaf.
///
/// `Unresolved → Resolved(entity)` or `Unresolved → Failed`; a failed leaf is
/// only retried by a later resolver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Resolution {
    #[default]
    Unresolved,
    Resolved(EntityId),
    Failed,
}

impl Resolution {
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Self::Resolved(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// What a reference leaf points at before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceTarget<'a> {
    Identifier(&'a SmolStr),
    Reference(&'a CrossReference),
}

impl ReferenceTarget<'_> {
    /// Text used in diagnostics.
    pub fn display_name(&self) -> SmolStr {
        match self {
            Self::Identifier(id) => (*id).clone(),
            Self::Reference(xref) => xref.id.clone(),
        }
    }
}

/// A mutable view of one reference leaf inside a conformance or constraint
/// tree.
#[derive(Debug)]
pub struct ReferenceLeaf<'a> {
    pub target: ReferenceTarget<'a>,
    /// `Enum.Value` style path following the head.
    pub field: &'a [SmolStr],
    pub resolution: &'a mut Resolution,
}

pub(crate) fn write_field_path(
    f: &mut std::fmt::Formatter<'_>,
    field: &[SmolStr],
) -> std::fmt::Result {
    for part in field {
        write!(f, ".{part}")?;
    }
    Ok(())
}
