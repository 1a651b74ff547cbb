//! Entities - arena-allocated specification elements.
//!
//! Entities are compared by [`EntityId`], never by value: two enums called
//! `ModeEnum` in different clusters are different entities.

use smol_str::SmolStr;

use super::{Access, Conformance, Constraint, DataType, Quality, Resolution};
use crate::base::Source;
use crate::doc::{CrossReference, ElementPath};

/// Handle of an entity in the specification arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EntityId(u32);

impl EntityId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Shift a document-local handle into the merged arena.
    pub(crate) fn offset(self, by: usize) -> Self {
        Self(self.0 + by as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EntityKind {
    Cluster,
    Field,
    Command,
    Event,
    Enum,
    EnumValue,
    Bitmap,
    BitmapBit,
    Struct,
    TypeDef,
    Feature,
    DeviceType,
    Condition,
    Namespace,
    SemanticTag,
    ClusterRequirement,
    ElementRequirement,
}

impl EntityKind {
    pub fn display(self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Field => "field",
            Self::Command => "command",
            Self::Event => "event",
            Self::Enum => "enum",
            Self::EnumValue => "enum value",
            Self::Bitmap => "bitmap",
            Self::BitmapBit => "bitmap bit",
            Self::Struct => "struct",
            Self::TypeDef => "typedef",
            Self::Feature => "feature",
            Self::DeviceType => "device type",
            Self::Condition => "condition",
            Self::Namespace => "namespace",
            Self::SemanticTag => "semantic tag",
            Self::ClusterRequirement => "cluster requirement",
            Self::ElementRequirement => "element requirement",
        }
    }

    /// Kinds a custom data type name can refer to.
    pub fn is_data_type(self) -> bool {
        matches!(self, Self::Enum | Self::Bitmap | Self::Struct | Self::TypeDef)
    }
}

/// Common entity header plus kind-specific data.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Entity {
    pub name: SmolStr,
    pub id: Option<u64>,
    pub parent: Option<EntityId>,
    pub source: Source,
    /// Structural location of the section or row that produced the entity.
    pub path: ElementPath,
    pub conformance: Option<Conformance>,
    pub data: EntityData,
}

impl Entity {
    pub fn new(name: impl Into<SmolStr>, source: Source, path: ElementPath, data: EntityData) -> Self {
        Self {
            name: name.into(),
            id: None,
            parent: None,
            source,
            path,
            conformance: None,
            data,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match &self.data {
            EntityData::Cluster(_) => EntityKind::Cluster,
            EntityData::Field(_) => EntityKind::Field,
            EntityData::Command(_) => EntityKind::Command,
            EntityData::Event(_) => EntityKind::Event,
            EntityData::Enum(_) => EntityKind::Enum,
            EntityData::EnumValue(_) => EntityKind::EnumValue,
            EntityData::Bitmap(_) => EntityKind::Bitmap,
            EntityData::BitmapBit(_) => EntityKind::BitmapBit,
            EntityData::Struct(_) => EntityKind::Struct,
            EntityData::TypeDef(_) => EntityKind::TypeDef,
            EntityData::Feature(_) => EntityKind::Feature,
            EntityData::DeviceType(_) => EntityKind::DeviceType,
            EntityData::Condition(_) => EntityKind::Condition,
            EntityData::Namespace(_) => EntityKind::Namespace,
            EntityData::SemanticTag(_) => EntityKind::SemanticTag,
            EntityData::ClusterRequirement(_) => EntityKind::ClusterRequirement,
            EntityData::ElementRequirement(_) => EntityKind::ElementRequirement,
        }
    }

    /// Entities owned by this one, in declaration order.
    pub fn children(&self) -> Vec<EntityId> {
        match &self.data {
            EntityData::Cluster(c) => [
                &c.features,
                &c.attributes,
                &c.commands,
                &c.events,
                &c.enums,
                &c.bitmaps,
                &c.structs,
                &c.typedefs,
            ]
            .into_iter()
            .flatten()
            .copied()
            .collect(),
            EntityData::Command(c) => c.fields.clone(),
            EntityData::Event(e) => e.fields.clone(),
            EntityData::Struct(s) => s.fields.clone(),
            EntityData::Enum(e) => e.values.clone(),
            EntityData::Bitmap(b) => b.bits.clone(),
            EntityData::DeviceType(d) => [
                &d.conditions,
                &d.cluster_requirements,
                &d.element_requirements,
            ]
            .into_iter()
            .flatten()
            .copied()
            .collect(),
            EntityData::Namespace(n) => n.tags.clone(),
            _ => Vec::new(),
        }
    }

    /// Shift every handle owned by this entity; used when a document's local
    /// arena is merged into the specification. Resolution slots are still
    /// unresolved at that point.
    pub(crate) fn rebase(&mut self, by: usize) {
        self.parent = self.parent.map(|p| p.offset(by));
        let shift = |ids: &mut Vec<EntityId>| {
            for id in ids.iter_mut() {
                *id = id.offset(by);
            }
        };
        match &mut self.data {
            EntityData::Cluster(c) => {
                for ids in [
                    &mut c.features,
                    &mut c.attributes,
                    &mut c.commands,
                    &mut c.events,
                    &mut c.enums,
                    &mut c.bitmaps,
                    &mut c.structs,
                    &mut c.typedefs,
                ] {
                    shift(ids);
                }
            }
            EntityData::Command(c) => shift(&mut c.fields),
            EntityData::Event(e) => shift(&mut e.fields),
            EntityData::Struct(s) => shift(&mut s.fields),
            EntityData::Enum(e) => shift(&mut e.values),
            EntityData::Bitmap(b) => shift(&mut b.bits),
            EntityData::DeviceType(d) => {
                shift(&mut d.conditions);
                shift(&mut d.cluster_requirements);
                shift(&mut d.element_requirements);
            }
            EntityData::Namespace(n) => shift(&mut n.tags),
            _ => {}
        }
    }

    pub fn data_type(&self) -> Option<&DataType> {
        match &self.data {
            EntityData::Field(f) => f.data_type.as_ref(),
            EntityData::TypeDef(t) => t.data_type.as_ref(),
            _ => None,
        }
    }

    pub fn constraint(&self) -> Option<&Constraint> {
        match &self.data {
            EntityData::Field(f) => f.constraint.as_ref(),
            EntityData::TypeDef(t) => t.constraint.as_ref(),
            EntityData::ElementRequirement(r) => r.constraint.as_ref(),
            _ => None,
        }
    }

    pub fn as_cluster(&self) -> Option<&Cluster> {
        match &self.data {
            EntityData::Cluster(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&Field> {
        match &self.data {
            EntityData::Field(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_device_type(&self) -> Option<&DeviceType> {
        match &self.data {
            EntityData::DeviceType(d) => Some(d),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EntityData {
    Cluster(Cluster),
    Field(Field),
    Command(Command),
    Event(Event),
    Enum(Enum),
    EnumValue(EnumValue),
    Bitmap(Bitmap),
    BitmapBit(BitmapBit),
    Struct(Struct),
    TypeDef(TypeDef),
    Feature(Feature),
    DeviceType(DeviceType),
    Condition(Condition),
    Namespace(Namespace),
    SemanticTag(SemanticTag),
    ClusterRequirement(ClusterRequirement),
    ElementRequirement(ElementRequirement),
}

// ============================================================================
// CLUSTERS
// ============================================================================

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cluster {
    /// `Base`, `Derived`, ... from the classification table.
    pub hierarchy: Option<String>,
    /// Declared base cluster of a derived cluster.
    pub base: Option<ClusterRef>,
    pub role: Option<String>,
    pub scope: Option<String>,
    pub pics: Option<SmolStr>,
    pub revisions: Vec<Revision>,
    pub features: Vec<EntityId>,
    pub attributes: Vec<EntityId>,
    pub commands: Vec<EntityId>,
    pub events: Vec<EntityId>,
    pub enums: Vec<EntityId>,
    pub bitmaps: Vec<EntityId>,
    pub structs: Vec<EntityId>,
    pub typedefs: Vec<EntityId>,
}

impl Cluster {
    pub fn parent_cluster(&self) -> Option<EntityId> {
        self.base.as_ref().and_then(|b| b.resolution.entity())
    }
}

/// A cluster named by text or cross-reference.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClusterRef {
    pub id: Option<u64>,
    pub name: SmolStr,
    pub reference: Option<CrossReference>,
    pub resolution: Resolution,
}

impl ClusterRef {
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Self {
            id: None,
            name: name.into(),
            reference: None,
            resolution: Resolution::Unresolved,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Revision {
    pub number: u32,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FieldKind {
    Attribute,
    StructField,
    CommandField,
    EventField,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Field {
    pub kind: FieldKind,
    pub data_type: Option<DataType>,
    pub constraint: Option<Constraint>,
    pub quality: Quality,
    pub default: Option<String>,
    pub access: Access,
    /// Detail section this row links to, if the name cell is a cross-reference.
    pub reference: Option<CrossReference>,
}

impl Field {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            data_type: None,
            constraint: None,
            quality: Quality::empty(),
            default: None,
            access: Access::default(),
            reference: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CommandDirection {
    ClientToServer,
    ServerToClient,
    Unknown,
}

impl CommandDirection {
    pub fn parse(text: &str) -> Self {
        if text.contains('⇐') || text.contains("<=") || text.contains("<-") {
            return Self::ServerToClient;
        }
        if text.contains('⇒') || text.contains("=>") || text.contains("->") {
            return Self::ClientToServer;
        }
        let lower = text.to_ascii_lowercase();
        let client = lower.find("client");
        let server = lower.find("server");
        match (client, server) {
            (Some(c), Some(s)) if c < s => Self::ClientToServer,
            (Some(_), Some(_)) => Self::ServerToClient,
            _ => Self::Unknown,
        }
    }
}

/// Response column of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CommandResponse {
    /// `Y`: a status response.
    Status,
    /// `N`: no response.
    None,
    /// Another command of the same cluster.
    Command {
        name: SmolStr,
        reference: Option<CrossReference>,
        resolution: Resolution,
    },
}

impl CommandResponse {
    pub fn parse(text: &str, reference: Option<CrossReference>) -> Option<Self> {
        let text = text.trim();
        match text {
            "" => None,
            "Y" | "y" => Some(Self::Status),
            "N" | "n" => Some(Self::None),
            name => Some(Self::Command {
                name: name.into(),
                reference,
                resolution: Resolution::Unresolved,
            }),
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Command {
    pub direction: CommandDirection,
    pub response: Option<CommandResponse>,
    pub access: Access,
    pub fields: Vec<EntityId>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Event {
    pub priority: Option<SmolStr>,
    pub quality: Quality,
    pub access: Access,
    pub fields: Vec<EntityId>,
}

/// A feature; the entity name is the long name (`Lighting`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Feature {
    pub bit: u32,
    /// Short code used in conformance (`LT`).
    pub code: SmolStr,
    pub summary: Option<String>,
}

// ============================================================================
// DATA TYPES
// ============================================================================

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Enum {
    pub values: Vec<EntityId>,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EnumValue {
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Bitmap {
    pub bits: Vec<EntityId>,
}

/// One bit or a contiguous bit range (`0..3`) of a bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BitmapBit {
    pub from: u32,
    pub to: u32,
}

impl BitmapBit {
    pub fn overlaps(&self, other: &BitmapBit) -> bool {
        self.from <= other.to && other.from <= self.to
    }
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Struct {
    pub fields: Vec<EntityId>,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TypeDef {
    pub data_type: Option<DataType>,
    pub constraint: Option<Constraint>,
}

// ============================================================================
// DEVICE TYPES & NAMESPACES
// ============================================================================

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceType {
    pub class: Option<String>,
    pub scope: Option<String>,
    pub superset: Option<SmolStr>,
    pub revisions: Vec<Revision>,
    pub conditions: Vec<EntityId>,
    pub cluster_requirements: Vec<EntityId>,
    pub element_requirements: Vec<EntityId>,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Condition {
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ClusterSide {
    Client,
    Server,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClusterRequirement {
    pub cluster: ClusterRef,
    pub side: Option<ClusterSide>,
    pub quality: Quality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ElementKind {
    Attribute,
    Command,
    Event,
    Feature,
}

impl ElementKind {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "attribute" => Some(Self::Attribute),
            "command" => Some(Self::Command),
            "event" => Some(Self::Event),
            "feature" => Some(Self::Feature),
            _ => None,
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            Self::Attribute => "attribute",
            Self::Command => "command",
            Self::Event => "event",
            Self::Feature => "feature",
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ElementRequirement {
    pub cluster: ClusterRef,
    pub element: ElementKind,
    pub element_name: SmolStr,
    pub target: Resolution,
    pub constraint: Option<Constraint>,
    pub access: Access,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Namespace {
    pub tags: Vec<EntityId>,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SemanticTag {
    pub summary: Option<String>,
}
