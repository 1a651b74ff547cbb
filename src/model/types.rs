//! Data types of fields, attributes and type definitions.

use std::fmt;

use smol_str::SmolStr;

use super::{EntityId, Resolution};
use crate::doc::CrossReference;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DataType {
    Base(BaseType),
    Custom(CustomType),
    List(Box<DataType>),
}

/// A named enum / bitmap / struct / typedef, resolved after building.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CustomType {
    pub name: SmolStr,
    pub reference: Option<CrossReference>,
    pub resolution: Resolution,
}

impl DataType {
    /// Parse a type cell rendered as expression text.
    ///
    /// `list[T]` nests; a lone `<<ref,Label>>` marker becomes a custom type
    /// carrying the cross-reference; names not in the base vocabulary are
    /// custom types.
    pub fn parse(text: &str) -> Option<DataType> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let lower = text.to_ascii_lowercase();
        if lower.starts_with("list[") && text.ends_with(']') {
            return DataType::parse(&text[5..text.len() - 1]).map(|t| DataType::List(Box::new(t)));
        }
        if let Some(rest) = lower.strip_prefix("list of ") {
            let offset = text.len() - rest.len();
            return DataType::parse(&text[offset..]).map(|t| DataType::List(Box::new(t)));
        }
        if text.starts_with("<<") && text.ends_with(">>") {
            let body = &text[2..text.len() - 2];
            let (id, label) = match body.split_once(',') {
                Some((id, label)) => (id.trim(), Some(label.trim())),
                None => (body.trim(), None),
            };
            let name = label.unwrap_or(id);
            if let Some(base) = BaseType::from_name(name) {
                return Some(DataType::Base(base));
            }
            return Some(DataType::Custom(CustomType {
                name: name.into(),
                reference: Some(CrossReference {
                    id: id.into(),
                    label: label.map(SmolStr::from),
                }),
                resolution: Resolution::Unresolved,
            }));
        }
        if let Some(base) = BaseType::from_name(text) {
            return Some(DataType::Base(base));
        }
        Some(DataType::Custom(CustomType {
            name: text.into(),
            reference: None,
            resolution: Resolution::Unresolved,
        }))
    }

    pub fn custom(name: impl Into<SmolStr>) -> Self {
        Self::Custom(CustomType {
            name: name.into(),
            reference: None,
            resolution: Resolution::Unresolved,
        })
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// The base type, looking through nothing: lists have none.
    pub fn base_type(&self) -> Option<BaseType> {
        match self {
            Self::Base(base) => Some(*base),
            _ => None,
        }
    }

    /// The innermost custom type, looking through lists.
    pub fn custom_type(&self) -> Option<&CustomType> {
        match self {
            Self::Custom(custom) => Some(custom),
            Self::List(inner) => inner.custom_type(),
            Self::Base(_) => None,
        }
    }

    pub fn custom_type_mut(&mut self) -> Option<&mut CustomType> {
        match self {
            Self::Custom(custom) => Some(custom),
            Self::List(inner) => inner.custom_type_mut(),
            Self::Base(_) => None,
        }
    }

    /// The resolved entity of the innermost custom type.
    pub fn entity(&self) -> Option<EntityId> {
        self.custom_type().and_then(|c| c.resolution.entity())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base(base) => f.write_str(base.name()),
            Self::Custom(custom) => match &custom.reference {
                Some(reference) => write!(f, "{reference}"),
                None => f.write_str(&custom.name),
            },
            Self::List(inner) => write!(f, "list[{inner}]"),
        }
    }
}

macro_rules! base_types {
    (@first $first:literal $(, $rest:literal)*) => { $first };
    (@range $range:expr) => { Some($range) };
    (@range) => { None };
    ($($variant:ident => [$($name:literal),+] $(, $range:expr)?;)*) => {
        /// Built-in data types.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        pub enum BaseType {
            $($variant,)*
        }

        impl BaseType {
            /// Look up a base type by any of its spellings (case-insensitive).
            pub fn from_name(name: &str) -> Option<BaseType> {
                let lower = name.trim().to_ascii_lowercase();
                match lower.as_str() {
                    $($($name)|+ => Some(BaseType::$variant),)*
                    _ => None,
                }
            }

            /// Canonical spelling.
            pub fn name(self) -> &'static str {
                match self {
                    $(BaseType::$variant => base_types!(@first $($name),+),)*
                }
            }

            /// Full inclusive value range, for numeric types.
            pub fn range(self) -> Option<(i128, i128)> {
                match self {
                    $(BaseType::$variant => base_types!(@range $($range)?),)*
                }
            }
        }
    };
}

const fn unsigned(bits: u32) -> (i128, i128) {
    (0, (1i128 << bits) - 1)
}

const fn signed(bits: u32) -> (i128, i128) {
    (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
}

base_types! {
    Bool => ["bool", "boolean"], (0, 1);
    Uint8 => ["uint8"], unsigned(8);
    Uint16 => ["uint16"], unsigned(16);
    Uint24 => ["uint24"], unsigned(24);
    Uint32 => ["uint32"], unsigned(32);
    Uint40 => ["uint40"], unsigned(40);
    Uint48 => ["uint48"], unsigned(48);
    Uint56 => ["uint56"], unsigned(56);
    Uint64 => ["uint64"], unsigned(64);
    Int8 => ["int8"], signed(8);
    Int16 => ["int16"], signed(16);
    Int24 => ["int24"], signed(24);
    Int32 => ["int32"], signed(32);
    Int40 => ["int40"], signed(40);
    Int48 => ["int48"], signed(48);
    Int56 => ["int56"], signed(56);
    Int64 => ["int64"], signed(64);
    Single => ["single", "float"];
    Double => ["double"];
    OctetString => ["octstr", "octet string", "octet-string"];
    String => ["string", "char string", "character string"];
    Enum8 => ["enum8"], unsigned(8);
    Enum16 => ["enum16"], unsigned(16);
    Map8 => ["map8", "bitmap8"], unsigned(8);
    Map16 => ["map16", "bitmap16"], unsigned(16);
    Map32 => ["map32", "bitmap32"], unsigned(32);
    Map64 => ["map64", "bitmap64"], unsigned(64);
    Percent => ["percent"], (0, 100);
    Percent100ths => ["percent100ths"], (0, 10000);
    Temperature => ["temperature"], (-27315, 32767);
    EpochS => ["epoch-s"], unsigned(32);
    EpochUs => ["epoch-us"], unsigned(64);
    PosixMs => ["posix-ms"], unsigned(64);
    SystimeMs => ["systime-ms"], unsigned(64);
    SystimeUs => ["systime-us"], unsigned(64);
    ElapsedS => ["elapsed-s"], unsigned(32);
    UtcTime => ["utc"], unsigned(32);
    Amperage => ["amperage-ma"], signed(64);
    Voltage => ["voltage-mv"], signed(64);
    Power => ["power-mw"], signed(64);
    Energy => ["energy-mwh"], signed(64);
    NodeId => ["node-id"], unsigned(64);
    GroupId => ["group-id"], unsigned(16);
    EndpointNo => ["endpoint-no"], unsigned(16);
    VendorId => ["vendor-id"], unsigned(16);
    ClusterId => ["cluster-id"], unsigned(32);
    AttributeId => ["attrib-id", "attribute-id"], unsigned(32);
    FieldId => ["field-id"], unsigned(32);
    EventId => ["event-id"], unsigned(32);
    CommandId => ["command-id"], unsigned(32);
    ActionId => ["action-id"], unsigned(8);
    TransactionId => ["trans-id"], unsigned(32);
    DeviceTypeId => ["devtype-id"], unsigned(32);
    FabricId => ["fabric-id"], unsigned(64);
    FabricIdx => ["fabric-idx"], unsigned(8);
    EntryIdx => ["entry-idx"], unsigned(16);
    DataVersion => ["data-ver"], unsigned(32);
    EventNo => ["event-no"], unsigned(64);
    Status => ["status"], unsigned(8);
    Priority => ["priority"], unsigned(8);
    TimeOfDay => ["tod"];
    Date => ["date"];
    IpAddress => ["ipadr"];
    Ipv4Address => ["ipv4adr"];
    Ipv6Address => ["ipv6adr"];
    Ipv6Prefix => ["ipv6pre"];
    HardwareAddress => ["hwadr"];
    SemanticTag => ["semtag"];
    Namespace => ["namespace"], unsigned(8);
    Tag => ["tag"], unsigned(8);
}
