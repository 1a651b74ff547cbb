//! Constraint expression trees.

use std::fmt;

use smol_str::SmolStr;

use super::{DataType, ReferenceLeaf, ReferenceTarget, Resolution, write_field_path};
use crate::doc::CrossReference;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Constraint {
    All,
    Described,
    Exact(Limit),
    Range { min: Limit, max: Limit },
    Min(Limit),
    Max(Limit),
    /// Constraint on a list plus a constraint on each entry.
    List {
        constraint: Box<Constraint>,
        entry: Box<Constraint>,
    },
    /// Union of several constraints.
    Set(Vec<Constraint>),
    /// Text that did not parse.
    Generic(String),
}

impl Constraint {
    pub fn is_generic(&self) -> bool {
        match self {
            Self::Generic(_) => true,
            Self::List { constraint, entry } => constraint.is_generic() || entry.is_generic(),
            Self::Set(items) => items.iter().any(Constraint::is_generic),
            _ => false,
        }
    }

    /// Visit every reference leaf in the tree.
    pub fn for_each_reference(&mut self, f: &mut dyn FnMut(ReferenceLeaf<'_>)) {
        match self {
            Self::All | Self::Described | Self::Generic(_) => {}
            Self::Exact(limit) | Self::Min(limit) | Self::Max(limit) => {
                limit.for_each_reference(f)
            }
            Self::Range { min, max } => {
                min.for_each_reference(f);
                max.for_each_reference(f);
            }
            Self::List { constraint, entry } => {
                constraint.for_each_reference(f);
                entry.for_each_reference(f);
            }
            Self::Set(items) => {
                for item in items {
                    item.for_each_reference(f);
                }
            }
        }
    }

    /// Replace a range covering exactly the full range of `data_type` with
    /// `all`. List entry constraints are simplified against the entry type.
    pub fn simplify(&self, data_type: &DataType) -> Constraint {
        match (self, data_type) {
            (Self::Range { min, max }, _) => {
                let full = data_type.base_type().and_then(|b| b.range());
                match (full, min.as_integer(), max.as_integer()) {
                    (Some((lo, hi)), Some(min), Some(max)) if lo == min && hi == max => {
                        Self::All
                    }
                    _ => self.clone(),
                }
            }
            (Self::List { constraint, entry }, DataType::List(inner)) => Self::List {
                constraint: constraint.clone(),
                entry: Box::new(entry.simplify(inner)),
            },
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Described => f.write_str("desc"),
            Self::Exact(limit) => write!(f, "{limit}"),
            Self::Range { min, max } => write!(f, "{min} to {max}"),
            Self::Min(limit) => write!(f, "min {limit}"),
            Self::Max(limit) => write!(f, "max {limit}"),
            Self::List { constraint, entry } => {
                if **constraint != Constraint::All {
                    write!(f, "{constraint}")?;
                }
                write!(f, "[{entry}]")
            }
            Self::Set(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Generic(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MathOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl MathOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Subtract => 1,
            Self::Multiply | Self::Divide => 2,
        }
    }
}

/// A single bound inside a constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Limit {
    Int(i64),
    Hex { value: u64, width: usize },
    /// Percentage in hundredths of a percent.
    Percent { hundredths: i64 },
    /// Temperature in hundredths of a degree Celsius.
    Temperature { hundredths: i64 },
    /// String length in bytes with a code-point count, `64{32}`.
    Character { bytes: Box<Limit>, codepoints: Box<Limit> },
    Bool(bool),
    Null,
    Identifier {
        id: SmolStr,
        field: Vec<SmolStr>,
        resolution: Resolution,
    },
    Reference {
        reference: CrossReference,
        field: Vec<SmolStr>,
        resolution: Resolution,
    },
    Math {
        op: MathOperator,
        left: Box<Limit>,
        right: Box<Limit>,
    },
    MinOf(Vec<Limit>),
    MaxOf(Vec<Limit>),
}

impl Limit {
    pub fn identifier(id: impl Into<SmolStr>) -> Self {
        Self::Identifier {
            id: id.into(),
            field: Vec::new(),
            resolution: Resolution::Unresolved,
        }
    }

    /// The literal integer value, when this limit has one.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Self::Int(v) => Some(*v as i128),
            Self::Hex { value, .. } => Some(*value as i128),
            Self::Bool(v) => Some(*v as i128),
            _ => None,
        }
    }

    fn for_each_reference(&mut self, f: &mut dyn FnMut(ReferenceLeaf<'_>)) {
        match self {
            Self::Identifier {
                id,
                field,
                resolution,
            } => f(ReferenceLeaf {
                target: ReferenceTarget::Identifier(id),
                field,
                resolution,
            }),
            Self::Reference {
                reference,
                field,
                resolution,
            } => f(ReferenceLeaf {
                target: ReferenceTarget::Reference(reference),
                field,
                resolution,
            }),
            Self::Character { bytes, codepoints } => {
                bytes.for_each_reference(f);
                codepoints.for_each_reference(f);
            }
            Self::Math { left, right, .. } => {
                left.for_each_reference(f);
                right.for_each_reference(f);
            }
            Self::MinOf(limits) | Self::MaxOf(limits) => {
                for limit in limits {
                    limit.for_each_reference(f);
                }
            }
            _ => {}
        }
    }
}

fn write_hundredths(f: &mut fmt::Formatter<'_>, hundredths: i64) -> fmt::Result {
    if hundredths % 100 == 0 {
        return write!(f, "{}", hundredths / 100);
    }
    let sign = if hundredths < 0 { "-" } else { "" };
    let abs = hundredths.unsigned_abs();
    let fraction = abs % 100;
    if fraction % 10 == 0 {
        write!(f, "{sign}{}.{}", abs / 100, fraction / 10)
    } else {
        write!(f, "{sign}{}.{:02}", abs / 100, fraction)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Hex { value, width } => write!(f, "0x{:0w$X}", value, w = *width),
            Self::Percent { hundredths } => {
                write_hundredths(f, *hundredths)?;
                f.write_str("%")
            }
            Self::Temperature { hundredths } => {
                write_hundredths(f, *hundredths)?;
                f.write_str("°C")
            }
            Self::Character { bytes, codepoints } => write!(f, "{bytes}{{{codepoints}}}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Null => f.write_str("null"),
            Self::Identifier { id, field, .. } => {
                f.write_str(id)?;
                write_field_path(f, field)
            }
            Self::Reference {
                reference, field, ..
            } => {
                write!(f, "{reference}")?;
                write_field_path(f, field)
            }
            Self::Math { op, left, right } => {
                let wrap_left = matches!(**left, Limit::Math { op: l, .. } if l.precedence() < op.precedence());
                let wrap_right = matches!(**right, Limit::Math { op: r, .. } if r.precedence() <= op.precedence());
                if wrap_left {
                    write!(f, "({left})")?;
                } else {
                    write!(f, "{left}")?;
                }
                write!(f, " {} ", op.symbol())?;
                if wrap_right {
                    write!(f, "({right})")
                } else {
                    write!(f, "{right}")
                }
            }
            Self::MinOf(limits) | Self::MaxOf(limits) => {
                let name = if matches!(self, Self::MinOf(_)) { "min" } else { "max" };
                write!(f, "{name}(")?;
                for (i, limit) in limits.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{limit}")?;
                }
                f.write_str(")")
            }
        }
    }
}
