//! Conformance expression trees.

use std::fmt;

use smol_str::SmolStr;

use super::{ReferenceLeaf, ReferenceTarget, Resolution, write_field_path};
use crate::doc::CrossReference;

/// An ordered set of conformance alternatives ("otherwise" list).
///
/// `LT, O` reads "mandatory if LT, otherwise optional": the first item whose
/// condition holds applies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Conformance(pub Vec<ConformanceItem>);

impl Conformance {
    pub fn mandatory() -> Self {
        Self(vec![ConformanceItem::Mandatory { condition: None }])
    }

    pub fn optional() -> Self {
        Self(vec![ConformanceItem::Optional {
            condition: None,
            choice: None,
        }])
    }

    pub fn generic(text: impl Into<String>) -> Self {
        Self(vec![ConformanceItem::Generic(text.into())])
    }

    pub fn items(&self) -> &[ConformanceItem] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when parsing fell back to raw text.
    pub fn is_generic(&self) -> bool {
        self.0
            .iter()
            .any(|item| matches!(item, ConformanceItem::Generic(_)))
    }

    /// Unconditionally mandatory.
    pub fn is_mandatory(&self) -> bool {
        matches!(
            self.0.first(),
            Some(ConformanceItem::Mandatory { condition: None })
        )
    }

    /// Visit every reference leaf in the tree.
    pub fn for_each_reference(&mut self, f: &mut dyn FnMut(ReferenceLeaf<'_>)) {
        for item in &mut self.0 {
            match item {
                ConformanceItem::Mandatory {
                    condition: Some(expr),
                }
                | ConformanceItem::Optional {
                    condition: Some(expr),
                    ..
                } => expr.for_each_reference(f),
                _ => {}
            }
        }
    }
}

impl fmt::Display for Conformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ConformanceItem {
    /// `M`, or a bare expression: mandatory when the condition holds.
    Mandatory { condition: Option<Expression> },
    /// `O`, or `[expr]`: optional when the condition holds.
    Optional {
        condition: Option<Expression>,
        choice: Option<Choice>,
    },
    Disallowed,
    Provisional,
    Deprecated,
    Described,
    /// Text that did not parse.
    Generic(String),
}

impl fmt::Display for ConformanceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mandatory { condition: None } => f.write_str("M"),
            Self::Mandatory {
                condition: Some(expr),
            } => write!(f, "{expr}"),
            Self::Optional { condition, choice } => {
                match condition {
                    None => f.write_str("O")?,
                    Some(expr) => write!(f, "[{expr}]")?,
                }
                if let Some(choice) = choice {
                    write!(f, "{choice}")?;
                }
                Ok(())
            }
            Self::Disallowed => f.write_str("X"),
            Self::Provisional => f.write_str("P"),
            Self::Deprecated => f.write_str("D"),
            Self::Described => f.write_str("desc"),
            Self::Generic(text) => f.write_str(text),
        }
    }
}

/// Choice suffix such as `.a`, `.a+` or `.b2-`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Choice {
    pub set: SmolStr,
    pub limit: ChoiceLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ChoiceLimit {
    Exactly(u32),
    AtLeast(u32),
    AtMost(u32),
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.set)?;
        match self.limit {
            ChoiceLimit::Exactly(1) => Ok(()),
            ChoiceLimit::Exactly(n) => write!(f, "{n}"),
            ChoiceLimit::AtLeast(1) => f.write_str("+"),
            ChoiceLimit::AtLeast(n) => write!(f, "{n}+"),
            ChoiceLimit::AtMost(n) => write!(f, "{n}-"),
        }
    }
}

// ============================================================================
// CONDITIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Expression {
    Identifier(IdentifierExpression),
    Reference(ReferenceExpression),
    Logical(LogicalExpression),
    Equality(EqualityExpression),
    Comparison(ComparisonExpression),
}

impl Expression {
    pub fn identifier(id: impl Into<SmolStr>) -> Self {
        Self::Identifier(IdentifierExpression {
            id: id.into(),
            field: Vec::new(),
            not: false,
            resolution: Resolution::Unresolved,
        })
    }

    /// Negate this expression, folding into an existing negation flag.
    pub fn negate(self) -> Self {
        match self {
            Self::Identifier(mut e) => {
                e.not = !e.not;
                Self::Identifier(e)
            }
            Self::Reference(mut e) => {
                e.not = !e.not;
                Self::Reference(e)
            }
            Self::Logical(mut e) => {
                e.not = !e.not;
                Self::Logical(e)
            }
            other => Self::Logical(LogicalExpression {
                op: LogicalOperator::And,
                not: true,
                operands: vec![other],
            }),
        }
    }

    pub fn for_each_reference(&mut self, f: &mut dyn FnMut(ReferenceLeaf<'_>)) {
        match self {
            Self::Identifier(e) => f(ReferenceLeaf {
                target: ReferenceTarget::Identifier(&e.id),
                field: &e.field,
                resolution: &mut e.resolution,
            }),
            Self::Reference(e) => f(ReferenceLeaf {
                target: ReferenceTarget::Reference(&e.reference),
                field: &e.field,
                resolution: &mut e.resolution,
            }),
            Self::Logical(e) => {
                for operand in &mut e.operands {
                    operand.for_each_reference(f);
                }
            }
            Self::Equality(e) => {
                e.left.for_each_reference(f);
                e.right.for_each_reference(f);
            }
            Self::Comparison(e) => {
                e.left.for_each_reference(f);
                e.right.for_each_reference(f);
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(e) => {
                if e.not {
                    f.write_str("!")?;
                }
                f.write_str(&e.id)?;
                write_field_path(f, &e.field)
            }
            Self::Reference(e) => {
                if e.not {
                    f.write_str("!")?;
                }
                write!(f, "{}", e.reference)?;
                write_field_path(f, &e.field)
            }
            Self::Logical(e) => write!(f, "{e}"),
            Self::Equality(e) => {
                let op = if e.not_equal { "!=" } else { "==" };
                write!(f, "{} {op} {}", e.left, e.right)
            }
            Self::Comparison(e) => write!(f, "{} {} {}", e.left, e.op, e.right),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IdentifierExpression {
    pub id: SmolStr,
    pub field: Vec<SmolStr>,
    pub not: bool,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReferenceExpression {
    pub reference: CrossReference,
    pub field: Vec<SmolStr>,
    pub not: bool,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LogicalOperator {
    And,
    Or,
    Xor,
}

impl LogicalOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LogicalExpression {
    pub op: LogicalOperator,
    pub not: bool,
    pub operands: Vec<Expression>,
}

impl fmt::Display for LogicalExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.not {
            f.write_str("!(")?;
        }
        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.op.symbol())?;
            }
            match operand {
                Expression::Logical(inner) if !inner.not => write!(f, "({operand})")?,
                _ => write!(f, "{operand}")?,
            }
        }
        if self.not {
            f.write_str(")")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EqualityExpression {
    pub not_equal: bool,
    pub left: ComparisonValue,
    pub right: ComparisonValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ComparisonOperator {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ComparisonExpression {
    pub op: ComparisonOperator,
    pub left: ComparisonValue,
    pub right: ComparisonValue,
}

/// Operand of an equality or comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ComparisonValue {
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
    Int(i64),
    Hex { value: u64, width: usize },
    Bool(bool),
    Null,
}

impl ComparisonValue {
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
            _ => {}
        }
    }
}

impl fmt::Display for ComparisonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
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
            Self::Int(v) => write!(f, "{v}"),
            Self::Hex { value, width } => write!(f, "0x{:0w$X}", value, w = *width),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Null => f.write_str("null"),
        }
    }
}
