//! Document interface consumed from the markup parser.
//!
//! The builder only needs a narrow view of a parsed document: a tree of
//! classified sections, the tables inside them, and inline cell content with
//! cross-references and anchors kept as structured nodes. Producing this tree
//! from raw markup (and classifying sections) happens upstream.

mod render;


use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::Span;

pub use render::{render_expression_text, render_text};

/// Section classification assigned by the upstream section classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SectionKind {
    Cluster,
    ClusterIds,
    Classification,
    RevisionHistory,
    Features,
    DataTypes,
    Enum,
    Bitmap,
    Struct,
    TypeDef,
    Attributes,
    Attribute,
    Commands,
    Command,
    Events,
    Event,
    DeviceType,
    Conditions,
    ClusterRequirements,
    ElementRequirements,
    Namespace,
    SemanticTags,
    Other,
}

/// One source document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub path: SmolStr,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn new(path: impl Into<SmolStr>) -> Self {
        Self {
            path: path.into(),
            sections: Vec::new(),
        }
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// The file name without directories or extension, used as the outermost
    /// anchor disambiguation prefix.
    pub fn stem(&self) -> &str {
        let name = self.path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(&self.path);
        name.split('.').next().unwrap_or(name)
    }
}

/// Attributes an element may carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pub id: Option<SmolStr>,
    pub label: Option<String>,
    pub extra: IndexMap<SmolStr, String>,
}

/// A classified section and its children.
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub kind: SectionKind,
    pub attributes: Attributes,
    pub children: Vec<Element>,
    pub span: Span,
}

impl Section {
    pub fn new(kind: SectionKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            attributes: Attributes::default(),
            children: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<SmolStr>) -> Self {
        self.attributes.id = Some(id.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.attributes.label = Some(label.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.children.push(Element::Table(table));
        self
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.children.push(Element::Section(section));
        self
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.children.push(element);
        self
    }

    /// Direct subsections, with their child index.
    pub fn subsections(&self) -> impl Iterator<Item = (usize, &Section)> {
        self.children.iter().enumerate().filter_map(|(i, e)| match e {
            Element::Section(s) => Some((i, s)),
            _ => None,
        })
    }

    /// The first table directly inside this section, with its child index.
    pub fn first_table(&self) -> Option<(usize, &Table)> {
        self.children.iter().enumerate().find_map(|(i, e)| match e {
            Element::Table(t) => Some((i, t)),
            _ => None,
        })
    }

    /// Plain text of the paragraphs directly inside this section.
    pub fn paragraph_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|e| match e {
                Element::Paragraph(p) => Some(render_text(&p.content)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Any child of a section.
#[derive(Debug, Clone)]
pub enum Element {
    Section(Section),
    Table(Table),
    Paragraph(Paragraph),
    Anchor(AnchorElement),
}

#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub content: Vec<Inline>,
    pub span: Span,
}

/// Explicit anchor markup outside of inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorElement {
    pub id: SmolStr,
    pub label: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub attributes: Attributes,
    pub rows: Vec<TableRow>,
    pub span: Span,
}

impl Table {
    /// Build a table from cell markup, one slice per row.
    ///
    /// Cell text goes through [`Inline::parse_markup`], so `<<id,label>>`
    /// becomes a cross-reference and `[[id]]` an anchor.
    pub fn from_rows(rows: &[&[&str]]) -> Self {
        Self {
            attributes: Attributes::default(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(line, cells)| TableRow {
                    cells: cells.iter().map(|c| TableCell::from_markup(c)).collect(),
                    span: Span::line(line),
                })
                .collect(),
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCell {
    pub content: Vec<Inline>,
}

impl TableCell {
    pub fn from_markup(text: &str) -> Self {
        Self {
            content: Inline::parse_markup(text),
        }
    }

    pub fn text(&self) -> String {
        render_text(&self.content)
    }
}

/// A reference from text to an anchor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CrossReference {
    pub id: SmolStr,
    pub label: Option<SmolStr>,
}

impl CrossReference {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self {
            id: id.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl std::fmt::Display for CrossReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.label {
            Some(label) => write!(f, "<<{},{}>>", self.id, label),
            None => write!(f, "<<{}>>", self.id),
        }
    }
}

/// Inline cell / paragraph content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    CrossReference(CrossReference),
    Anchor { id: SmolStr, label: Option<String> },
    /// Emphasis, monospace and other formatting that only wraps content.
    Formatted(Vec<Inline>),
}

impl Inline {
    /// Split simple markup into inline nodes: `<<id>>`, `<<id,label>>` and
    /// `[[id]]` / `[[id,label]]`; everything else is text.
    pub fn parse_markup(text: &str) -> Vec<Inline> {
        let mut out = Vec::new();
        let mut rest = text;
        let mut pending = String::new();
        while !rest.is_empty() {
            let next_xref = rest.find("<<");
            let next_anchor = rest.find("[[");
            let (start, open, close) = match (next_xref, next_anchor) {
                (Some(x), Some(a)) if a < x => (a, "[[", "]]"),
                (Some(x), _) => (x, "<<", ">>"),
                (None, Some(a)) => (a, "[[", "]]"),
                (None, None) => break,
            };
            let Some(len) = rest[start + 2..].find(close) else {
                break;
            };
            pending.push_str(&rest[..start]);
            if !pending.is_empty() {
                out.push(Inline::Text(std::mem::take(&mut pending)));
            }
            let body = &rest[start + 2..start + 2 + len];
            let (id, label) = match body.split_once(',') {
                Some((id, label)) => (id.trim(), Some(label.trim())),
                None => (body.trim(), None),
            };
            if open == "<<" {
                out.push(Inline::CrossReference(CrossReference {
                    id: id.into(),
                    label: label.map(SmolStr::from),
                }));
            } else {
                out.push(Inline::Anchor {
                    id: id.into(),
                    label: label.map(str::to_string),
                });
            }
            rest = &rest[start + 2 + len + 2..];
        }
        pending.push_str(rest);
        if !pending.is_empty() {
            out.push(Inline::Text(pending));
        }
        out
    }
}

/// Structural address of an element inside a document: the child index at
/// each level, starting with the top-level section index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ElementPath(pub Vec<u32>);

impl ElementPath {
    pub fn root(index: usize) -> Self {
        Self(vec![index as u32])
    }

    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index as u32);
        Self(path)
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Number of leading indices shared with `other`.
    pub fn common_prefix(&self, other: &ElementPath) -> usize {
        self.0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }
}
