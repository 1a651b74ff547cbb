//! Foundation types shared by every layer.
//!
//! - [`DocumentId`] - index of a document within one build
//! - [`Position`], [`Span`] - line/column positions of document elements
//! - [`Source`] - a document plus a span, carried by every entity
//!
//! This module has NO dependencies on other spectral modules.

mod position;

pub use position::{Position, Span};

/// Identifier of a document within one build.
///
/// Assigned in input order by the pipeline; the document list itself lives on
/// the `Specification`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DocumentId(pub u32);

impl DocumentId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where an entity or diagnostic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Source {
    pub document: DocumentId,
    pub span: Span,
}

impl Source {
    pub fn new(document: DocumentId, span: Span) -> Self {
        Self { document, span }
    }
}
