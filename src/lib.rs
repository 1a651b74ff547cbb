//! # spectral-base
//!
//! Semantic model builder for table-driven specification documents.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! pipeline  → build(documents, options): parallel build, then the global passes
//!   ↓
//! spec      → Specification: entity arena, indices, validation
//!   ↓
//! resolve   → Resolver and scope chains for reference lookup
//!   ↓
//! anchor    → Anchor index, disambiguation, cross-reference rewriting
//!   ↓
//! builder   → Per-document entity builders
//!   ↓
//! parser    → Logos lexer, conformance and constraint parsers
//!   ↓
//! table     → Header detection, column roles, typed row readers
//!   ↓
//! model     → Entities, data types, expression trees, resolution slots
//!   ↓
//! doc       → Input document tree
//!   ↓
//! base      → Primitives (DocumentId, Span, Source)
//! ```

// ============================================================================
// MODULES (dependency order: base → doc → model → ... → pipeline)
// ============================================================================

/// Foundation types: DocumentId, Span, Source
pub mod base;

/// Input documents: sections, tables, inline content
pub mod doc;

/// Semantic model: entities, data types, conformance and constraint trees
pub mod model;

/// Table reading: header detection and typed cell readers
pub mod table;

/// Expression parsers for conformance and constraint cells
pub mod parser;

/// Entity building, one document at a time
pub mod builder;

/// Anchors and cross-references
pub mod anchor;

/// Reference resolution
pub mod resolve;

/// The aggregate specification model
pub mod spec;

/// The build pipeline
pub mod pipeline;

pub mod diagnostics;
mod error;
mod options;

// Re-export the build surface
pub use base::{DocumentId, Position, Source, Span};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use doc::{Document, Section, SectionKind};
pub use error::BuildError;
pub use model::{Entity, EntityData, EntityId, EntityKind, Resolution};
pub use options::BuildOptions;
pub use pipeline::{build, build_with_cancel};
pub use spec::Specification;
