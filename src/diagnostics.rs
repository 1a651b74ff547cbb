//! Diagnostics - recoverable problems found while building the model.
//!
//! Table errors, unparseable expressions, resolution failures and structural
//! validation errors are all absorbed into the model and reported here; only
//! the conditions in [`crate::BuildError`] stop a build.

use smol_str::SmolStr;

use crate::base::Source;
use crate::model::EntityId;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// What went wrong, with the data needed to describe it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DiagnosticKind {
    // Table structure
    #[error("table has no rows")]
    EmptyTable,
    #[error("table has no header row with at least two recognized columns")]
    NoHeaderRow,
    #[error("row {row} has {found} cells, header has {expected}")]
    InconsistentCells {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("no table found in section '{section}'")]
    MissingTable { section: String },
    #[error("invalid numeric id '{text}'")]
    InvalidId { text: String },
    #[error("invalid bit range '{text}'")]
    InvalidBits { text: String },

    // Expressions
    #[error("could not parse conformance '{text}'")]
    GenericConformance { text: String },
    #[error("could not parse constraint '{text}'")]
    GenericConstraint { text: String },

    // Resolution
    #[error("unresolved identifier '{name}'")]
    UnresolvedIdentifier { name: SmolStr },
    #[error("unresolved reference '{id}'")]
    UnresolvedReference { id: SmolStr },
    #[error("unknown data type '{name}'")]
    UnknownDataType { name: SmolStr },
    #[error("ambiguous data type '{name}': {candidates} candidates")]
    AmbiguousDataType { name: SmolStr, candidates: usize },
    #[error("unknown base cluster '{name}'")]
    UnknownParentCluster { name: SmolStr },
    #[error("unknown cluster '{name}' in device type requirement")]
    UnknownRequiredCluster { name: SmolStr },
    #[error("unknown {element} '{name}' in cluster '{cluster}'")]
    UnknownRequiredElement {
        element: SmolStr,
        name: SmolStr,
        cluster: SmolStr,
    },
    #[error("unknown response command '{name}'")]
    UnknownResponse { name: SmolStr },

    // Structural validation
    #[error("duplicate id {id:#06x} in {scope}: {}", .names.join(", "))]
    DuplicateEntityId {
        id: u64,
        scope: SmolStr,
        names: Vec<SmolStr>,
    },
    #[error("bits {first} and {second} overlap in bitmap '{bitmap}'")]
    OverlappingBits {
        bitmap: SmolStr,
        first: SmolStr,
        second: SmolStr,
    },
    #[error("'{name}' has no data type")]
    MissingDataType { name: SmolStr },
    #[error("cluster name '{name}' is defined more than once")]
    DuplicateClusterName { name: SmolStr },
}

impl DiagnosticKind {
    /// Stable code for this kind of diagnostic.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyTable => codes::EMPTY_TABLE,
            Self::NoHeaderRow => codes::NO_HEADER_ROW,
            Self::InconsistentCells { .. } => codes::INCONSISTENT_CELLS,
            Self::MissingTable { .. } => codes::MISSING_TABLE,
            Self::InvalidId { .. } => codes::INVALID_ID,
            Self::InvalidBits { .. } => codes::INVALID_BITS,
            Self::GenericConformance { .. } => codes::GENERIC_CONFORMANCE,
            Self::GenericConstraint { .. } => codes::GENERIC_CONSTRAINT,
            Self::UnresolvedIdentifier { .. } => codes::UNRESOLVED_IDENTIFIER,
            Self::UnresolvedReference { .. } => codes::UNRESOLVED_REFERENCE,
            Self::UnknownDataType { .. } => codes::UNKNOWN_DATA_TYPE,
            Self::AmbiguousDataType { .. } => codes::AMBIGUOUS_DATA_TYPE,
            Self::UnknownParentCluster { .. } => codes::UNKNOWN_PARENT_CLUSTER,
            Self::UnknownRequiredCluster { .. } => codes::UNKNOWN_REQUIRED_CLUSTER,
            Self::UnknownRequiredElement { .. } => codes::UNKNOWN_REQUIRED_ELEMENT,
            Self::UnknownResponse { .. } => codes::UNKNOWN_RESPONSE,
            Self::DuplicateEntityId { .. } => codes::DUPLICATE_ENTITY_ID,
            Self::OverlappingBits { .. } => codes::OVERLAPPING_BITS,
            Self::MissingDataType { .. } => codes::MISSING_DATA_TYPE,
            Self::DuplicateClusterName { .. } => codes::DUPLICATE_CLUSTER_NAME,
        }
    }

    /// Produced by reference resolution; replaced on every resolver run.
    pub fn is_resolution(&self) -> bool {
        self.code().starts_with("E03")
    }

    /// Default severity for this kind.
    pub fn severity(&self) -> Severity {
        match self {
            Self::EmptyTable
            | Self::NoHeaderRow
            | Self::InconsistentCells { .. }
            | Self::MissingTable { .. }
            | Self::InvalidId { .. }
            | Self::InvalidBits { .. }
            | Self::GenericConformance { .. }
            | Self::GenericConstraint { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Where the problem was found.
    pub source: Option<Source>,
    /// The entity the problem belongs to, once entities exist.
    pub entity: Option<EntityId>,
    pub related: Vec<RelatedInfo>,
    /// Ranked "did you mean" candidates.
    pub suggestions: Vec<SmolStr>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RelatedInfo {
    pub source: Option<Source>,
    pub entity: Option<EntityId>,
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic with the kind's default severity.
    pub fn new(kind: DiagnosticKind) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            source: None,
            entity: None,
            related: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<SmolStr>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> String {
        let mut message = self.kind.to_string();
        if !self.suggestions.is_empty() {
            message.push_str("; did you mean ");
            message.push_str(
                &self
                    .suggestions
                    .iter()
                    .map(|s| format!("'{s}'"))
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            message.push('?');
        }
        message
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity.as_str(), self.code(), self.message())
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
///
/// ## Code Ranges
///
/// - **W01xx**: Table structure (skipped tables, unreadable cells)
/// - **W02xx**: Expression text that fell back to a generic node
/// - **E03xx**: Resolution failures
/// - **E04xx**: Structural validation
pub mod codes {
    pub const EMPTY_TABLE: &str = "W0101";
    pub const NO_HEADER_ROW: &str = "W0102";
    pub const INCONSISTENT_CELLS: &str = "W0103";
    pub const MISSING_TABLE: &str = "W0104";
    pub const INVALID_ID: &str = "W0105";
    pub const INVALID_BITS: &str = "W0106";

    pub const GENERIC_CONFORMANCE: &str = "W0201";
    pub const GENERIC_CONSTRAINT: &str = "W0202";

    pub const UNRESOLVED_IDENTIFIER: &str = "E0301";
    pub const UNRESOLVED_REFERENCE: &str = "E0302";
    pub const UNKNOWN_DATA_TYPE: &str = "E0303";
    pub const AMBIGUOUS_DATA_TYPE: &str = "E0304";
    pub const UNKNOWN_PARENT_CLUSTER: &str = "E0305";
    pub const UNKNOWN_REQUIRED_CLUSTER: &str = "E0306";
    pub const UNKNOWN_REQUIRED_ELEMENT: &str = "E0307";
    pub const UNKNOWN_RESPONSE: &str = "E0308";

    pub const DUPLICATE_ENTITY_ID: &str = "E0401";
    pub const OVERLAPPING_BITS: &str = "E0402";
    pub const MISSING_DATA_TYPE: &str = "E0403";
    pub const DUPLICATE_CLUSTER_NAME: &str = "E0404";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during building, resolution and validation.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Record a diagnostic of `kind` at `source`.
    pub fn report(&mut self, kind: DiagnosticKind, source: Source) {
        self.add(Diagnostic::new(kind).with_source(source));
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{DocumentId, Span};

    #[test]
    fn test_diagnostic_default_severity() {
        let diag = Diagnostic::new(DiagnosticKind::NoHeaderRow);
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.code(), "W0102");

        let diag = Diagnostic::new(DiagnosticKind::UnresolvedIdentifier { name: "Foo".into() });
        assert!(diag.is_error());
        assert_eq!(diag.code(), "E0301");
    }

    #[test]
    fn test_message_lists_suggestions() {
        let diag = Diagnostic::new(DiagnosticKind::UnresolvedIdentifier { name: "Bogus".into() })
            .with_suggestions(vec!["Bogos".into(), "Bonus".into()]);
        assert_eq!(
            diag.message(),
            "unresolved identifier 'Bogus'; did you mean 'Bogos', 'Bonus'?"
        );
    }

    #[test]
    fn test_duplicate_id_message_names_all() {
        let kind = DiagnosticKind::DuplicateEntityId {
            id: 5,
            scope: "FooStruct".into(),
            names: vec!["A".into(), "B".into()],
        };
        assert_eq!(kind.to_string(), "duplicate id 0x0005 in FooStruct: A, B");
    }

    #[test]
    fn test_collector_counts() {
        let mut collector = DiagnosticCollector::new();
        let source = Source::new(DocumentId(0), Span::default());
        collector.report(DiagnosticKind::NoHeaderRow, source);
        collector.report(
            DiagnosticKind::MissingDataType { name: "Foo".into() },
            source,
        );
        assert_eq!(collector.error_count(), 1);
        assert_eq!(collector.warning_count(), 1);
        assert!(collector.has_errors());
        assert_eq!(collector.take().len(), 2);
        assert!(collector.is_empty());
    }
}
