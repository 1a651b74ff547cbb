//! Entity building: one pass over one document.
//!
//! Builders are pure with respect to global state. Each document produces a
//! [`DocumentModel`] holding its entities in a local arena, the links from
//! entities to the anchors they were built from, and the diagnostics found
//! along the way. The aggregator later shifts the local arena into the
//! specification arena.

mod cluster;
mod data_type;
mod device_type;


use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::{DocumentId, Source, Span};
use crate::diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticKind};
use crate::doc::{CrossReference, Document, ElementPath, Section, SectionKind};
use crate::error::BuildError;
use crate::model::{Conformance, Constraint, Entity, EntityId};
use crate::table::{ColumnRole, RowReader, TableCache, TableInfo};

/// How an entity is tied to an anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorLink {
    /// Built from the anchored section at `path` in this document.
    Element { entity: EntityId, path: ElementPath },
    /// Built from a row whose name cell references or carries anchor `id`.
    Raw {
        entity: EntityId,
        id: SmolStr,
        origin: ElementPath,
    },
}

impl AnchorLink {
    pub fn entity(&self) -> EntityId {
        match self {
            Self::Element { entity, .. } | Self::Raw { entity, .. } => *entity,
        }
    }

    pub(crate) fn rebase(&mut self, by: usize) {
        match self {
            Self::Element { entity, .. } | Self::Raw { entity, .. } => *entity = entity.offset(by),
        }
    }
}

/// Everything one document contributes to the specification.
#[derive(Debug, Clone)]
pub struct DocumentModel {
    pub document: DocumentId,
    pub path: SmolStr,
    /// Local arena; handles are indices into this vector until merged.
    pub entities: Vec<Entity>,
    /// Clusters, device types, namespaces and cluster-less data types.
    pub roots: Vec<EntityId>,
    pub base_device_type: Option<EntityId>,
    pub anchor_links: Vec<AnchorLink>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build the entities of one document.
///
/// Fails only on conditions that make the model meaningless; everything
/// else becomes a diagnostic on the returned model.
pub fn build_document(id: DocumentId, document: &Document) -> Result<DocumentModel, BuildError> {
    tracing::debug!(document = %document.path, "building entities");
    let mut ctx = BuildContext::new(id);
    for (index, section) in document.sections.iter().enumerate() {
        ctx.section(section, ElementPath::root(index))?;
    }
    let model = ctx.finish(document);
    tracing::debug!(
        document = %model.path,
        entities = model.entities.len(),
        diagnostics = model.diagnostics.len(),
        "built entities"
    );
    Ok(model)
}

pub(crate) struct BuildContext<'a> {
    document: DocumentId,
    entities: Vec<Entity>,
    roots: Vec<EntityId>,
    base_device_type: Option<EntityId>,
    anchor_links: Vec<AnchorLink>,
    diagnostics: DiagnosticCollector,
    tables: TableCache<'a>,
    /// Set while rebuilding shared content for the second and later ids of a
    /// multi-id section, so its problems are reported once.
    muted: bool,
}

impl<'a> BuildContext<'a> {
    fn new(document: DocumentId) -> Self {
        Self {
            document,
            entities: Vec::new(),
            roots: Vec::new(),
            base_device_type: None,
            anchor_links: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
            tables: TableCache::new(),
            muted: false,
        }
    }

    fn finish(self, document: &Document) -> DocumentModel {
        let mut diagnostics = self.diagnostics;
        if !diagnostics.is_empty() {
            tracing::debug!(
                document = %document.path,
                errors = diagnostics.error_count(),
                warnings = diagnostics.warning_count(),
                "table problems"
            );
        }
        DocumentModel {
            document: self.document,
            path: document.path.clone(),
            entities: self.entities,
            roots: self.roots,
            base_device_type: self.base_device_type,
            anchor_links: self.anchor_links,
            diagnostics: diagnostics.take(),
        }
    }

    fn section(&mut self, section: &'a Section, path: ElementPath) -> Result<(), BuildError> {
        match section.kind {
            SectionKind::Cluster => {
                let clusters = self.cluster(section, &path);
                self.roots.extend(clusters);
            }
            SectionKind::DeviceType => {
                let device_types = self.device_type(section, &path)?;
                self.roots.extend(device_types);
            }
            SectionKind::Namespace => {
                let namespace = self.namespace(section, &path);
                self.roots.push(namespace);
            }
            SectionKind::Enum | SectionKind::Bitmap | SectionKind::Struct | SectionKind::TypeDef => {
                if let Some(data_type) = self.data_type(section, &path) {
                    self.roots.push(data_type);
                }
            }
            _ => {
                for (index, child) in section.subsections() {
                    self.section(child, path.child(index))?;
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Arena
    // ------------------------------------------------------------------------

    pub(crate) fn add(&mut self, entity: Entity) -> EntityId {
        let id = EntityId::new(self.entities.len());
        self.entities.push(entity);
        id
    }

    pub(crate) fn add_child(&mut self, parent: EntityId, mut entity: Entity) -> EntityId {
        entity.parent = Some(parent);
        self.add(entity)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.index()]
    }

    pub(crate) fn source(&self, span: Span) -> Source {
        Source::new(self.document, span)
    }

    // ------------------------------------------------------------------------
    // Anchors
    // ------------------------------------------------------------------------

    /// Tie `entity` to `section` when the section is anchored.
    pub(crate) fn link_section(&mut self, entity: EntityId, section: &Section, path: &ElementPath) {
        if section.attributes.id.is_some() {
            self.anchor_links.push(AnchorLink::Element {
                entity,
                path: path.clone(),
            });
        }
    }

    pub(crate) fn link_reference(
        &mut self,
        entity: EntityId,
        reference: &CrossReference,
        origin: &ElementPath,
    ) {
        self.anchor_links.push(AnchorLink::Raw {
            entity,
            id: reference.id.clone(),
            origin: origin.clone(),
        });
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    pub(crate) fn report(&mut self, kind: DiagnosticKind, span: Span) {
        if !self.muted {
            let source = self.source(span);
            self.diagnostics.report(kind, source);
        }
    }

    /// Run `f` with reporting suppressed.
    pub(crate) fn muted<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.muted, true);
        let result = f(self);
        self.muted = previous;
        result
    }

    // ------------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------------

    /// The first table of `section`, read through the cache. A missing table
    /// and an unreadable one are both warnings.
    pub(crate) fn table(
        &mut self,
        section: &'a Section,
        path: &ElementPath,
    ) -> Option<Arc<TableInfo<'a>>> {
        let Some((index, table)) = section.first_table() else {
            self.report(
                DiagnosticKind::MissingTable {
                    section: section.name.clone(),
                },
                section.span,
            );
            return None;
        };
        let cached = self.tables.get(&path.child(index), table);
        match cached.info {
            Ok(info) => Some(info),
            Err(error) => {
                if cached.first_read {
                    self.report(DiagnosticKind::from(&error), table.span);
                }
                None
            }
        }
    }

    /// Path of the first table of `section`.
    pub(crate) fn table_path(section: &Section, path: &ElementPath) -> ElementPath {
        match section.first_table() {
            Some((index, _)) => path.child(index),
            None => path.clone(),
        }
    }

    pub(crate) fn read_id(&mut self, row: &RowReader<'_>, role: ColumnRole) -> Option<u64> {
        match row.read_id(role) {
            Ok(id) => id,
            Err(kind) => {
                self.report(kind, row.row().span);
                None
            }
        }
    }

    pub(crate) fn read_conformance(
        &mut self,
        row: &RowReader<'_>,
        role: ColumnRole,
    ) -> Option<Conformance> {
        let conformance = row.read_conformance(role)?;
        if conformance.is_generic() {
            self.report(
                DiagnosticKind::GenericConformance {
                    text: conformance.to_string(),
                },
                row.row().span,
            );
        }
        Some(conformance)
    }

    pub(crate) fn read_constraint(
        &mut self,
        row: &RowReader<'_>,
        role: ColumnRole,
    ) -> Option<Constraint> {
        let constraint = row.read_constraint(role)?;
        if constraint.is_generic() {
            self.report(
                DiagnosticKind::GenericConstraint {
                    text: constraint.to_string(),
                },
                row.row().span,
            );
        }
        Some(constraint)
    }
}

/// Strip a trailing kind word from a section title: `ModeEnum Type` →
/// `ModeEnum`, `Thermostat Cluster` → `Thermostat`.
pub(crate) fn strip_suffix<'s>(name: &'s str, suffixes: &[&str]) -> &'s str {
    let name = name.trim();
    for suffix in suffixes {
        if name.len() > suffix.len() && name.is_char_boundary(name.len() - suffix.len()) {
            let (head, tail) = name.split_at(name.len() - suffix.len());
            if tail.eq_ignore_ascii_case(suffix) {
                return head.trim_end();
            }
        }
    }
    name
}
