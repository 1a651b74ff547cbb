//! Cluster sections and everything nested in them.

use smol_str::SmolStr;

use super::{BuildContext, strip_suffix};
use crate::base::Span;
use crate::doc::{CrossReference, ElementPath, Section, SectionKind};
use crate::model::{
    Cluster, ClusterRef, Command, CommandDirection, CommandResponse, Conformance, Entity, EntityData, EntityId,
    EntityKind, Event, Feature, Field, FieldKind, Resolution, Revision,
};
use crate::table::{ColumnRole, RowReader};

/// One row of a cluster id table.
struct ClusterIdent {
    id: Option<u64>,
    name: String,
    conformance: Option<Conformance>,
    span: Span,
}

impl<'a> BuildContext<'a> {
    /// A cluster section yields one cluster per row of its id table, all
    /// sharing the section's content.
    pub(super) fn cluster(&mut self, section: &'a Section, path: &ElementPath) -> Vec<EntityId> {
        let idents = self.cluster_idents(section, path);
        if idents.is_empty() {
            let ident = ClusterIdent {
                id: None,
                name: strip_suffix(&section.name, &[" Cluster"]).to_string(),
                conformance: None,
                span: section.span,
            };
            return vec![self.cluster_body(section, path, ident)];
        }

        let mut clusters = Vec::with_capacity(idents.len());
        for (index, ident) in idents.into_iter().enumerate() {
            let cluster = if index == 0 {
                self.cluster_body(section, path, ident)
            } else {
                self.muted(|ctx| ctx.cluster_body(section, path, ident))
            };
            clusters.push(cluster);
        }
        clusters
    }

    fn cluster_idents(&mut self, section: &'a Section, path: &ElementPath) -> Vec<ClusterIdent> {
        let Some((index, ids)) = section
            .subsections()
            .find(|(_, s)| s.kind == SectionKind::ClusterIds)
        else {
            return Vec::new();
        };
        let Some(info) = self.table(ids, &path.child(index)) else {
            return Vec::new();
        };
        let mut idents = Vec::new();
        for row in info.rows() {
            let id = self.read_id(&row, ColumnRole::Id);
            let (name, _) = row.read_name(ColumnRole::Name);
            if name.is_empty() {
                continue;
            }
            let conformance = self.read_conformance(&row, ColumnRole::Conformance);
            idents.push(ClusterIdent {
                id,
                name: strip_suffix(&name, &[" Cluster"]).to_string(),
                conformance,
                span: row.row().span,
            });
        }
        idents
    }

    fn cluster_body(
        &mut self,
        section: &'a Section,
        path: &ElementPath,
        ident: ClusterIdent,
    ) -> EntityId {
        let mut entity = Entity::new(
            ident.name.as_str(),
            self.source(ident.span),
            path.clone(),
            EntityData::Cluster(Cluster::default()),
        );
        entity.id = ident.id;
        entity.conformance = ident.conformance;
        let cluster = self.add(entity);
        self.link_section(cluster, section, path);
        self.cluster_children(cluster, section, path);
        cluster
    }

    fn cluster_children(&mut self, cluster: EntityId, section: &'a Section, path: &ElementPath) {
        for (index, child) in section.subsections() {
            let child_path = path.child(index);
            match child.kind {
                SectionKind::Classification => self.classification(cluster, child, &child_path),
                SectionKind::RevisionHistory => {
                    let revisions = self.revisions(child, &child_path);
                    self.with_cluster(cluster, |c| c.revisions = revisions);
                }
                SectionKind::Features => self.features(cluster, child, &child_path),
                SectionKind::DataTypes => {
                    for (index, data_type) in child.subsections() {
                        self.cluster_data_type(cluster, data_type, &child_path.child(index));
                    }
                }
                SectionKind::Enum
                | SectionKind::Bitmap
                | SectionKind::Struct
                | SectionKind::TypeDef => self.cluster_data_type(cluster, child, &child_path),
                SectionKind::Attributes => self.attributes(cluster, child, &child_path),
                SectionKind::Commands => self.commands(cluster, section, path, child, &child_path),
                SectionKind::Events => self.events(cluster, section, path, child, &child_path),
                SectionKind::Other => self.cluster_children(cluster, child, &child_path),
                _ => {}
            }
        }
    }

    fn with_cluster(&mut self, id: EntityId, f: impl FnOnce(&mut Cluster)) {
        if let EntityData::Cluster(cluster) = &mut self.entity_mut(id).data {
            f(cluster);
        }
    }

    fn cluster_data_type(&mut self, cluster: EntityId, section: &'a Section, path: &ElementPath) {
        let Some(id) = self.data_type(section, path) else {
            return;
        };
        self.entity_mut(id).parent = Some(cluster);
        let kind = self.entities[id.index()].kind();
        self.with_cluster(cluster, |c| match kind {
            EntityKind::Enum => c.enums.push(id),
            EntityKind::Bitmap => c.bitmaps.push(id),
            EntityKind::Struct => c.structs.push(id),
            _ => c.typedefs.push(id),
        });
    }

    // ------------------------------------------------------------------------
    // Tables of the cluster header
    // ------------------------------------------------------------------------

    fn classification(&mut self, cluster: EntityId, section: &'a Section, path: &ElementPath) {
        let Some(info) = self.table(section, path) else {
            return;
        };
        let Some(row) = info.rows().next() else {
            return;
        };
        let (hierarchy, reference) = row.read_name(ColumnRole::Hierarchy);
        let base = base_cluster(&hierarchy, reference);
        let role = row.read_string(ColumnRole::Role);
        let scope = row.read_string(ColumnRole::Scope);
        let pics = row.read_string(ColumnRole::PicsCode).map(SmolStr::from);
        self.with_cluster(cluster, |c| {
            c.hierarchy = (!hierarchy.is_empty()).then_some(hierarchy);
            c.base = base;
            c.role = role;
            c.scope = scope;
            c.pics = pics;
        });
    }

    pub(super) fn revisions(&mut self, section: &'a Section, path: &ElementPath) -> Vec<Revision> {
        let Some(info) = self.table(section, path) else {
            return Vec::new();
        };
        info.rows()
            .filter_map(|row| {
                let number = row.read_string(ColumnRole::Revision)?.parse().ok()?;
                let description = row
                    .read_value(&[ColumnRole::Description, ColumnRole::Summary])
                    .unwrap_or_default();
                Some(Revision {
                    number,
                    description,
                })
            })
            .collect()
    }

    fn features(&mut self, cluster: EntityId, section: &'a Section, path: &ElementPath) {
        let Some(info) = self.table(section, path) else {
            return;
        };
        let table_path = Self::table_path(section, path);
        for row in info.rows() {
            let bit = match row.read_bits(ColumnRole::Bit) {
                Ok(bits) => bits.map(|(from, _)| from),
                Err(kind) => {
                    self.report(kind, row.row().span);
                    None
                }
            };
            let code = row.read_string(ColumnRole::Code).unwrap_or_default();
            let name_role = if info.has_column(ColumnRole::Feature) {
                ColumnRole::Feature
            } else {
                ColumnRole::Name
            };
            let (name, _) = row.read_name(name_role);
            let name = if name.is_empty() { code.clone() } else { name };
            if name.is_empty() {
                continue;
            }
            let Some(bit) = bit else {
                continue;
            };

            let mut entity = Entity::new(
                name,
                self.source(row.row().span),
                table_path.child(row.index()),
                EntityData::Feature(Feature {
                    bit,
                    code: code.into(),
                    summary: row.read_value(&[ColumnRole::Summary, ColumnRole::Description]),
                }),
            );
            entity.id = Some(u64::from(bit));
            entity.conformance = self.read_conformance(&row, ColumnRole::Conformance);
            let feature = self.add_child(cluster, entity);
            self.link_row(feature, &row, name_role, &table_path);
            self.with_cluster(cluster, |c| c.features.push(feature));
        }
    }

    // ------------------------------------------------------------------------
    // Fields
    // ------------------------------------------------------------------------

    fn attributes(&mut self, cluster: EntityId, section: &'a Section, path: &ElementPath) {
        let attributes = self.field_table(cluster, FieldKind::Attribute, section, path);
        self.with_cluster(cluster, |c| c.attributes.extend(attributes));
    }

    /// Build one field per row of the first table of `section`.
    pub(super) fn field_table(
        &mut self,
        owner: EntityId,
        kind: FieldKind,
        section: &'a Section,
        path: &ElementPath,
    ) -> Vec<EntityId> {
        let Some(info) = self.table(section, path) else {
            return Vec::new();
        };
        let table_path = Self::table_path(section, path);
        info.rows()
            .filter_map(|row| self.field(owner, kind, &row, &table_path))
            .collect()
    }

    fn field(
        &mut self,
        owner: EntityId,
        kind: FieldKind,
        row: &RowReader<'_>,
        table_path: &ElementPath,
    ) -> Option<EntityId> {
        let (name, reference) = row.read_name(ColumnRole::Name);
        if name.is_empty() {
            return None;
        }
        let mut field = Field::new(kind);
        field.data_type = row.read_data_type(ColumnRole::Type);
        field.constraint = self.read_constraint(row, ColumnRole::Constraint);
        field.quality = row.read_quality(ColumnRole::Quality);
        field.default = row.read_string(ColumnRole::Default);
        field.access = row.read_access(ColumnRole::Access);
        field.reference = reference;

        let mut entity = Entity::new(
            name,
            self.source(row.row().span),
            table_path.child(row.index()),
            EntityData::Field(field),
        );
        entity.id = self.read_id(row, ColumnRole::Id);
        entity.conformance = self.read_conformance(row, ColumnRole::Conformance);
        let id = self.add_child(owner, entity);
        self.link_row(id, row, ColumnRole::Name, table_path);
        Some(id)
    }

    /// Tie a row entity to the anchor its name cell references or carries.
    pub(super) fn link_row(
        &mut self,
        entity: EntityId,
        row: &RowReader<'_>,
        role: ColumnRole,
        table_path: &ElementPath,
    ) {
        let origin = table_path.child(row.index());
        if let (_, Some(reference)) = row.read_name(role) {
            self.link_reference(entity, &reference, &origin);
        }
        if let Some(anchor) = row.read_anchor(role) {
            self.link_reference(entity, &CrossReference::new(anchor), &origin);
        }
    }

    // ------------------------------------------------------------------------
    // Commands and events
    // ------------------------------------------------------------------------

    fn commands(
        &mut self,
        cluster: EntityId,
        cluster_section: &'a Section,
        cluster_path: &ElementPath,
        section: &'a Section,
        path: &ElementPath,
    ) {
        let Some(info) = self.table(section, path) else {
            return;
        };
        let table_path = Self::table_path(section, path);
        let details = detail_sections(
            SectionKind::Command,
            [(cluster_section, cluster_path), (section, path)],
        );

        for row in info.rows() {
            let (name, reference) = row.read_name(ColumnRole::Name);
            if name.is_empty() {
                continue;
            }
            let (response, response_ref) = row.read_name(ColumnRole::Response);
            let command = Command {
                direction: row
                    .read_string(ColumnRole::Direction)
                    .map(|d| CommandDirection::parse(&d))
                    .unwrap_or(CommandDirection::Unknown),
                response: CommandResponse::parse(&response, response_ref),
                access: row.read_access(ColumnRole::Access),
                fields: Vec::new(),
            };
            let mut entity = Entity::new(
                name.as_str(),
                self.source(row.row().span),
                table_path.child(row.index()),
                EntityData::Command(command),
            );
            entity.id = self.read_id(&row, ColumnRole::Id);
            entity.conformance = self.read_conformance(&row, ColumnRole::Conformance);
            let id = self.add_child(cluster, entity);
            self.link_row(id, &row, ColumnRole::Name, &table_path);

            if let Some((detail_path, detail)) =
                find_detail(&details, &name, reference.as_ref(), &[" Command"])
            {
                self.link_section(id, detail, &detail_path);
                let fields = self.detail_fields(id, FieldKind::CommandField, detail, &detail_path);
                if let EntityData::Command(c) = &mut self.entity_mut(id).data {
                    c.fields = fields;
                }
            }
            self.with_cluster(cluster, |c| c.commands.push(id));
        }
    }

    fn events(
        &mut self,
        cluster: EntityId,
        cluster_section: &'a Section,
        cluster_path: &ElementPath,
        section: &'a Section,
        path: &ElementPath,
    ) {
        let Some(info) = self.table(section, path) else {
            return;
        };
        let table_path = Self::table_path(section, path);
        let details = detail_sections(
            SectionKind::Event,
            [(cluster_section, cluster_path), (section, path)],
        );

        for row in info.rows() {
            let (name, reference) = row.read_name(ColumnRole::Name);
            if name.is_empty() {
                continue;
            }
            let event = Event {
                priority: row.read_string(ColumnRole::Priority).map(SmolStr::from),
                quality: row.read_quality(ColumnRole::Quality),
                access: row.read_access(ColumnRole::Access),
                fields: Vec::new(),
            };
            let mut entity = Entity::new(
                name.as_str(),
                self.source(row.row().span),
                table_path.child(row.index()),
                EntityData::Event(event),
            );
            entity.id = self.read_id(&row, ColumnRole::Id);
            entity.conformance = self.read_conformance(&row, ColumnRole::Conformance);
            let id = self.add_child(cluster, entity);
            self.link_row(id, &row, ColumnRole::Name, &table_path);

            if let Some((detail_path, detail)) =
                find_detail(&details, &name, reference.as_ref(), &[" Event"])
            {
                self.link_section(id, detail, &detail_path);
                let fields = self.detail_fields(id, FieldKind::EventField, detail, &detail_path);
                if let EntityData::Event(e) = &mut self.entity_mut(id).data {
                    e.fields = fields;
                }
            }
            self.with_cluster(cluster, |c| c.events.push(id));
        }
    }

    /// Fields of a command or event detail section. A detail section
    /// without a table has no fields and is not a problem.
    fn detail_fields(
        &mut self,
        owner: EntityId,
        kind: FieldKind,
        section: &'a Section,
        path: &ElementPath,
    ) -> Vec<EntityId> {
        if section.first_table().is_none() {
            return Vec::new();
        }
        self.field_table(owner, kind, section, path)
    }
}

/// Read the base cluster of a derived cluster from its hierarchy cell:
/// either a cross-reference or `Derived from Name`.
fn base_cluster(hierarchy: &str, reference: Option<CrossReference>) -> Option<ClusterRef> {
    if let Some(reference) = reference {
        let name = reference.label.clone().unwrap_or_else(|| reference.id.clone());
        return Some(ClusterRef {
            id: None,
            name: strip_suffix(&name, &[" Cluster"]).into(),
            reference: Some(reference),
            resolution: Resolution::Unresolved,
        });
    }
    let lower = hierarchy.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("derived from ")
        .map(|rest| &hierarchy[hierarchy.len() - rest.len()..])?;
    Some(ClusterRef::named(strip_suffix(rest, &[" Cluster"])))
}

/// Sections of `kind` directly inside any of `parents`.
fn detail_sections<'a, const N: usize>(
    kind: SectionKind,
    parents: [(&'a Section, &ElementPath); N],
) -> Vec<(ElementPath, &'a Section)> {
    parents
        .into_iter()
        .flat_map(|(parent, path)| {
            parent
                .subsections()
                .filter(|(_, s)| s.kind == kind)
                .map(|(index, s)| (path.child(index), s))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// The detail section for a row: the one the name cell references, else the
/// one whose title (minus `suffixes`) equals the row name.
fn find_detail<'a>(
    details: &[(ElementPath, &'a Section)],
    name: &str,
    reference: Option<&CrossReference>,
    suffixes: &[&str],
) -> Option<(ElementPath, &'a Section)> {
    let by_anchor = reference.and_then(|reference| {
        details
            .iter()
            .find(|(_, s)| s.attributes.id.as_ref() == Some(&reference.id))
    });
    by_anchor
        .or_else(|| {
            details
                .iter()
                .find(|(_, s)| strip_suffix(&s.name, suffixes).eq_ignore_ascii_case(name))
        })
        .map(|(path, section)| (path.clone(), *section))
}
