//! Device type and namespace sections.

use smol_str::SmolStr;

use super::{BuildContext, strip_suffix};
use crate::base::Span;
use crate::doc::{ElementPath, Section, SectionKind};
use crate::error::BuildError;
use crate::model::{
    ClusterRef, ClusterRequirement, ClusterSide, Condition, DeviceType, ElementKind,
    ElementRequirement, Entity, EntityData, EntityId, Namespace, Resolution, SemanticTag,
};
use crate::table::ColumnRole;

const BASE_DEVICE_TYPE: &str = "Base Device Type";

/// One row of a device type classification table.
struct DeviceIdent {
    id: Option<u64>,
    name: String,
    superset: Option<SmolStr>,
    class: Option<String>,
    scope: Option<String>,
    span: Span,
}

impl<'a> BuildContext<'a> {
    /// A device type section yields one device type per classification row.
    /// Only the base device type may go without an id.
    pub(super) fn device_type(
        &mut self,
        section: &'a Section,
        path: &ElementPath,
    ) -> Result<Vec<EntityId>, BuildError> {
        let is_base = section.name.trim().eq_ignore_ascii_case(BASE_DEVICE_TYPE);
        let mut idents = self.device_idents(section, path);
        if idents.is_empty() && !is_base {
            tracing::warn!(device_type = %section.name, "device type has no id");
            return Err(BuildError::device_type_without_id(
                section.name.trim(),
                self.source(section.span),
            ));
        }
        if idents.is_empty() {
            idents.push(DeviceIdent {
                id: None,
                name: section.name.trim().to_string(),
                superset: None,
                class: None,
                scope: None,
                span: section.span,
            });
        }

        let mut device_types = Vec::with_capacity(idents.len());
        for (index, ident) in idents.into_iter().enumerate() {
            let id = if index == 0 {
                self.device_type_body(section, path, ident)
            } else {
                self.muted(|ctx| ctx.device_type_body(section, path, ident))
            };
            if is_base && self.base_device_type.is_none() {
                self.base_device_type = Some(id);
            }
            device_types.push(id);
        }
        Ok(device_types)
    }

    fn device_idents(&mut self, section: &'a Section, path: &ElementPath) -> Vec<DeviceIdent> {
        let Some((index, classification)) = section
            .subsections()
            .find(|(_, s)| s.kind == SectionKind::Classification)
        else {
            return Vec::new();
        };
        let Some(info) = self.table(classification, &path.child(index)) else {
            return Vec::new();
        };
        let mut idents = Vec::new();
        for row in info.rows() {
            let Some(id) = self.read_id(&row, ColumnRole::Id) else {
                continue;
            };
            let name = row
                .read_value(&[ColumnRole::DeviceName, ColumnRole::Name])
                .unwrap_or_else(|| section.name.trim().to_string());
            idents.push(DeviceIdent {
                id: Some(id),
                name,
                superset: row.read_string(ColumnRole::Superset).map(SmolStr::from),
                class: row.read_string(ColumnRole::Class),
                scope: row.read_string(ColumnRole::Scope),
                span: row.row().span,
            });
        }
        idents
    }

    fn device_type_body(
        &mut self,
        section: &'a Section,
        path: &ElementPath,
        ident: DeviceIdent,
    ) -> EntityId {
        let mut entity = Entity::new(
            ident.name.as_str(),
            self.source(ident.span),
            path.clone(),
            EntityData::DeviceType(DeviceType {
                class: ident.class,
                scope: ident.scope,
                superset: ident.superset,
                ..DeviceType::default()
            }),
        );
        entity.id = ident.id;
        let device_type = self.add(entity);
        self.link_section(device_type, section, path);
        self.device_type_children(device_type, section, path);
        device_type
    }

    fn device_type_children(&mut self, device_type: EntityId, section: &'a Section, path: &ElementPath) {
        for (index, child) in section.subsections() {
            let child_path = path.child(index);
            match child.kind {
                SectionKind::RevisionHistory => {
                    let revisions = self.revisions(child, &child_path);
                    self.with_device_type(device_type, |d| d.revisions = revisions);
                }
                SectionKind::Conditions => {
                    let conditions = self.conditions(device_type, child, &child_path);
                    self.with_device_type(device_type, |d| d.conditions.extend(conditions));
                }
                SectionKind::ClusterRequirements => {
                    let requirements = self.cluster_requirements(device_type, child, &child_path);
                    self.with_device_type(device_type, |d| {
                        d.cluster_requirements.extend(requirements)
                    });
                }
                SectionKind::ElementRequirements => {
                    let requirements = self.element_requirements(device_type, child, &child_path);
                    self.with_device_type(device_type, |d| {
                        d.element_requirements.extend(requirements)
                    });
                }
                SectionKind::Other => self.device_type_children(device_type, child, &child_path),
                _ => {}
            }
        }
    }

    fn with_device_type(&mut self, id: EntityId, f: impl FnOnce(&mut DeviceType)) {
        if let EntityData::DeviceType(device_type) = &mut self.entity_mut(id).data {
            f(device_type);
        }
    }

    fn conditions(&mut self, owner: EntityId, section: &'a Section, path: &ElementPath) -> Vec<EntityId> {
        let Some(info) = self.table(section, path) else {
            return Vec::new();
        };
        let table_path = Self::table_path(section, path);
        let name_role = if info.has_column(ColumnRole::Condition) {
            ColumnRole::Condition
        } else {
            ColumnRole::Name
        };
        let mut conditions = Vec::new();
        for row in info.rows() {
            let (name, _) = row.read_name(name_role);
            if name.is_empty() {
                continue;
            }
            let entity = Entity::new(
                name,
                self.source(row.row().span),
                table_path.child(row.index()),
                EntityData::Condition(Condition {
                    description: row.read_value(&[ColumnRole::Description, ColumnRole::Summary]),
                }),
            );
            let id = self.add_child(owner, entity);
            self.link_row(id, &row, name_role, &table_path);
            conditions.push(id);
        }
        conditions
    }

    fn cluster_requirements(
        &mut self,
        owner: EntityId,
        section: &'a Section,
        path: &ElementPath,
    ) -> Vec<EntityId> {
        let Some(info) = self.table(section, path) else {
            return Vec::new();
        };
        let table_path = Self::table_path(section, path);
        let name_role = if info.has_column(ColumnRole::Cluster) {
            ColumnRole::Cluster
        } else {
            ColumnRole::Name
        };
        let mut requirements = Vec::new();
        for row in info.rows() {
            let (name, reference) = row.read_name(name_role);
            if name.is_empty() {
                continue;
            }
            let cluster_id = self.read_id(&row, ColumnRole::Id);
            let side = row
                .read_string(ColumnRole::ClientServer)
                .and_then(|text| match text.trim().to_ascii_lowercase().as_str() {
                    "client" => Some(ClusterSide::Client),
                    "server" => Some(ClusterSide::Server),
                    _ => None,
                });
            let name = SmolStr::from(strip_suffix(&name, &[" Cluster"]));
            let mut entity = Entity::new(
                name.clone(),
                self.source(row.row().span),
                table_path.child(row.index()),
                EntityData::ClusterRequirement(ClusterRequirement {
                    cluster: ClusterRef {
                        id: cluster_id,
                        name,
                        reference,
                        resolution: Resolution::Unresolved,
                    },
                    side,
                    quality: row.read_quality(ColumnRole::Quality),
                }),
            );
            entity.conformance = self.read_conformance(&row, ColumnRole::Conformance);
            requirements.push(self.add_child(owner, entity));
        }
        requirements
    }

    fn element_requirements(
        &mut self,
        owner: EntityId,
        section: &'a Section,
        path: &ElementPath,
    ) -> Vec<EntityId> {
        let Some(info) = self.table(section, path) else {
            return Vec::new();
        };
        let table_path = Self::table_path(section, path);
        let mut requirements = Vec::new();
        for row in info.rows() {
            let (element_name, _) = row.read_name(ColumnRole::Name);
            let (cluster_name, reference) = row.read_name(ColumnRole::Cluster);
            let Some(element) = row
                .read_string(ColumnRole::Element)
                .and_then(|text| ElementKind::parse(&text))
            else {
                tracing::debug!(row = row.index(), "element requirement without element kind");
                continue;
            };
            if element_name.is_empty() {
                continue;
            }
            let cluster_id = self.read_id(&row, ColumnRole::Id);
            let mut entity = Entity::new(
                element_name.as_str(),
                self.source(row.row().span),
                table_path.child(row.index()),
                EntityData::ElementRequirement(ElementRequirement {
                    cluster: ClusterRef {
                        id: cluster_id,
                        name: strip_suffix(&cluster_name, &[" Cluster"]).into(),
                        reference,
                        resolution: Resolution::Unresolved,
                    },
                    element,
                    element_name: element_name.as_str().into(),
                    target: Resolution::Unresolved,
                    constraint: self.read_constraint(&row, ColumnRole::Constraint),
                    access: row.read_access(ColumnRole::Access),
                }),
            );
            entity.conformance = self.read_conformance(&row, ColumnRole::Conformance);
            requirements.push(self.add_child(owner, entity));
        }
        requirements
    }

    /// A namespace: its id from the section's own table, its tags from the
    /// semantic tag subsection.
    pub(super) fn namespace(&mut self, section: &'a Section, path: &ElementPath) -> EntityId {
        let mut entity = Entity::new(
            strip_suffix(&section.name, &[" Namespace"]),
            self.source(section.span),
            path.clone(),
            EntityData::Namespace(Namespace::default()),
        );
        if section.first_table().is_some() {
            if let Some(info) = self.table(section, path) {
                if let Some(row) = info.rows().next() {
                    entity.id = self.read_id(&row, ColumnRole::Id);
                }
            }
        }
        let namespace = self.add(entity);
        self.link_section(namespace, section, path);

        let mut tags = Vec::new();
        for (index, child) in section.subsections() {
            if child.kind == SectionKind::SemanticTags {
                tags.extend(self.tags(namespace, child, &path.child(index)));
            }
        }
        if let EntityData::Namespace(n) = &mut self.entity_mut(namespace).data {
            n.tags = tags;
        }
        namespace
    }

    fn tags(&mut self, owner: EntityId, section: &'a Section, path: &ElementPath) -> Vec<EntityId> {
        let Some(info) = self.table(section, path) else {
            return Vec::new();
        };
        let table_path = Self::table_path(section, path);
        let mut tags = Vec::new();
        for row in info.rows() {
            let (name, _) = row.read_name(ColumnRole::Name);
            if name.is_empty() {
                continue;
            }
            let mut entity = Entity::new(
                name,
                self.source(row.row().span),
                table_path.child(row.index()),
                EntityData::SemanticTag(SemanticTag {
                    summary: row.read_value(&[ColumnRole::Summary, ColumnRole::Description]),
                }),
            );
            entity.id = self.read_id(&row, ColumnRole::Id);
            let id = self.add_child(owner, entity);
            self.link_row(id, &row, ColumnRole::Name, &table_path);
            tags.push(id);
        }
        tags
    }
}
