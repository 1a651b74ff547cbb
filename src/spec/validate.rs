//! Structural validation of the aggregated model.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::Specification;
use crate::diagnostics::{Diagnostic, DiagnosticKind, RelatedInfo};
use crate::model::{CommandDirection, EntityData, EntityId};

impl Specification {
    /// Check id uniqueness per scope, bit overlap, and field types.
    ///
    /// Validation diagnostics are appended; the model is not changed.
    pub fn validate(&mut self) {
        let mut found = Vec::new();

        found.extend(self.duplicate_ids(
            "cluster ids",
            self.clusters.iter().copied(),
        ));
        found.extend(self.duplicate_cluster_names());

        for (index, entity) in self.entities.iter().enumerate() {
            let id = EntityId::new(index);
            match &entity.data {
                EntityData::Cluster(cluster) => {
                    let scope = |what: &str| SmolStr::from(format!("{} {what}", entity.name));
                    found.extend(self.duplicate_ids(scope("features"), cluster.features.iter().copied()));
                    found.extend(self.duplicate_ids(scope("attributes"), cluster.attributes.iter().copied()));
                    found.extend(self.duplicate_ids(scope("events"), cluster.events.iter().copied()));
                    // Requests and responses are numbered independently.
                    let (responses, requests): (Vec<_>, Vec<_>) =
                        cluster.commands.iter().copied().partition(|c| {
                            matches!(&self.entity(*c).data,
                                EntityData::Command(cmd) if cmd.direction == CommandDirection::ServerToClient)
                        });
                    found.extend(self.duplicate_ids(scope("client commands"), requests.into_iter()));
                    found.extend(self.duplicate_ids(scope("server commands"), responses.into_iter()));
                }
                EntityData::Struct(s) => {
                    found.extend(self.duplicate_ids(entity.name.clone(), s.fields.iter().copied()))
                }
                EntityData::Command(c) => {
                    found.extend(self.duplicate_ids(entity.name.clone(), c.fields.iter().copied()))
                }
                EntityData::Event(e) => {
                    found.extend(self.duplicate_ids(entity.name.clone(), e.fields.iter().copied()))
                }
                EntityData::Enum(e) => {
                    found.extend(self.duplicate_ids(entity.name.clone(), e.values.iter().copied()))
                }
                EntityData::Bitmap(b) => found.extend(self.overlapping_bits(id, &b.bits)),
                EntityData::Field(field) if field.data_type.is_none() => found.push(
                    Diagnostic::new(DiagnosticKind::MissingDataType {
                        name: entity.name.clone(),
                    })
                    .with_source(entity.source)
                    .with_entity(id),
                ),
                _ => {}
            }
        }

        tracing::debug!(problems = found.len(), "validated specification");
        self.diagnostics.extend(found);
    }

    /// One diagnostic per id shared by more than one member, naming all of
    /// them and attached to the second.
    fn duplicate_ids(
        &self,
        scope: impl Into<SmolStr>,
        members: impl Iterator<Item = EntityId>,
    ) -> Vec<Diagnostic> {
        let mut by_id: IndexMap<u64, Vec<EntityId>> = IndexMap::new();
        for member in members {
            if let Some(id) = self.entity(member).id {
                by_id.entry(id).or_default().push(member);
            }
        }
        let scope = scope.into();
        by_id
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(id, members)| {
                let names = members
                    .iter()
                    .map(|m| self.entity(*m).name.clone())
                    .collect();
                let second = self.entity(members[1]);
                let mut diagnostic = Diagnostic::new(DiagnosticKind::DuplicateEntityId {
                    id,
                    scope: scope.clone(),
                    names,
                })
                .with_source(second.source)
                .with_entity(members[1]);
                for other in members.iter().filter(|m| **m != members[1]) {
                    let entity = self.entity(*other);
                    diagnostic = diagnostic.with_related(RelatedInfo {
                        source: Some(entity.source),
                        entity: Some(*other),
                        message: format!("'{}' also uses this id", entity.name),
                    });
                }
                diagnostic
            })
            .collect()
    }

    fn overlapping_bits(&self, bitmap: EntityId, bits: &[EntityId]) -> Vec<Diagnostic> {
        let mut found = Vec::new();
        for (i, first) in bits.iter().enumerate() {
            let EntityData::BitmapBit(a) = &self.entity(*first).data else {
                continue;
            };
            for second in &bits[i + 1..] {
                let EntityData::BitmapBit(b) = &self.entity(*second).data else {
                    continue;
                };
                if a.overlaps(b) {
                    let entity = self.entity(*second);
                    found.push(
                        Diagnostic::new(DiagnosticKind::OverlappingBits {
                            bitmap: self.entity(bitmap).name.clone(),
                            first: self.entity(*first).name.clone(),
                            second: entity.name.clone(),
                        })
                        .with_source(entity.source)
                        .with_entity(*second),
                    );
                }
            }
        }
        found
    }

    fn duplicate_cluster_names(&self) -> Vec<Diagnostic> {
        self.clusters
            .iter()
            .filter_map(|cluster| {
                let entity = self.entity(*cluster);
                let first = self.cluster_by_name(&entity.name)?;
                (first != *cluster).then(|| {
                    Diagnostic::new(DiagnosticKind::DuplicateClusterName {
                        name: entity.name.clone(),
                    })
                    .with_source(entity.source)
                    .with_entity(*cluster)
                    .with_related(RelatedInfo {
                        source: Some(self.entity(first).source),
                        entity: Some(first),
                        message: "first defined here".to_string(),
                    })
                })
            })
            .collect()
    }

    /// Rewrite field and typedef constraints that cover their type's full
    /// range to `all`.
    pub fn simplify_constraints(&mut self) {
        let mut simplified = 0usize;
        for entity in &mut self.entities {
            let (data_type, constraint) = match &mut entity.data {
                EntityData::Field(f) => (&f.data_type, &mut f.constraint),
                EntityData::TypeDef(t) => (&t.data_type, &mut t.constraint),
                _ => continue,
            };
            if let (Some(data_type), Some(constraint)) = (data_type, constraint) {
                let next = constraint.simplify(data_type);
                if next != *constraint {
                    *constraint = next;
                    simplified += 1;
                }
            }
        }
        tracing::debug!(simplified, "simplified constraints");
    }
}
