//! The aggregate specification model.
//!
//! ## Key Types
//!
//! - [`Specification`] - every entity of every document in one arena, plus
//!   the indices consumers and the resolver look things up by
//!
//! The specification is assembled once per build by [`Specification::aggregate`],
//! resolved, validated, and read-only afterwards.

mod aggregate;
mod validate;

#[cfg(test)]
mod tests;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::anchor::AnchorIndex;
use crate::diagnostics::Diagnostic;
use crate::model::{
    Cluster, DeviceType, Entity, EntityData, EntityId, EntityKind, Field,
};

#[derive(Debug, Default)]
pub struct Specification {
    pub(crate) entities: Vec<Entity>,
    pub(crate) documents: Vec<SmolStr>,
    pub(crate) clusters: Vec<EntityId>,
    pub(crate) clusters_by_id: IndexMap<u64, EntityId>,
    pub(crate) clusters_by_name: IndexMap<SmolStr, EntityId>,
    /// Name → {entity → owning cluster}.
    pub(crate) entities_by_name: FxHashMap<SmolStr, IndexMap<EntityId, Option<EntityId>>>,
    /// Data types that belong to no cluster.
    pub(crate) global_objects: Vec<EntityId>,
    pub(crate) device_types: Vec<EntityId>,
    pub(crate) base_device_type: Option<EntityId>,
    pub(crate) namespaces: Vec<EntityId>,
    pub(crate) anchors: AnchorIndex,
    /// Final anchor id → entities built from the anchored element.
    pub(crate) anchor_entities: FxHashMap<SmolStr, Vec<EntityId>>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Specification {
    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.index()]
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.index())
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.index()]
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityId::new(i), e))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Source document paths, indexed by [`crate::DocumentId`].
    pub fn documents(&self) -> &[SmolStr] {
        &self.documents
    }

    pub fn clusters(&self) -> &[EntityId] {
        &self.clusters
    }

    pub fn cluster_by_id(&self, id: u64) -> Option<EntityId> {
        self.clusters_by_id.get(&id).copied()
    }

    pub fn cluster_by_name(&self, name: &str) -> Option<EntityId> {
        self.clusters_by_name.get(name).copied()
    }

    /// Every entity called `name`, with the cluster that owns it.
    pub fn entities_named(&self, name: &str) -> Vec<(EntityId, Option<EntityId>)> {
        self.entities_by_name
            .get(name)
            .map(|entries| entries.iter().map(|(e, c)| (*e, *c)).collect())
            .unwrap_or_default()
    }

    pub fn global_objects(&self) -> &[EntityId] {
        &self.global_objects
    }

    pub fn device_types(&self) -> &[EntityId] {
        &self.device_types
    }

    pub fn base_device_type(&self) -> Option<EntityId> {
        self.base_device_type
    }

    pub fn namespaces(&self) -> &[EntityId] {
        &self.namespaces
    }

    pub fn anchors(&self) -> &AnchorIndex {
        &self.anchors
    }

    /// Entities built from the element carrying anchor `id` (final id).
    pub fn anchor_entities(&self, id: &str) -> &[EntityId] {
        self.anchor_entities
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    // ------------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------------

    pub fn cluster(&self, id: EntityId) -> Option<&Cluster> {
        self.get(id)?.as_cluster()
    }

    pub fn field(&self, id: EntityId) -> Option<&Field> {
        self.get(id)?.as_field()
    }

    pub fn device_type(&self, id: EntityId) -> Option<&DeviceType> {
        self.get(id)?.as_device_type()
    }

    pub fn kind(&self, id: EntityId) -> EntityKind {
        self.entity(id).kind()
    }

    /// The nearest enclosing cluster, the entity itself included.
    pub fn owning_cluster(&self, id: EntityId) -> Option<EntityId> {
        let mut current = Some(id);
        while let Some(id) = current {
            let entity = self.entity(id);
            if matches!(entity.data, EntityData::Cluster(_)) {
                return Some(id);
            }
            current = entity.parent;
        }
        None
    }

    /// The nearest enclosing device type, the entity itself included.
    pub fn owning_device_type(&self, id: EntityId) -> Option<EntityId> {
        let mut current = Some(id);
        while let Some(id) = current {
            let entity = self.entity(id);
            if matches!(entity.data, EntityData::DeviceType(_)) {
                return Some(id);
            }
            current = entity.parent;
        }
        None
    }

    /// `cluster` followed by its declared base clusters, stopping at a cycle.
    pub fn cluster_chain(&self, cluster: EntityId) -> Vec<EntityId> {
        let mut chain = vec![cluster];
        let mut current = cluster;
        while let Some(parent) = self.cluster(current).and_then(Cluster::parent_cluster) {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Serialize the model for downstream generators.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        #[derive(serde::Serialize)]
        struct Export<'a> {
            documents: &'a [SmolStr],
            entities: &'a [Entity],
            clusters: &'a [EntityId],
            device_types: &'a [EntityId],
            global_objects: &'a [EntityId],
            namespaces: &'a [EntityId],
            diagnostics: &'a [Diagnostic],
        }
        serde_json::to_string_pretty(&Export {
            documents: &self.documents,
            entities: &self.entities,
            clusters: &self.clusters,
            device_types: &self.device_types,
            global_objects: &self.global_objects,
            namespaces: &self.namespaces,
            diagnostics: &self.diagnostics,
        })
    }
}
