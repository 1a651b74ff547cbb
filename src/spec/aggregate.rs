//! Merging per-document models into one specification.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::Specification;
use crate::anchor::AnchorIndex;
use crate::builder::{AnchorLink, DocumentModel};
use crate::model::{EntityData, EntityId};

impl Specification {
    /// Merge document models, in document order, into one arena and build
    /// the global indices.
    ///
    /// Indices are write-once per key: the first cluster with an id or name
    /// wins the slot, and later ones are left for validation to report.
    pub fn aggregate(models: Vec<DocumentModel>, anchors: AnchorIndex) -> Self {
        let mut spec = Specification {
            anchors,
            ..Specification::default()
        };
        let mut links = Vec::new();

        for model in models {
            let offset = spec.entities.len();
            spec.documents.push(model.path);
            spec.entities.extend(model.entities.into_iter().map(|mut entity| {
                entity.rebase(offset);
                entity
            }));
            for root in model.roots {
                spec.add_root(root.offset(offset));
            }
            if let Some(base) = model.base_device_type {
                spec.base_device_type.get_or_insert(base.offset(offset));
            }
            links.extend(model.anchor_links.into_iter().map(|mut link| {
                link.rebase(offset);
                link
            }));
            spec.diagnostics.extend(model.diagnostics);
        }

        spec.index_names();
        spec.index_anchor_links(links);
        tracing::debug!(
            documents = spec.documents.len(),
            entities = spec.entities.len(),
            clusters = spec.clusters.len(),
            device_types = spec.device_types.len(),
            "aggregated specification"
        );
        spec
    }

    fn add_root(&mut self, root: EntityId) {
        let entity = &self.entities[root.index()];
        match &entity.data {
            EntityData::Cluster(_) => {
                self.clusters.push(root);
                if let Some(id) = entity.id {
                    self.clusters_by_id.entry(id).or_insert(root);
                }
                self.clusters_by_name
                    .entry(entity.name.clone())
                    .or_insert(root);
            }
            EntityData::DeviceType(_) => self.device_types.push(root),
            EntityData::Namespace(_) => self.namespaces.push(root),
            _ if entity.kind().is_data_type() => self.global_objects.push(root),
            _ => {}
        }
    }

    fn index_names(&mut self) {
        let mut by_name: FxHashMap<SmolStr, IndexMap<EntityId, Option<EntityId>>> =
            FxHashMap::default();
        for index in 0..self.entities.len() {
            let id = EntityId::new(index);
            let cluster = self.owning_cluster(id).filter(|c| *c != id);
            by_name
                .entry(self.entities[index].name.clone())
                .or_default()
                .insert(id, cluster);
        }
        self.entities_by_name = by_name;
    }

    /// Map anchor links to final anchor ids.
    fn index_anchor_links(&mut self, links: Vec<AnchorLink>) {
        for link in links {
            let entity = link.entity();
            let document = self.entities[entity.index()].source.document;
            let anchor = match &link {
                AnchorLink::Element { path, .. } => self.anchors.at(document, path),
                AnchorLink::Raw { id, origin, .. } => self.anchors.lookup(id, document, origin),
            };
            match anchor {
                Some(anchor) => {
                    let entities = self.anchor_entities.entry(anchor.id.clone()).or_default();
                    if !entities.contains(&entity) {
                        entities.push(entity);
                    }
                }
                None => tracing::trace!(?link, "anchor link without anchor"),
            }
        }
    }
}
