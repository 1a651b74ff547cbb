//! Scope chains for reference lookup.
//!
//! A chain is a stack of [`Scope`]s, innermost first. Lookup walks the stack
//! and the first scope that knows a name wins, so an identifier written in a
//! struct field's constraint sees the struct's sibling fields before the
//! cluster's attributes, and those before anything global.

use smol_str::SmolStr;

use crate::base::DocumentId;
use crate::doc::{CrossReference, ElementPath};
use crate::model::{EntityData, EntityId, EntityKind};
use crate::options::BuildOptions;
use crate::spec::Specification;

// ============================================================================
// SCOPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Sibling fields: attributes of a cluster, fields of a struct, command
    /// or event.
    Fields { owner: EntityId },
    /// Values of an enum or bits of a bitmap.
    Values { owner: EntityId },
    Commands { cluster: EntityId },
    Events { cluster: EntityId },
    /// Everything a cluster declares, then the same through its base
    /// clusters.
    Cluster { cluster: EntityId },
    /// Device type conditions, falling back to the base device type.
    Conditions { device_type: EntityId },
    /// Members of a resolved container, for `Enum.Value` paths.
    Entities { container: EntityId },
    /// Global objects, clusters, device types and namespaces.
    Spec,
}

impl Scope {
    /// Every `(name, entity)` pair this scope can answer, in lookup order.
    pub fn members(&self, spec: &Specification) -> Vec<(SmolStr, EntityId)> {
        let mut members = Vec::new();
        let push = |ids: &[EntityId], members: &mut Vec<(SmolStr, EntityId)>| {
            members.extend(ids.iter().map(|id| (spec.entity(*id).name.clone(), *id)));
        };
        match *self {
            Scope::Fields { owner } => match &spec.entity(owner).data {
                EntityData::Cluster(c) => push(&c.attributes, &mut members),
                EntityData::Struct(s) => push(&s.fields, &mut members),
                EntityData::Command(c) => push(&c.fields, &mut members),
                EntityData::Event(e) => push(&e.fields, &mut members),
                _ => {}
            },
            Scope::Values { owner } => match &spec.entity(owner).data {
                EntityData::Enum(e) => push(&e.values, &mut members),
                EntityData::Bitmap(b) => push(&b.bits, &mut members),
                _ => {}
            },
            Scope::Commands { cluster } => {
                for c in spec.cluster_chain(cluster) {
                    if let Some(cluster) = spec.cluster(c) {
                        push(&cluster.commands, &mut members);
                    }
                }
            }
            Scope::Events { cluster } => {
                for c in spec.cluster_chain(cluster) {
                    if let Some(cluster) = spec.cluster(c) {
                        push(&cluster.events, &mut members);
                    }
                }
            }
            Scope::Cluster { cluster } => {
                for c in spec.cluster_chain(cluster) {
                    let Some(cluster) = spec.cluster(c) else {
                        continue;
                    };
                    for feature in &cluster.features {
                        if let EntityData::Feature(f) = &spec.entity(*feature).data {
                            members.push((f.code.clone(), *feature));
                        }
                    }
                    for ids in [
                        &cluster.features,
                        &cluster.attributes,
                        &cluster.enums,
                        &cluster.bitmaps,
                        &cluster.structs,
                        &cluster.typedefs,
                        &cluster.commands,
                        &cluster.events,
                    ] {
                        push(ids, &mut members);
                    }
                }
            }
            Scope::Conditions { device_type } => {
                let mut owners = vec![device_type];
                if let Some(base) = spec.base_device_type().filter(|b| *b != device_type) {
                    owners.push(base);
                }
                for owner in owners {
                    if let Some(dt) = spec.device_type(owner) {
                        push(&dt.conditions, &mut members);
                    }
                }
            }
            Scope::Entities { container } => {
                push(&spec.entity(container).children(), &mut members);
            }
            Scope::Spec => {
                push(spec.global_objects(), &mut members);
                push(spec.clusters(), &mut members);
                push(spec.device_types(), &mut members);
                push(spec.namespaces(), &mut members);
            }
        }
        members
    }

    fn contains(&self, spec: &Specification, entity: EntityId) -> bool {
        self.members(spec).iter().any(|(_, id)| *id == entity)
    }
}

// ============================================================================
// SCOPE CHAIN
// ============================================================================

/// Where a reference is written: the entity whose expression or type holds
/// it, and its location for anchor lookup.
#[derive(Debug, Clone)]
pub struct Site {
    pub entity: EntityId,
    pub document: DocumentId,
    pub path: ElementPath,
}

impl Site {
    pub fn of(spec: &Specification, entity: EntityId) -> Self {
        let e = spec.entity(entity);
        Self {
            entity,
            document: e.source.document,
            path: e.path.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScopeChain {
    scopes: Vec<Scope>,
    /// An expression never resolves to the entity that owns it.
    exclude: Option<EntityId>,
}

impl ScopeChain {
    pub fn new(scopes: Vec<Scope>) -> Self {
        Self {
            scopes,
            exclude: None,
        }
    }

    pub fn excluding(mut self, entity: EntityId) -> Self {
        self.exclude = Some(entity);
        self
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// The chain seen from `site`. Items outside a cluster drop the cluster
    /// link.
    pub fn for_site(spec: &Specification, site: EntityId) -> Self {
        let entity = spec.entity(site);
        let cluster = spec.owning_cluster(site);
        let device_type = spec.owning_device_type(site);
        let mut scopes = Vec::new();

        match entity.kind() {
            EntityKind::Field => {
                if let Some(owner) = entity.parent {
                    scopes.push(Scope::Fields { owner });
                    if let Some(cluster) = cluster {
                        match spec.kind(owner) {
                            EntityKind::Command => scopes.push(Scope::Commands { cluster }),
                            EntityKind::Event => scopes.push(Scope::Events { cluster }),
                            _ => {}
                        }
                    }
                }
            }
            EntityKind::Command => scopes.extend(cluster.map(|cluster| Scope::Commands { cluster })),
            EntityKind::Event => scopes.extend(cluster.map(|cluster| Scope::Events { cluster })),
            EntityKind::EnumValue | EntityKind::BitmapBit => {
                scopes.extend(entity.parent.map(|owner| Scope::Values { owner }))
            }
            EntityKind::ElementRequirement => {
                if let EntityData::ElementRequirement(req) = &entity.data {
                    scopes.extend(req.cluster.resolution.entity().map(|cluster| Scope::Cluster { cluster }));
                }
            }
            _ => {}
        }
        if let Some(cluster) = cluster {
            scopes.push(Scope::Cluster { cluster });
        }
        if let Some(device_type) = device_type {
            scopes.push(Scope::Conditions { device_type });
        }
        scopes.push(Scope::Spec);

        Self::new(scopes).excluding(site)
    }

    /// First entity called `name`, innermost scope first.
    pub fn find_by_identifier(&self, spec: &Specification, name: &str) -> Option<EntityId> {
        for scope in &self.scopes {
            let found = scope
                .members(spec)
                .into_iter()
                .find(|(n, id)| n == name && Some(*id) != self.exclude);
            if let Some((_, id)) = found {
                tracing::trace!(name, ?scope, entity = ?id, "identifier resolved");
                return Some(id);
            }
        }
        None
    }

    /// Resolve a cross-reference to one of the entities built from its
    /// anchor. With several, the first scope holding one of them wins; an
    /// anchor still ambiguous at the outermost scope falls back to its label.
    pub fn find_by_reference(
        &self,
        spec: &Specification,
        reference: &CrossReference,
        site: &Site,
    ) -> Option<EntityId> {
        let anchor = spec.anchors().lookup(&reference.id, site.document, &site.path);
        let label = reference
            .label
            .clone()
            .or_else(|| anchor.and_then(|a| a.label.as_deref().map(SmolStr::from)));
        let entities: Vec<EntityId> = anchor
            .map(|a| spec.anchor_entities(&a.id))
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|id| Some(*id) != self.exclude)
            .collect();

        match entities.as_slice() {
            [] => {}
            [only] => return Some(*only),
            several => {
                for scope in self.scopes.iter().filter(|s| **s != Scope::Spec) {
                    if let Some(found) = several.iter().find(|id| scope.contains(spec, **id)) {
                        tracing::trace!(reference = %reference.id, ?scope, "reference resolved");
                        return Some(*found);
                    }
                }
            }
        }
        let label = label?;
        tracing::trace!(reference = %reference.id, %label, "falling back to label");
        self.find_by_identifier(spec, &label)
    }

    /// Follow an `A.B.C` path from an already resolved head.
    ///
    /// Each step looks inside the previous entity; a field or typedef steps
    /// into its resolved data type.
    pub fn find_path(spec: &Specification, head: EntityId, path: &[SmolStr]) -> Option<EntityId> {
        let mut current = head;
        for part in path {
            let container = match spec.entity(current).data_type() {
                Some(data_type) => data_type.entity().unwrap_or(current),
                None => current,
            };
            current = ScopeChain::new(vec![Scope::Entities { container }])
                .find_by_identifier(spec, part)?;
        }
        Some(current)
    }

    /// Names reachable through the chain that are close to `name`: a prefix
    /// match or within the configured edit distance. Ordered by (distance,
    /// name).
    pub fn suggest(&self, spec: &Specification, name: &str, options: &BuildOptions) -> Vec<SmolStr> {
        let lower = name.to_lowercase();
        let mut ranked: Vec<(usize, SmolStr)> = Vec::new();
        for scope in &self.scopes {
            for (candidate, _) in scope.members(spec) {
                if candidate == name || ranked.iter().any(|(_, c)| *c == candidate) {
                    continue;
                }
                let distance = strsim::levenshtein(name, &candidate);
                let prefix = candidate.to_lowercase().starts_with(&lower);
                if distance <= options.suggestion_distance || prefix {
                    ranked.push((distance, candidate));
                }
            }
        }
        ranked.sort();
        ranked.truncate(options.max_suggestions);
        tracing::trace!(name, suggestions = ranked.len(), "ranked suggestions");
        ranked.into_iter().map(|(_, name)| name).collect()
    }
}
