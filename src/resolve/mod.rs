//! Reference resolution.
//!
//! ## Architecture
//!
//! ```text
//! Resolver::resolve(&mut Specification)
//!   ├── cluster bases          ClusterRef  → Cluster
//!   ├── data types             CustomType  → Enum | Bitmap | Struct | TypeDef
//!   ├── device requirements    ClusterRef  → Cluster, element name → member
//!   ├── command responses      name        → Command
//!   └── expressions            conformance / constraint leaves → any entity
//!         │
//!         └── ScopeChain::for_site(site)   innermost scope first
//! ```
//!
//! Every leaf is a [`Resolution`] slot. Resolved slots are skipped, so a
//! second run only retries what failed before. Misses are collected in a
//! failure table and turned into diagnostics at the end of the run,
//! replacing the diagnostics of any earlier run.

mod scope;


use smol_str::SmolStr;

pub use scope::{Scope, ScopeChain, Site};

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::model::{
    ClusterRef, CommandResponse, Constraint, CustomType, ElementKind, Entity, EntityData,
    EntityId, EntityKind, ReferenceLeaf, ReferenceTarget, Resolution,
};
use crate::options::BuildOptions;
use crate::spec::Specification;

// ============================================================================
// FAILURES
// ============================================================================

/// One reference that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    /// The entity the reference is written on.
    pub site: EntityId,
    pub name: SmolStr,
    pub kind: FailureKind,
    pub suggestions: Vec<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Identifier,
    Reference,
    DataType,
    AmbiguousDataType { candidates: usize },
    ParentCluster,
    RequiredCluster,
    RequiredElement { element: ElementKind, cluster: SmolStr },
    Response,
}

impl ResolutionFailure {
    fn to_diagnostic(&self, spec: &Specification) -> Diagnostic {
        let name = self.name.clone();
        let kind = match &self.kind {
            FailureKind::Identifier => DiagnosticKind::UnresolvedIdentifier { name },
            FailureKind::Reference => DiagnosticKind::UnresolvedReference { id: name },
            FailureKind::DataType => DiagnosticKind::UnknownDataType { name },
            FailureKind::AmbiguousDataType { candidates } => DiagnosticKind::AmbiguousDataType {
                name,
                candidates: *candidates,
            },
            FailureKind::ParentCluster => DiagnosticKind::UnknownParentCluster { name },
            FailureKind::RequiredCluster => DiagnosticKind::UnknownRequiredCluster { name },
            FailureKind::RequiredElement { element, cluster } => {
                DiagnosticKind::UnknownRequiredElement {
                    element: element.display().into(),
                    name,
                    cluster: cluster.clone(),
                }
            }
            FailureKind::Response => DiagnosticKind::UnknownResponse { name },
        };
        Diagnostic::new(kind)
            .with_source(spec.entity(self.site).source)
            .with_entity(self.site)
            .with_suggestions(self.suggestions.clone())
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

#[derive(Debug, Clone)]
pub struct Resolver<'o> {
    options: &'o BuildOptions,
}

impl<'o> Resolver<'o> {
    pub fn new(options: &'o BuildOptions) -> Self {
        Self { options }
    }

    /// Resolve every reference in the model and report what failed.
    ///
    /// Safe to call again: resolved leaves are kept, failed ones retried.
    pub fn resolve(&self, spec: &mut Specification) -> Vec<ResolutionFailure> {
        let mut failures = Vec::new();

        self.resolve_cluster_bases(spec, &mut failures);
        self.resolve_data_types(spec, &mut failures);
        self.resolve_requirements(spec, &mut failures);
        self.resolve_responses(spec, &mut failures);
        self.resolve_expressions(spec, &mut failures);

        spec.diagnostics.retain(|d| !d.kind.is_resolution());
        let diagnostics: Vec<Diagnostic> =
            failures.iter().map(|f| f.to_diagnostic(spec)).collect();
        spec.diagnostics.extend(diagnostics);

        tracing::debug!(failures = failures.len(), "resolved references");
        failures
    }

    // ------------------------------------------------------------------------
    // Cluster references
    // ------------------------------------------------------------------------

    fn resolve_cluster_bases(&self, spec: &mut Specification, failures: &mut Vec<ResolutionFailure>) {
        for cluster in spec.clusters().to_vec() {
            let Some(base) = spec.cluster(cluster).and_then(|c| c.base.clone()) else {
                continue;
            };
            if base.resolution.is_resolved() {
                continue;
            }
            let resolution = match find_cluster(spec, &base, cluster) {
                Some(found) => Resolution::Resolved(found),
                None => {
                    failures.push(ResolutionFailure {
                        site: cluster,
                        name: base.name.clone(),
                        kind: FailureKind::ParentCluster,
                        suggestions: self.suggest_cluster(spec, &base.name),
                    });
                    Resolution::Failed
                }
            };
            if let EntityData::Cluster(c) = &mut spec.entity_mut(cluster).data {
                if let Some(base) = &mut c.base {
                    base.resolution = resolution;
                }
            }
        }
    }

    fn suggest_cluster(&self, spec: &Specification, name: &str) -> Vec<SmolStr> {
        ScopeChain::new(vec![Scope::Spec]).suggest(spec, name, self.options)
    }

    // ------------------------------------------------------------------------
    // Data types
    // ------------------------------------------------------------------------

    fn resolve_data_types(&self, spec: &mut Specification, failures: &mut Vec<ResolutionFailure>) {
        for index in 0..spec.len() {
            let site = EntityId::new(index);
            let Some(custom) = spec.entity(site).data_type().and_then(|t| t.custom_type()) else {
                continue;
            };
            if custom.resolution.is_resolved() {
                continue;
            }
            let custom = custom.clone();
            let resolution = match self.find_data_type(spec, site, &custom) {
                Ok(found) => Resolution::Resolved(found),
                Err(kind) => {
                    let suggestions = match kind {
                        FailureKind::DataType => ScopeChain::for_site(spec, site)
                            .suggest(spec, &custom.name, self.options),
                        _ => Vec::new(),
                    };
                    failures.push(ResolutionFailure {
                        site,
                        name: custom.name.clone(),
                        kind,
                        suggestions,
                    });
                    Resolution::Failed
                }
            };
            if let Some(slot) = custom_type_mut(spec.entity_mut(site)) {
                slot.resolution = resolution;
            }
        }
    }

    /// A cross-referenced type goes through the anchor; a named one is
    /// chosen among the type entities of that name: same cluster, then the
    /// base cluster chain, then a unique cluster-less type, then the only
    /// candidate there is.
    fn find_data_type(
        &self,
        spec: &Specification,
        site: EntityId,
        custom: &CustomType,
    ) -> Result<EntityId, FailureKind> {
        if let Some(reference) = &custom.reference {
            let found = ScopeChain::for_site(spec, site).find_by_reference(
                spec,
                reference,
                &Site::of(spec, site),
            );
            if let Some(found) = found.filter(|e| spec.kind(*e).is_data_type()) {
                return Ok(found);
            }
        }

        let candidates: Vec<(EntityId, Option<EntityId>)> = spec
            .entities_named(&custom.name)
            .into_iter()
            .filter(|(e, _)| *e != site && spec.kind(*e).is_data_type())
            .collect();
        if candidates.is_empty() {
            return Err(FailureKind::DataType);
        }

        if let Some(cluster) = spec.owning_cluster(site) {
            for owner in spec.cluster_chain(cluster) {
                if let Some((found, _)) = candidates.iter().find(|(_, c)| *c == Some(owner)) {
                    return Ok(*found);
                }
            }
        }
        let global: Vec<EntityId> = candidates
            .iter()
            .filter(|(_, c)| c.is_none())
            .map(|(e, _)| *e)
            .collect();
        if let [only] = global.as_slice() {
            return Ok(*only);
        }
        if let [(only, _)] = candidates.as_slice() {
            return Ok(*only);
        }
        Err(FailureKind::AmbiguousDataType {
            candidates: candidates.len(),
        })
    }

    // ------------------------------------------------------------------------
    // Device type requirements
    // ------------------------------------------------------------------------

    fn resolve_requirements(&self, spec: &mut Specification, failures: &mut Vec<ResolutionFailure>) {
        for index in 0..spec.len() {
            let site = EntityId::new(index);
            let cluster_ref = match &spec.entity(site).data {
                EntityData::ClusterRequirement(r) => &r.cluster,
                EntityData::ElementRequirement(r) => &r.cluster,
                _ => continue,
            };
            let mut cluster = cluster_ref.resolution;
            if !cluster.is_resolved() {
                let cluster_ref = cluster_ref.clone();
                cluster = match find_cluster(spec, &cluster_ref, site) {
                    Some(found) => Resolution::Resolved(found),
                    None => {
                        failures.push(ResolutionFailure {
                            site,
                            name: cluster_ref.name.clone(),
                            kind: FailureKind::RequiredCluster,
                            suggestions: self.suggest_cluster(spec, &cluster_ref.name),
                        });
                        Resolution::Failed
                    }
                };
            }

            let target = match &spec.entity(site).data {
                EntityData::ElementRequirement(r) if !r.target.is_resolved() => {
                    Some(match cluster.entity() {
                        Some(owner) => match find_element(spec, owner, r.element, &r.element_name) {
                            Some(found) => Resolution::Resolved(found),
                            None => {
                                failures.push(ResolutionFailure {
                                    site,
                                    name: r.element_name.clone(),
                                    kind: FailureKind::RequiredElement {
                                        element: r.element,
                                        cluster: spec.entity(owner).name.clone(),
                                    },
                                    suggestions: Vec::new(),
                                });
                                Resolution::Failed
                            }
                        },
                        // Reported through the cluster.
                        None => Resolution::Failed,
                    })
                }
                _ => None,
            };

            match &mut spec.entity_mut(site).data {
                EntityData::ClusterRequirement(r) => r.cluster.resolution = cluster,
                EntityData::ElementRequirement(r) => {
                    r.cluster.resolution = cluster;
                    if let Some(target) = target {
                        r.target = target;
                    }
                }
                _ => {}
            }
        }
    }

    // ------------------------------------------------------------------------
    // Command responses
    // ------------------------------------------------------------------------

    fn resolve_responses(&self, spec: &mut Specification, failures: &mut Vec<ResolutionFailure>) {
        for index in 0..spec.len() {
            let site = EntityId::new(index);
            let EntityData::Command(command) = &spec.entity(site).data else {
                continue;
            };
            let Some(CommandResponse::Command {
                name,
                reference,
                resolution,
            }) = &command.response
            else {
                continue;
            };
            if resolution.is_resolved() {
                continue;
            }
            let chain = ScopeChain::for_site(spec, site);
            let found = reference
                .as_ref()
                .and_then(|r| chain.find_by_reference(spec, r, &Site::of(spec, site)))
                .or_else(|| chain.find_by_identifier(spec, name))
                .filter(|e| spec.kind(*e) == EntityKind::Command);
            let resolved = match found {
                Some(found) => Resolution::Resolved(found),
                None => {
                    failures.push(ResolutionFailure {
                        site,
                        name: name.clone(),
                        kind: FailureKind::Response,
                        suggestions: chain.suggest(spec, name, self.options),
                    });
                    Resolution::Failed
                }
            };
            if let EntityData::Command(command) = &mut spec.entity_mut(site).data {
                if let Some(CommandResponse::Command { resolution, .. }) = &mut command.response {
                    *resolution = resolved;
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Conformance and constraint expressions
    // ------------------------------------------------------------------------

    fn resolve_expressions(&self, spec: &mut Specification, failures: &mut Vec<ResolutionFailure>) {
        for index in 0..spec.len() {
            let site = EntityId::new(index);
            // Trees are taken out while the rest of the model is searched.
            let mut conformance = spec.entity_mut(site).conformance.take();
            let mut constraint = constraint_slot(spec.entity_mut(site)).and_then(Option::take);
            if conformance.is_none() && constraint.is_none() {
                continue;
            }

            {
                let spec: &Specification = spec;
                let chain = ScopeChain::for_site(spec, site);
                let location = Site::of(spec, site);
                let mut visit = |leaf: ReferenceLeaf<'_>| {
                    self.resolve_leaf(spec, &chain, &location, leaf, failures)
                };
                if let Some(conformance) = &mut conformance {
                    conformance.for_each_reference(&mut visit);
                }
                if let Some(constraint) = &mut constraint {
                    constraint.for_each_reference(&mut visit);
                }
            }

            let entity = spec.entity_mut(site);
            entity.conformance = conformance;
            if let Some(slot) = constraint_slot(entity) {
                *slot = constraint;
            }
        }
    }

    fn resolve_leaf(
        &self,
        spec: &Specification,
        chain: &ScopeChain,
        site: &Site,
        leaf: ReferenceLeaf<'_>,
        failures: &mut Vec<ResolutionFailure>,
    ) {
        if leaf.resolution.is_resolved() {
            return;
        }
        let head = match &leaf.target {
            ReferenceTarget::Identifier(name) => chain.find_by_identifier(spec, name),
            ReferenceTarget::Reference(reference) => chain.find_by_reference(spec, reference, site),
        };
        let found = head.and_then(|head| ScopeChain::find_path(spec, head, leaf.field));
        if let Some(found) = found {
            *leaf.resolution = Resolution::Resolved(found);
            return;
        }

        *leaf.resolution = Resolution::Failed;
        let mut name = leaf.target.display_name().to_string();
        for part in leaf.field {
            name.push('.');
            name.push_str(part);
        }
        let (kind, suggestions) = match (&leaf.target, head) {
            (ReferenceTarget::Identifier(id), None) => {
                (FailureKind::Identifier, chain.suggest(spec, id, self.options))
            }
            (ReferenceTarget::Identifier(_), Some(_)) => (FailureKind::Identifier, Vec::new()),
            (ReferenceTarget::Reference(_), _) => (FailureKind::Reference, Vec::new()),
        };
        failures.push(ResolutionFailure {
            site: site.entity,
            name: name.into(),
            kind,
            suggestions,
        });
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// A cluster by id, then by cross-reference, then by name. Never `exclude`.
fn find_cluster(spec: &Specification, cluster: &ClusterRef, exclude: EntityId) -> Option<EntityId> {
    let is_cluster = |e: &EntityId| *e != exclude && spec.kind(*e) == EntityKind::Cluster;
    if let Some(found) = cluster.id.and_then(|id| spec.cluster_by_id(id)).filter(is_cluster) {
        return Some(found);
    }
    if let Some(reference) = &cluster.reference {
        let found = ScopeChain::new(vec![Scope::Spec])
            .excluding(exclude)
            .find_by_reference(spec, reference, &Site::of(spec, exclude))
            .filter(is_cluster);
        if found.is_some() {
            return found;
        }
    }
    spec.cluster_by_name(&cluster.name)
        .or_else(|| spec.cluster_by_name(crate::builder::strip_suffix(&cluster.name, &[" Cluster"])))
        .filter(is_cluster)
}

/// A required element by name inside `cluster` and its bases; features also
/// match by code.
fn find_element(
    spec: &Specification,
    cluster: EntityId,
    element: ElementKind,
    name: &str,
) -> Option<EntityId> {
    spec.cluster_chain(cluster).into_iter().find_map(|owner| {
        let c = spec.cluster(owner)?;
        let members = match element {
            ElementKind::Attribute => &c.attributes,
            ElementKind::Command => &c.commands,
            ElementKind::Event => &c.events,
            ElementKind::Feature => &c.features,
        };
        members.iter().copied().find(|id| {
            let entity = spec.entity(*id);
            entity.name == name
                || matches!(&entity.data, EntityData::Feature(f) if f.code == name)
        })
    })
}

fn custom_type_mut(entity: &mut Entity) -> Option<&mut CustomType> {
    match &mut entity.data {
        EntityData::Field(f) => f.data_type.as_mut()?.custom_type_mut(),
        EntityData::TypeDef(t) => t.data_type.as_mut()?.custom_type_mut(),
        _ => None,
    }
}

fn constraint_slot(entity: &mut Entity) -> Option<&mut Option<Constraint>> {
    match &mut entity.data {
        EntityData::Field(f) => Some(&mut f.constraint),
        EntityData::TypeDef(t) => Some(&mut t.constraint),
        EntityData::ElementRequirement(r) => Some(&mut r.constraint),
        _ => None,
    }
}
