//! Assertions over a built specification.

use spectral::{Diagnostic, EntityId, Specification};

/// Assert the model carries no diagnostics at all.
pub fn assert_no_diagnostics(spec: &Specification) {
    assert!(
        spec.diagnostics().is_empty(),
        "Expected no diagnostics, got {}:\n{}",
        spec.diagnostics().len(),
        spec.diagnostics()
            .iter()
            .map(|d| format!("  {d}"))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Diagnostics with the given code.
pub fn diagnostics_with_code<'s>(spec: &'s Specification, code: &str) -> Vec<&'s Diagnostic> {
    spec.diagnostics().iter().filter(|d| d.code() == code).collect()
}

/// The attribute `name` of cluster `cluster`.
pub fn attribute(spec: &Specification, cluster: &str, name: &str) -> EntityId {
    let cluster = spec
        .cluster_by_name(cluster)
        .unwrap_or_else(|| panic!("no cluster '{cluster}'"));
    spec.cluster(cluster)
        .unwrap()
        .attributes
        .iter()
        .copied()
        .find(|a| spec.entity(*a).name == name)
        .unwrap_or_else(|| panic!("no attribute '{name}'"))
}
