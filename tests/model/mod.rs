//! End-to-end model tests
//!
//! Documents in, resolved specification out:
//! - The Thermostat cluster with zero diagnostics
//! - Scoped and cross-referenced resolution across documents
//! - Validation diagnostics
//! - Anchor disambiguation and determinism
//! - Expression parsing and constraint simplification

pub mod tests_anchors;
pub mod tests_expressions;
pub mod tests_resolution;
pub mod tests_thermostat;
pub mod tests_validation;
