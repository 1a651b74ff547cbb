//! Build options

use smol_str::SmolStr;

/// Options for one model build
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Build documents on the rayon pool (false = one after another)
    pub parallel: bool,
    /// Rewrite ranges covering a field type's full range to `all`
    pub simplify_constraints: bool,
    /// Maximum edit distance for "did you mean" suggestions
    pub suggestion_distance: usize,
    /// Maximum number of suggestions attached to one diagnostic
    pub max_suggestions: usize,
    /// Document paths (or stems) that must be present for the build to run
    pub required_documents: Vec<SmolStr>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            simplify_constraints: false,
            suggestion_distance: 2,
            max_suggestions: 5,
            required_documents: Vec::new(),
        }
    }
}

impl BuildOptions {
    /// Options for a deterministic single-threaded build
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    pub fn with_required_document(mut self, path: impl Into<SmolStr>) -> Self {
        self.required_documents.push(path.into());
        self
    }
}
