//! The build pipeline: documents in, resolved specification out.
//!
//! ```text
//! documents ──par_iter──► build_document ─┐      (one task per document)
//!                                          ▼
//!                              barrier: Vec<DocumentModel>
//!                                          │
//!          AnchorIndex::build → rewrite cross-references
//!                                          │
//!          Specification::aggregate → Resolver::resolve → validate
//! ```

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::anchor::AnchorIndex;
use crate::base::DocumentId;
use crate::builder::{DocumentModel, build_document};
use crate::doc::Document;
use crate::error::BuildError;
use crate::options::BuildOptions;
use crate::resolve::Resolver;
use crate::spec::Specification;

/// Build the specification model from `documents`.
///
/// Cross-references in `documents` are rewritten in place to the final,
/// disambiguated anchor ids.
pub fn build(documents: &mut [Document], options: &BuildOptions) -> Result<Specification, BuildError> {
    build_with_cancel(documents, options, &CancellationToken::new())
}

/// [`build`], checking `cancel` before each document is started.
///
/// Documents already being built finish; the build then returns
/// [`BuildError::Cancelled`].
pub fn build_with_cancel(
    documents: &mut [Document],
    options: &BuildOptions,
    cancel: &CancellationToken,
) -> Result<Specification, BuildError> {
    check_required(documents, options)?;

    let models = build_documents(documents, options, cancel)?;
    if cancel.is_cancelled() {
        return Err(BuildError::Cancelled);
    }

    let anchors = AnchorIndex::build(documents);
    anchors.rewrite_cross_references(documents);

    let mut spec = Specification::aggregate(models, anchors);
    let failures = Resolver::new(options).resolve(&mut spec);
    spec.validate();
    if options.simplify_constraints {
        spec.simplify_constraints();
    }

    tracing::info!(
        documents = spec.documents().len(),
        entities = spec.len(),
        clusters = spec.clusters().len(),
        device_types = spec.device_types().len(),
        unresolved = failures.len(),
        diagnostics = spec.diagnostics().len(),
        "specification built"
    );
    Ok(spec)
}

fn check_required(documents: &[Document], options: &BuildOptions) -> Result<(), BuildError> {
    for required in &options.required_documents {
        let present = documents
            .iter()
            .any(|d| d.path == *required || d.stem() == required.as_str());
        if !present {
            tracing::warn!(document = %required, "required document missing");
            return Err(BuildError::missing_document(required.clone()));
        }
    }
    Ok(())
}

fn build_documents(
    documents: &[Document],
    options: &BuildOptions,
    cancel: &CancellationToken,
) -> Result<Vec<DocumentModel>, BuildError> {
    let build_one = |(index, document): (usize, &Document)| {
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }
        build_document(DocumentId::new(index), document)
    };
    let result: Result<Vec<DocumentModel>, BuildError> = if options.parallel {
        documents.par_iter().enumerate().map(build_one).collect()
    } else {
        documents.iter().enumerate().map(build_one).collect()
    };
    if let Err(error) = &result {
        tracing::warn!(%error, "build stopped");
    }
    result
}
