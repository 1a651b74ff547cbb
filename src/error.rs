//! Fatal build errors.

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::Source;

/// Conditions that make the model meaningless and stop a build.
///
/// Everything else is recorded as a [`crate::Diagnostic`] on the
/// specification.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A device type section with no device type identifier rows.
    #[error("device type '{name}' has no identifiers")]
    DeviceTypeWithoutId { name: String, location: Source },

    /// A document named in `BuildOptions::required_documents` was not supplied.
    #[error("required document '{0}' could not be opened")]
    MissingRequiredDocument(SmolStr),

    /// The build was cancelled before every document was built.
    #[error("build cancelled")]
    Cancelled,
}

impl BuildError {
    pub fn device_type_without_id(name: impl Into<String>, location: Source) -> Self {
        Self::DeviceTypeWithoutId {
            name: name.into(),
            location,
        }
    }

    pub fn missing_document(path: impl Into<SmolStr>) -> Self {
        Self::MissingRequiredDocument(path.into())
    }
}
