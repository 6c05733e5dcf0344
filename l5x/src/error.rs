use quicksfc_dsl::{diagnostic::Diagnostic, error::ValidationError};
use thiserror::Error;

/// Errors that stop an export.
#[derive(Debug, Error)]
pub enum L5xError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Internal(Diagnostic),

    #[error("Unable to write L5X: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to write L5X: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Generated L5X is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Unable to format export date: {0}")]
    Date(#[from] time::error::Format),
}

impl L5xError {
    /// The diagnostics that describe the error, if it has any.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            L5xError::Validation(err) => err.diagnostics().to_vec(),
            L5xError::Internal(diagnostic) => vec![diagnostic.clone()],
            _ => vec![],
        }
    }
}
