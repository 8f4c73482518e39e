use draftline_history::Violation;
use draftline_types::DocumentId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// A version reference (number, id, `head` or `latest`) matched nothing.
    #[error("unknown version: {0}")]
    UnknownVersion(String),

    /// A loaded history failed validation.
    #[error("history of document {document} failed validation with {} violation(s)", violations.len())]
    CorruptHistory {
        document: DocumentId,
        violations: Vec<Violation>,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] draftline_core::CoreError),

    #[error("store error: {0}")]
    Store(#[from] draftline_store::StoreError),
}

pub type SdkResult<T> = Result<T, SdkError>;
