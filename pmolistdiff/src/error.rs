//! Types d'erreurs pour pmolistdiff

/// Errors raised when a snapshot breaks the list-diff preconditions.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DiffError {
    #[error("Duplicate media id in snapshot: {id} (positions {first} and {second})")]
    DuplicateId {
        id: String,
        first: usize,
        second: usize,
    },

    #[error("Several records without media id in snapshot (positions {first} and {second})")]
    DuplicateMissingId { first: usize, second: usize },
}

/// Type Result spécialisé pour pmolistdiff
pub type Result<T> = std::result::Result<T, DiffError>;
