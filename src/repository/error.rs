/// All errors that can be returned by a [`Repository`](super::Repository) implementation.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No record matched the lookup.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The call was rejected before touching the store.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A unique key is already taken.
    #[error("{entity} already exists: {key}")]
    Conflict { entity: &'static str, key: String },

    /// A backend-specific storage error (connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        RepositoryError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}
