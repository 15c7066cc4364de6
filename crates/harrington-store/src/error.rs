//! Store error types.

use thiserror::Error;

/// Errors raised when loading or querying the relation store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique name is already taken.
    #[error("{entity} name already exists: {name}")]
    DuplicateName { entity: &'static str, name: String },

    /// A uniquely keyed row already exists.
    #[error("{entity} already exists: {key}")]
    DuplicateKey { entity: &'static str, key: String },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A weight points at a characteristic that is not a potential.
    #[error("characteristic {0} is not a potential")]
    NotAPotential(String),

    /// A value the store cannot hold.
    #[error("invalid {entity}: {message}")]
    Invalid {
        entity: &'static str,
        message: String,
    },
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub(crate) fn duplicate_key(entity: &'static str, key: impl ToString) -> Self {
        StoreError::DuplicateKey {
            entity,
            key: key.to_string(),
        }
    }
}
