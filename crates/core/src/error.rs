use crate::types::DbId;

/// Domain error taxonomy.
///
/// `InternalConsistency` marks a broken invariant (a dangling foreign
/// reference, a user without an aggregate row) and must always surface as a
/// fault; it is never recoverable at the call site.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal consistency violation: {0}")]
    InternalConsistency(String),
}
