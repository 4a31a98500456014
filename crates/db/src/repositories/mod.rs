use concierge_core::collaborators::CollaboratorError;
use thiserror::Error;

pub mod queue;
pub mod restaurant;

pub use queue::{QueueDepth, SqlMessageQueue};
pub use restaurant::{SqlCuisineIndex, SqlDetailStore};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for CollaboratorError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(source) => Self::Unavailable(source.to_string()),
            RepositoryError::Decode(message) => Self::Malformed(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use concierge_core::collaborators::CollaboratorError;

    use super::RepositoryError;

    #[test]
    fn database_errors_are_retryable_collaborator_errors() {
        let error = CollaboratorError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        assert!(error.is_retryable());
    }

    #[test]
    fn decode_errors_are_malformed() {
        let error = CollaboratorError::from(RepositoryError::Decode("bad rating".to_string()));
        assert_eq!(error, CollaboratorError::Malformed("bad rating".to_string()));
    }
}
