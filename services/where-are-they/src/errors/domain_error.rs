use tracing::error;

use crate::gateways::RepoError;

/// Failures a use-case can report. Storage detail is logged and dropped at
/// this boundary; only the category and a client-safe message survive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal server error")]
    Internal,

    #[error("incorrect user or password")]
    IncorrectUserOrPassword,
}

impl DomainError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DomainError::NotFound(format!("{} {} not found", entity, id))
    }
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate { constraint } => {
                DomainError::Conflict(describe_duplicate(&constraint).to_string())
            }
            RepoError::MissingReference { constraint } => {
                DomainError::BadRequest(format!("referenced entity does not exist ({})", constraint))
            }
            RepoError::Database(e) => {
                error!("Storage failure: {:?}", e);
                DomainError::Internal
            }
        }
    }
}

fn describe_duplicate(constraint: &str) -> &'static str {
    if constraint.contains("username") {
        "username already in use"
    } else if constraint.contains("email") {
        "email already in use"
    } else if constraint.contains("privacy_key") {
        "privacy key already in use"
    } else if constraint.contains("observed_user_id") {
        "observed user already has a school bus"
    } else {
        "resource already exists"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_constraints_become_conflicts_with_field_names() {
        let err = DomainError::from(RepoError::Duplicate {
            constraint: "users_email_key".to_string(),
        });
        assert_eq!(err, DomainError::Conflict("email already in use".to_string()));
    }

    #[test]
    fn database_failures_lose_their_detail() {
        let err = DomainError::from(RepoError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err, DomainError::Internal);
        assert_eq!(err.to_string(), "internal server error");
    }

    #[test]
    fn missing_references_are_bad_requests() {
        let err = DomainError::from(RepoError::MissingReference {
            constraint: "children_observer_user_id_fkey".to_string(),
        });
        assert!(matches!(err, DomainError::BadRequest(_)));
    }
}
