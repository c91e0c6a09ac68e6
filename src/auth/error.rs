use sea_orm::{DbErr, RuntimeErr, sqlx};

use crate::db::dao::DaoLayerError;

/// Failure categories of the identity core.
///
/// Token failures stay distinct here; the HTTP boundary collapses them into a
/// single unauthorized response.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("token kind mismatch")]
    WrongKind,
    #[error("unauthorized")]
    Unauthorized,
    #[error("oauth exchange failed: {0}")]
    OAuthExchangeFailed(String),
    #[error("email already registered")]
    DuplicateEmail,
    #[error("user not found")]
    UnknownUser,
    #[error("{0}")]
    InvalidInput(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn oauth(reason: impl Into<String>) -> Self {
        Self::OAuthExchangeFailed(reason.into())
    }

    /// True for every failure that means "this caller is not authenticated".
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken | Self::ExpiredToken | Self::WrongKind | Self::Unauthorized
        )
    }
}

impl From<DbErr> for AuthError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => Self::Unavailable(err.to_string()),
            DbErr::Query(RuntimeErr::SqlxError(ref inner))
            | DbErr::Exec(RuntimeErr::SqlxError(ref inner))
                if is_connection_loss(inner) =>
            {
                Self::Unavailable(err.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Pool and socket failures surface as query errors once a statement is sent.
fn is_connection_loss(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

impl From<DaoLayerError> for AuthError {
    fn from(err: DaoLayerError) -> Self {
        match err {
            DaoLayerError::Db(db) => db.into(),
            DaoLayerError::Duplicate { .. } => Self::DuplicateEmail,
            DaoLayerError::NotFound { .. } => Self::UnknownUser,
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbErr, RuntimeErr};
    use uuid::Uuid;

    use super::AuthError;
    use crate::db::dao::DaoLayerError;
    use crate::test_helpers::{connection_refused, unique_violation};

    #[test]
    fn token_failures_are_rejections() {
        assert!(AuthError::InvalidToken.is_rejection());
        assert!(AuthError::ExpiredToken.is_rejection());
        assert!(AuthError::WrongKind.is_rejection());
        assert!(AuthError::Unauthorized.is_rejection());
        assert!(!AuthError::DuplicateEmail.is_rejection());
        assert!(!AuthError::Unavailable("down".into()).is_rejection());
    }

    #[test]
    fn connection_errors_map_to_unavailable() {
        let err = AuthError::from(DbErr::Conn(RuntimeErr::Internal("refused".into())));
        assert!(matches!(err, AuthError::Unavailable(_)));
    }

    #[test]
    fn dropped_connection_during_query_maps_to_unavailable() {
        let err = AuthError::from(connection_refused());
        assert!(matches!(err, AuthError::Unavailable(_)));
    }

    #[test]
    fn constraint_errors_outside_the_dao_map_to_internal() {
        let err = AuthError::from(unique_violation("users_pkey"));
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[test]
    fn query_errors_map_to_internal() {
        let err = AuthError::from(DbErr::Custom("syntax".into()));
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[test]
    fn dao_errors_map_to_auth_categories() {
        assert_eq!(
            AuthError::from(DaoLayerError::Duplicate {
                entity: "users",
                field: "email"
            }),
            AuthError::DuplicateEmail
        );
        assert_eq!(
            AuthError::from(DaoLayerError::NotFound {
                entity: "users",
                id: Uuid::nil()
            }),
            AuthError::UnknownUser
        );
    }
}
