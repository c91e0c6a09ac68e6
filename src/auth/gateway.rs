use sea_orm::DatabaseConnection;

use super::{AuthError, TokenIssuer, TokenKind, UserContext};
use crate::db::{ScopedSession, dao::UserDao};

/// Turns a presented bearer token into an authenticated `UserContext`.
///
/// Every token or account problem comes back as `Unauthorized`; only a
/// database failure is reported differently (`Unavailable`/`Internal`).
#[derive(Clone)]
pub struct SessionGateway {
    db: DatabaseConnection,
    tokens: TokenIssuer,
}

impl SessionGateway {
    pub fn new(db: DatabaseConnection, tokens: TokenIssuer) -> Self {
        Self { db, tokens }
    }

    pub async fn authenticate(&self, bearer_token: &str) -> Result<UserContext, AuthError> {
        let user_id = self
            .tokens
            .verify(bearer_token, TokenKind::Access)
            .map_err(|err| {
                tracing::debug!(reason = %err, "bearer token rejected");
                AuthError::Unauthorized
            })?;

        let session = ScopedSession::acquire(&self.db).await?;
        let user = UserDao::find_by_id_on(session.conn(), user_id).await?;
        session.release().await?;

        match user {
            Some(user) if user.is_active => Ok(UserContext::from(&user)),
            Some(_) => {
                tracing::debug!(%user_id, "token subject is inactive");
                Err(AuthError::Unauthorized)
            }
            None => {
                tracing::debug!(%user_id, "token subject no longer exists");
                Err(AuthError::Unauthorized)
            }
        }
    }

    /// Accepts an `Authorization` header value of the form `Bearer <token>`.
    pub async fn authenticate_header(&self, value: &str) -> Result<UserContext, AuthError> {
        let token = bearer_token(value).ok_or(AuthError::Unauthorized)?;
        self.authenticate(token).await
    }
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, RuntimeErr};
    use uuid::Uuid;

    use super::{SessionGateway, bearer_token};
    use crate::auth::{AuthError, TokenKind};
    use crate::db::entities::user;
    use crate::test_helpers::{connection_refused, test_token_issuer, user_model};

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("BEARER  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer   "), None);
    }

    #[tokio::test]
    async fn active_user_is_authenticated() {
        let id = Uuid::new_v4();
        let mut row = user_model(id, "ada@example.com");
        row.is_superuser = true;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[row]])
            .into_connection();
        let tokens = test_token_issuer();
        let token = tokens.issue(id, TokenKind::Access).expect("issue");

        let ctx = SessionGateway::new(db, tokens)
            .authenticate_header(&format!("Bearer {token}"))
            .await
            .expect("should authenticate");
        assert_eq!(ctx.user_id, id);
        assert_eq!(ctx.email, "ada@example.com");
        assert!(ctx.is_superuser);
    }

    #[tokio::test]
    async fn inactive_user_is_unauthorized() {
        let id = Uuid::new_v4();
        let mut row = user_model(id, "ada@example.com");
        row.is_active = false;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[row]])
            .into_connection();
        let tokens = test_token_issuer();
        let token = tokens.issue(id, TokenKind::Access).expect("issue");

        let err = SessionGateway::new(db, tokens)
            .authenticate(&token)
            .await
            .expect_err("inactive user should be rejected");
        assert_eq!(err, AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let tokens = test_token_issuer();
        let token = tokens.issue(Uuid::new_v4(), TokenKind::Access).expect("issue");

        let err = SessionGateway::new(db, tokens)
            .authenticate(&token)
            .await
            .expect_err("unknown subject should be rejected");
        assert_eq!(err, AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn refresh_token_never_opens_a_session() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let tokens = test_token_issuer();
        let token = tokens
            .issue(Uuid::new_v4(), TokenKind::Refresh)
            .expect("issue");

        let err = SessionGateway::new(db.clone(), tokens)
            .authenticate(&token)
            .await
            .expect_err("refresh token must not authenticate");
        assert_eq!(err, AuthError::Unauthorized);
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let gateway = SessionGateway::new(db, test_token_issuer());

        assert_eq!(
            gateway.authenticate("definitely-not-a-jwt").await,
            Err(AuthError::Unauthorized)
        );
        assert_eq!(
            gateway.authenticate_header("Token abc").await,
            Err(AuthError::Unauthorized)
        );
    }

    #[tokio::test]
    async fn database_failure_is_not_a_rejection() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Conn(RuntimeErr::Internal(
                "connection refused".to_string(),
            ))])
            .into_connection();
        let tokens = test_token_issuer();
        let token = tokens.issue(Uuid::new_v4(), TokenKind::Access).expect("issue");

        let err = SessionGateway::new(db, tokens)
            .authenticate(&token)
            .await
            .expect_err("db failure should surface");
        assert!(!err.is_rejection());
        assert!(matches!(err, AuthError::Unavailable(_)));
    }

    #[tokio::test]
    async fn lost_connection_mid_query_is_unavailable() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([connection_refused()])
            .into_connection();
        let tokens = test_token_issuer();
        let token = tokens.issue(Uuid::new_v4(), TokenKind::Access).expect("issue");

        let err = SessionGateway::new(db, tokens)
            .authenticate(&token)
            .await
            .expect_err("db failure should surface");
        assert!(matches!(err, AuthError::Unavailable(_)));
    }
}
