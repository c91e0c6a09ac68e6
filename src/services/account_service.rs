use crate::{
    auth::{AuthError, TokenIssuer, TokenKind, TokenPair, password},
    config::SuperuserConfig,
    db::entities::user,
    services::user_service::{NewAccount, UserService},
};

/// Password-based account flows: registration, login and the refresh
/// exchange.
#[derive(Clone)]
pub struct AccountService {
    users: UserService,
    tokens: TokenIssuer,
}

impl AccountService {
    pub fn new(users: UserService, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    pub async fn register(
        &self,
        account: NewAccount,
    ) -> Result<(user::Model, TokenPair), AuthError> {
        let user = self.users.register(account).await?;
        let tokens = self.tokens.issue_pair(user.id)?;
        Ok((user, tokens))
    }

    /// Any credential problem is reported as the same `Unauthorized`.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            password::verify_dummy(password);
            tracing::debug!("login for unknown email");
            return Err(AuthError::Unauthorized);
        };

        let Some(hash) = user.hashed_password.as_deref() else {
            password::verify_dummy(password);
            tracing::debug!(user_id = %user.id, "password login for oauth-only account");
            return Err(AuthError::Unauthorized);
        };

        if !password::verify_password(password, hash)? {
            tracing::debug!(user_id = %user.id, "wrong password");
            return Err(AuthError::Unauthorized);
        }

        if !user.is_active {
            tracing::debug!(user_id = %user.id, "login for inactive account");
            return Err(AuthError::Unauthorized);
        }

        self.users.record_login(&user.id).await?;
        tracing::info!(user_id = %user.id, "password login");
        self.tokens.issue_pair(user.id)
    }

    /// Mints a fresh access token. The presented refresh token is handed
    /// back unchanged.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let user_id = self.tokens.verify(refresh_token, TokenKind::Refresh)?;

        match self.users.find_by_id(&user_id).await? {
            Some(user) if user.is_active => {}
            _ => {
                tracing::debug!(%user_id, "refresh for missing or inactive user");
                return Err(AuthError::Unauthorized);
            }
        }

        Ok(TokenPair {
            access_token: self.tokens.issue(user_id, TokenKind::Access)?,
            refresh_token: refresh_token.to_string(),
            token_type: "Bearer".to_string(),
            expires_in: self.tokens.ttl(TokenKind::Access).num_seconds(),
        })
    }

    /// Creates the configured superuser unless an account with that email
    /// already exists.
    pub async fn seed_superuser(&self, cfg: &SuperuserConfig) -> Result<(), AuthError> {
        if let Some(existing) = self.users.find_by_email(&cfg.email).await? {
            tracing::info!(user_id = %existing.id, "superuser already present");
            return Ok(());
        }

        let user = self.users.create_superuser(&cfg.email, &cfg.password).await?;
        tracing::info!(user_id = %user.id, "seeded superuser");
        Ok(())
    }
}
