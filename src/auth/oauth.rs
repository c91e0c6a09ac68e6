//! Third-party login through an OAuth authorization-code exchange.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;

use super::{AuthError, TokenIssuer, TokenPair};
use crate::{
    config::GoogleConfig,
    db::entities::user,
    services::user_service::{UserService, normalize_email},
};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);
const GOOGLE_SCOPE: &str = "openid email profile";

/// Identity claims returned by the provider's userinfo endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderProfile {
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

impl ProviderProfile {
    /// The provider must hand back a well-formed email it has not flagged as
    /// unverified.
    fn verified_email(&self) -> Result<String, AuthError> {
        if self.email_verified == Some(false) {
            return Err(AuthError::oauth("provider reports the email as unverified"));
        }
        let email = self
            .email
            .as_deref()
            .ok_or_else(|| AuthError::oauth("provider profile has no email"))?;
        normalize_email(email).map_err(|_| AuthError::oauth("provider email is malformed"))
    }

    fn first_and_last_name(&self) -> (Option<&str>, Option<&str>) {
        if self.given_name.is_some() || self.family_name.is_some() {
            return (self.given_name.as_deref(), self.family_name.as_deref());
        }
        match self.name.as_deref().map(str::trim) {
            Some(full) => match full.split_once(' ') {
                Some((first, last)) => (Some(first), Some(last.trim())),
                None => (Some(full), None),
            },
            None => (None, None),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorization_url(&self) -> String;

    /// Trades an authorization code for the user's profile. Every failure is
    /// an `OAuthExchangeFailed`.
    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile, AuthError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct GoogleIdentityProvider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
    http_client: reqwest::Client,
}

impl GoogleIdentityProvider {
    pub fn new(cfg: &GoogleConfig) -> Self {
        Self {
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            redirect_uri: cfg.redirect_uri.clone(),
            auth_url: cfg.auth_url.clone(),
            token_url: cfg.token_url.clone(),
            userinfo_url: cfg.userinfo_url.clone(),
            http_client: reqwest::Client::new(),
        }
    }

    async fn fetch_access_token(&self, code: &str) -> Result<String, AuthError> {
        let response = self
            .http_client
            .post(&self.token_url)
            .timeout(PROVIDER_TIMEOUT)
            .form(&[
                ("code", code),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("redirect_uri", &self.redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|err| AuthError::oauth(format!("token request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::oauth(format!(
                "token endpoint answered {status}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| AuthError::oauth(format!("token response unreadable: {err}")))?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn authorization_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(GOOGLE_SCOPE),
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile, AuthError> {
        let access_token = self.fetch_access_token(code).await?;

        let response = self
            .http_client
            .get(&self.userinfo_url)
            .timeout(PROVIDER_TIMEOUT)
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|err| AuthError::oauth(format!("userinfo request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::oauth(format!(
                "userinfo endpoint answered {status}"
            )));
        }

        response
            .json::<ProviderProfile>()
            .await
            .map_err(|err| AuthError::oauth(format!("userinfo response unreadable: {err}")))
    }
}

#[derive(Debug, Clone)]
pub struct OAuthLogin {
    pub user: user::Model,
    pub tokens: TokenPair,
    /// True when this login created the account.
    pub created: bool,
}

#[derive(Clone)]
pub struct OAuthBridge {
    provider: Arc<dyn IdentityProvider>,
    users: UserService,
    tokens: TokenIssuer,
}

impl OAuthBridge {
    pub fn new(provider: Arc<dyn IdentityProvider>, users: UserService, tokens: TokenIssuer) -> Self {
        Self {
            provider,
            users,
            tokens,
        }
    }

    pub fn start(&self) -> String {
        self.provider.authorization_url()
    }

    pub async fn complete(&self, code: &str) -> Result<OAuthLogin, AuthError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::oauth("missing authorization code"));
        }

        let profile = self.provider.exchange_code(code).await?;
        let email = profile.verified_email()?;

        let (user, created) = match self.users.find_by_email(&email).await? {
            Some(user) => (user, false),
            None => {
                let (name, surname) = profile.first_and_last_name();
                match self.users.create_oauth_user(&email, name, surname).await {
                    Ok(user) => (user, true),
                    // Lost a race with a concurrent first login for the same email.
                    Err(AuthError::DuplicateEmail) => (
                        self.users
                            .find_by_email(&email)
                            .await?
                            .ok_or(AuthError::UnknownUser)?,
                        false,
                    ),
                    Err(err) => return Err(err),
                }
            }
        };

        if !user.is_active {
            tracing::debug!(user_id = %user.id, "oauth login for inactive user");
            return Err(AuthError::Unauthorized);
        }

        let user = self.users.record_login(&user.id).await?;
        let tokens = self.tokens.issue_pair(user.id)?;
        tracing::info!(user_id = %user.id, created, "oauth login");
        Ok(OAuthLogin {
            user,
            tokens,
            created,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_string_contains, header, method, path},
    };

    use super::{GoogleIdentityProvider, IdentityProvider, OAuthBridge, ProviderProfile};
    use crate::auth::{AuthError, TokenKind};
    use crate::config::GoogleConfig;
    use crate::db::dao::{DaoBase, UserDao};
    use crate::db::entities::user;
    use crate::services::user_service::UserService;
    use crate::test_helpers::{test_token_issuer, unique_violation, user_model};

    fn google_config(server: &MockServer) -> GoogleConfig {
        GoogleConfig {
            client_id: "client-123.apps.googleusercontent.com".to_string(),
            client_secret: "shh".to_string(),
            redirect_uri: "http://localhost:8000/api/auth/google/callback".to_string(),
            auth_url: format!("{}/o/oauth2/v2/auth", server.uri()),
            token_url: format!("{}/token", server.uri()),
            userinfo_url: format!("{}/userinfo", server.uri()),
        }
    }

    fn bridge(server: &MockServer, db: &DatabaseConnection) -> OAuthBridge {
        OAuthBridge::new(
            Arc::new(GoogleIdentityProvider::new(&google_config(server))),
            UserService::new(UserDao::new(db)),
            test_token_issuer(),
        )
    }

    async fn mount_token_ok(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("code=good-code"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.provider-token",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .mount(server)
            .await;
    }

    async fn mount_userinfo(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", "Bearer ya29.provider-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn authorization_url_carries_client_and_redirect() {
        let server = MockServer::start().await;
        let provider = GoogleIdentityProvider::new(&google_config(&server));

        let url = provider.authorization_url();
        assert!(url.starts_with(&format!("{}/o/oauth2/v2/auth?", server.uri())));
        assert!(url.contains("client_id=client-123.apps.googleusercontent.com"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8000%2Fapi%2Fauth%2Fgoogle%2Fcallback"
        ));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid%20email%20profile"));
    }

    #[tokio::test]
    async fn rejected_code_creates_no_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = bridge(&server, &db)
            .complete("stale-code")
            .await
            .expect_err("exchange should fail");
        assert!(matches!(err, AuthError::OAuthExchangeFailed(_)));
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn unverified_email_is_rejected() {
        let server = MockServer::start().await;
        mount_token_ok(&server).await;
        mount_userinfo(
            &server,
            json!({ "email": "eve@example.com", "email_verified": false }),
        )
        .await;
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = bridge(&server, &db)
            .complete("good-code")
            .await
            .expect_err("unverified email should fail");
        assert!(matches!(err, AuthError::OAuthExchangeFailed(_)));
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn missing_email_is_rejected() {
        let server = MockServer::start().await;
        mount_token_ok(&server).await;
        mount_userinfo(&server, json!({ "name": "No Email" })).await;
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = bridge(&server, &db)
            .complete("good-code")
            .await
            .expect_err("missing email should fail");
        assert!(matches!(err, AuthError::OAuthExchangeFailed(_)));
    }

    #[tokio::test]
    async fn first_login_creates_verified_user() {
        let server = MockServer::start().await;
        mount_token_ok(&server).await;
        mount_userinfo(
            &server,
            json!({
                "sub": "10769150350006150715113082367",
                "email": "Grace@Example.com",
                "email_verified": true,
                "name": "Grace Hopper",
                "given_name": "Grace",
                "family_name": "Hopper"
            }),
        )
        .await;

        let id = Uuid::new_v4();
        let mut created = user_model(id, "grace@example.com");
        created.hashed_password = None;
        created.is_verified = true;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[created.clone()]])
            .append_query_results([[created.clone()]])
            .append_query_results([[created]])
            .into_connection();
        let tokens = test_token_issuer();

        let login = bridge(&server, &db)
            .complete("good-code")
            .await
            .expect("login should succeed");
        assert!(login.created);
        assert!(login.user.is_verified);
        assert!(login.user.hashed_password.is_none());
        assert_eq!(
            tokens.verify(&login.tokens.access_token, TokenKind::Access),
            Ok(id)
        );
        assert_eq!(
            tokens.verify(&login.tokens.refresh_token, TokenKind::Refresh),
            Ok(id)
        );
    }

    #[tokio::test]
    async fn concurrent_first_login_reuses_winning_row() {
        let server = MockServer::start().await;
        mount_token_ok(&server).await;
        mount_userinfo(
            &server,
            json!({ "email": "ada@example.com", "email_verified": true }),
        )
        .await;

        let id = Uuid::new_v4();
        let mut winner = user_model(id, "ada@example.com");
        winner.hashed_password = None;
        winner.is_verified = true;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_errors([unique_violation("users_email_key")])
            .append_query_results([[winner.clone()]])
            .append_query_results([[winner.clone()]])
            .append_query_results([[winner]])
            .into_connection();

        let login = bridge(&server, &db)
            .complete("good-code")
            .await
            .expect("login should fall back to the existing row");
        assert!(!login.created);
        assert_eq!(login.user.id, id);
        assert_eq!(
            test_token_issuer().verify(&login.tokens.access_token, TokenKind::Access),
            Ok(id)
        );
    }

    #[tokio::test]
    async fn inactive_user_is_unauthorized() {
        let server = MockServer::start().await;
        mount_token_ok(&server).await;
        mount_userinfo(
            &server,
            json!({ "email": "mallory@example.com", "email_verified": true }),
        )
        .await;

        let mut existing = user_model(Uuid::new_v4(), "mallory@example.com");
        existing.is_active = false;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing]])
            .into_connection();

        let err = bridge(&server, &db)
            .complete("good-code")
            .await
            .expect_err("inactive user should be rejected");
        assert_eq!(err, AuthError::Unauthorized);
    }

    #[test]
    fn full_name_is_split_when_parts_are_absent() {
        let profile = ProviderProfile {
            name: Some("Grace Brewster Hopper".to_string()),
            ..Default::default()
        };
        assert_eq!(
            profile.first_and_last_name(),
            (Some("Grace"), Some("Brewster Hopper"))
        );
    }
}
