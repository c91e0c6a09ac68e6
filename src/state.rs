use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    auth::{GoogleIdentityProvider, IdentityProvider, OAuthBridge, SessionGateway, TokenIssuer},
    config::AppConfig,
    services::ServiceContext,
};

pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub tokens: TokenIssuer,
    pub identity_provider: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Arc<Self> {
        let provider = Arc::new(GoogleIdentityProvider::new(&config.google));
        Self::with_provider(config, db, provider)
    }

    pub fn with_provider(
        config: AppConfig,
        db: DatabaseConnection,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Arc<Self> {
        let tokens = TokenIssuer::from_config(&config.jwt);
        Arc::new(Self {
            config,
            db,
            tokens,
            identity_provider,
        })
    }

    pub fn services(&self) -> ServiceContext {
        ServiceContext::from_state(self)
    }

    pub fn gateway(&self) -> SessionGateway {
        SessionGateway::new(self.db.clone(), self.tokens.clone())
    }

    pub fn oauth(&self) -> OAuthBridge {
        OAuthBridge::new(
            Arc::clone(&self.identity_provider),
            self.services().user(),
            self.tokens.clone(),
        )
    }
}
