use sea_orm::DatabaseConnection;

use crate::{
    auth::TokenIssuer,
    db::dao::DaoContext,
    services::{account_service::AccountService, user_service::UserService},
    state::AppState,
};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
    tokens: TokenIssuer,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection, tokens: TokenIssuer) -> Self {
        Self {
            daos: DaoContext::new(db),
            tokens,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db, state.tokens.clone())
    }

    pub fn user(&self) -> UserService {
        UserService::new(self.daos.user())
    }

    pub fn account(&self) -> AccountService {
        AccountService::new(self.user(), self.tokens.clone())
    }
}
