pub mod error;
pub mod gateway;
pub mod middleware;
pub mod oauth;
pub mod password;
pub mod tokens;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::entities::user;

pub use error::AuthError;
pub use gateway::SessionGateway;
pub use oauth::{GoogleIdentityProvider, IdentityProvider, OAuthBridge, OAuthLogin, ProviderProfile};
pub use tokens::{Claims, TokenIssuer, TokenKind, TokenPair};

/// The authenticated caller, as handed to downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Uuid,
    pub email: String,
    pub is_superuser: bool,
    pub is_verified: bool,
}

impl From<&user::Model> for UserContext {
    fn from(user: &user::Model) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            is_superuser: user.is_superuser,
            is_verified: user.is_verified,
        }
    }
}
