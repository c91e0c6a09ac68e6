use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    response::Redirect,
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{AuthError, TokenPair},
    db::entities::user,
    response::{ApiResult, JsonApiResponse},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    /// Set by the provider when the user denies consent.
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OAuthLoginResponse {
    pub user: user::Model,
    pub tokens: TokenPair,
    pub created: bool,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/google", get(start))
        .route("/auth/google/callback", get(callback))
        .with_state(state)
}

async fn start(State(state): State<Arc<AppState>>) -> Redirect {
    Redirect::temporary(&state.oauth().start())
}

async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<OAuthLoginResponse> {
    if let Some(error) = params.error {
        return Err(AuthError::oauth(format!("provider returned error: {error}")).into());
    }
    let code = params
        .code
        .ok_or_else(|| AuthError::oauth("callback without code"))?;

    let login = state.oauth().complete(&code).await?;
    JsonApiResponse::ok(OAuthLoginResponse {
        user: login.user,
        tokens: login.tokens,
        created: login.created,
    })
}
