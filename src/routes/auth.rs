use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::{Deserialize, Serialize};

use crate::{
    auth::TokenPair,
    db::entities::user,
    response::{ApiResult, JsonApiResponse},
    services::user_service::NewAccount,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: user::Model,
    pub tokens: TokenPair,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .with_state(state)
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewAccount>,
) -> ApiResult<RegisterResponse> {
    let (user, tokens) = state.services().account().register(body).await?;
    JsonApiResponse::with_status(
        StatusCode::CREATED,
        "registered",
        RegisterResponse { user, tokens },
    )
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<TokenPair> {
    let tokens = state
        .services()
        .account()
        .login(&body.email, &body.password)
        .await?;
    JsonApiResponse::ok(tokens)
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<TokenPair> {
    let tokens = state
        .services()
        .account()
        .refresh(&body.refresh_token)
        .await?;
    JsonApiResponse::ok(tokens)
}
