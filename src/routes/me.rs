use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    middleware,
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    auth::{AuthError, middleware::{CurrentUser, session_auth}},
    db::entities::user,
    response::{ApiResult, JsonApiResponse},
    services::user_service::ProfileUpdate,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/me", get(profile).patch(update_profile))
        .route("/me/password", post(change_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), session_auth))
        .with_state(state)
}

async fn profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
) -> ApiResult<user::Model> {
    let user = state
        .services()
        .user()
        .find_by_id(&ctx.user_id)
        .await?
        .ok_or(AuthError::Unauthorized)?;
    JsonApiResponse::ok(user)
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
    Json(body): Json<ProfileUpdate>,
) -> ApiResult<user::Model> {
    let user = state
        .services()
        .user()
        .update_profile(&ctx.user_id, body)
        .await?;
    JsonApiResponse::ok(user)
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
    Json(body): Json<ChangePasswordRequest>,
) -> ApiResult<()> {
    state
        .services()
        .user()
        .change_password(
            &ctx.user_id,
            body.current_password.as_deref(),
            &body.new_password,
        )
        .await?;
    JsonApiResponse::with_status(axum::http::StatusCode::OK, "password changed", ())
}
