use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    middleware,
    routing::post,
};
use uuid::Uuid;

use crate::{
    auth::middleware::{CurrentUser, RequireSuperuserLayer, session_auth},
    db::entities::user,
    error::AppError,
    response::{ApiResult, JsonApiResponse},
    state::AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users/{id}/deactivate", post(deactivate))
        .route("/users/{id}/activate", post(activate))
        .route("/users/{id}/verify", post(verify))
        .route_layer(RequireSuperuserLayer::new())
        .route_layer(middleware::from_fn_with_state(state.clone(), session_auth))
        .with_state(state)
}

async fn deactivate(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<user::Model> {
    if ctx.user_id == id {
        return Err(AppError::bad_request("Cannot deactivate your own account"));
    }
    let user = state.services().user().set_active(&id, false).await?;
    JsonApiResponse::ok(user)
}

async fn activate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<user::Model> {
    let user = state.services().user().set_active(&id, true).await?;
    JsonApiResponse::ok(user)
}

async fn verify(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<user::Model> {
    let user = state.services().user().mark_verified(&id).await?;
    JsonApiResponse::ok(user)
}
