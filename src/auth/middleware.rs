use std::{
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{Request as HttpRequest, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use super::UserContext;
use crate::{error::AppError, state::AppState};

/// Runs the session gateway for the request and stores the resulting
/// `UserContext` in the request extensions.
pub async fn session_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(value) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        tracing::debug!("request without authorization header");
        return Err(AppError::unauthorized("Unauthorized"));
    };

    let ctx = state.gateway().authenticate_header(value).await?;
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

/// Extractor for the caller authenticated by `session_auth`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserContext);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::unauthorized("Unauthorized"))
    }
}

#[derive(Clone, Default)]
pub struct RequireSuperuserLayer;

impl RequireSuperuserLayer {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Clone)]
pub struct RequireSuperuser<S> {
    inner: S,
}

impl<S> Layer<S> for RequireSuperuserLayer {
    type Service = RequireSuperuser<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireSuperuser { inner }
    }
}

impl<S> Service<HttpRequest<Body>> for RequireSuperuser<S>
where
    S: Service<HttpRequest<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: HttpRequest<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(ctx) = req.extensions().get::<UserContext>() else {
                return Ok(AppError::unauthorized("Unauthorized").into_response());
            };

            if !ctx.is_superuser {
                tracing::debug!(user_id = %ctx.user_id, "superuser route denied");
                return Ok(AppError::forbidden("Superuser required").into_response());
            }

            inner.call(req).await
        })
    }
}
