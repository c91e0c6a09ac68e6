use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    config::CorsConfig,
    middleware::{catch_panic_layer, json_error_middleware},
    state::AppState,
};

pub mod auth;
pub mod me;
pub mod oauth;
pub mod users;

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(auth::router(state.clone()))
        .merge(oauth::router(state.clone()))
        .merge(me::router(state.clone()))
        .merge(users::router(state.clone()));

    let prefix = state.config.general.api_prefix.trim_end_matches('/');
    let app = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(prefix, api)
    };

    app.layer(cors_layer(&state.config.cors))
        .layer(middleware::from_fn(json_error_middleware))
        .layer(catch_panic_layer())
}

fn cors_layer(cfg: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .all_cors_origins
        .iter()
        .filter(|origin| {
            let wildcard = origin.as_str() == "*";
            if wildcard {
                tracing::warn!("wildcard CORS origin is not allowed with credentials; ignoring");
            }
            !wildcard
        })
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
