use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use tower_http::trace::TraceLayer;

use identity_core::{
    config::AppConfig, db, logging::init_tracing, routes::router, state::AppState,
};

#[tokio::main]
async fn main() {
    // Tracing is configured from the loaded config, so a bad config can only
    // be reported on stderr.
    let cfg = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load config: {err:#}");
            std::process::exit(1);
        }
    };
    init_tracing(&cfg.logging);

    if let Err(err) = run(cfg).await {
        tracing::error!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let db = db::connect(&cfg.database).await?;
    let state = AppState::new(cfg, db);

    if let Some(superuser) = &state.config.superuser {
        state.services().account().seed_superuser(superuser).await?;
    }

    let app = Router::new()
        .merge(router(Arc::clone(&state)))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!(
        "{}:{}",
        state.config.general.host, state.config.general.port
    )
    .parse()?;
    tracing::info!(prefix = %state.config.general.api_prefix, "listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
