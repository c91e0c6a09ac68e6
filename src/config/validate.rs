use anyhow::{Result, bail};
use jsonwebtoken::Algorithm;

use super::{AppConfig, defaults};

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if !cfg.general.api_prefix.starts_with('/') {
        errors.push("general.api_prefix must start with '/'".to_string());
    }

    if !matches!(cfg.logging.format.as_str(), "pretty" | "json") {
        errors.push(format!(
            "logging.format must be 'pretty' or 'json' (got '{}')",
            cfg.logging.format
        ));
    }

    let jwt = &cfg.jwt;
    if jwt.secret_token.trim().is_empty() {
        errors.push("jwt.secret_token must not be empty".to_string());
    }

    if jwt.refresh_secret_token.trim().is_empty() {
        errors.push("jwt.refresh_secret_token must not be empty".to_string());
    }

    if jwt.secret_token == jwt.refresh_secret_token {
        errors.push("jwt.secret_token and jwt.refresh_secret_token must differ".to_string());
    }

    if !cfg!(debug_assertions)
        && (jwt.secret_token == defaults::DEFAULT_SECRET_TOKEN
            || jwt.refresh_secret_token == defaults::DEFAULT_REFRESH_SECRET_TOKEN)
    {
        errors.push("jwt secrets must be set in release builds".to_string());
    }

    if !matches!(
        jwt.signing_algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    ) {
        errors.push(format!(
            "jwt.algorithm must be one of HS256, HS384, HS512 (got '{}')",
            jwt.algorithm
        ));
    }

    if !(1..=defaults::MAX_ACCESS_TOKEN_EXPIRE_MINUTES).contains(&jwt.access_token_expire_minutes)
    {
        errors.push(format!(
            "jwt.access_token_expire_minutes must be between 1 and {} (got {})",
            defaults::MAX_ACCESS_TOKEN_EXPIRE_MINUTES,
            jwt.access_token_expire_minutes
        ));
    }

    if !(1..=defaults::MAX_REFRESH_TOKEN_EXPIRE_DAYS).contains(&jwt.refresh_token_expire_days) {
        errors.push(format!(
            "jwt.refresh_token_expire_days must be between 1 and {} (got {})",
            defaults::MAX_REFRESH_TOKEN_EXPIRE_DAYS,
            jwt.refresh_token_expire_days
        ));
    }

    if cfg.google.client_id.trim().is_empty() {
        errors.push("google.client_id must not be empty".to_string());
    }

    if cfg.google.redirect_uri.trim().is_empty() {
        errors.push("google.redirect_uri must not be empty".to_string());
    }

    let database = &cfg.database;
    if database.server.trim().is_empty() {
        errors.push("database.server must not be empty".to_string());
    }

    if database.db.trim().is_empty() {
        errors.push("database.db must not be empty".to_string());
    }

    if database.min_idle > database.max_connections {
        errors.push(format!(
            "database.min_idle ({}) must be <= database.max_connections ({})",
            database.min_idle, database.max_connections
        ));
    }

    if let Some(superuser) = cfg.superuser.as_ref() {
        if superuser.email.trim().is_empty() {
            errors.push("superuser.email must not be empty".to_string());
        }

        if superuser.password.len() < 8 {
            errors.push("superuser.password must be at least 8 characters".to_string());
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}
