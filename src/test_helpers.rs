//! Fixtures shared by unit and router tests.

use std::{borrow::Cow, error::Error as StdError, sync::Arc};

use axum::Router;
use chrono::{DateTime, FixedOffset, TimeZone};
use sea_orm::{
    DatabaseConnection, DbErr, RuntimeErr,
    sqlx::{self, error::DatabaseError, error::ErrorKind},
};
use uuid::Uuid;

use crate::{
    auth::TokenIssuer, config::AppConfig, db::entities::user, routes::router, state::AppState,
};

pub fn test_config() -> AppConfig {
    AppConfig::default()
}

/// Issuer configured exactly like the one `test_router` uses.
pub fn test_token_issuer() -> TokenIssuer {
    TokenIssuer::from_config(&test_config().jwt)
}

pub fn test_router(db: DatabaseConnection) -> Router {
    let state = AppState::new(test_config(), db);
    router(Arc::clone(&state))
}

pub fn ts() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .and_then(|offset| offset.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single())
        .unwrap_or_default()
}

pub fn user_model(id: Uuid, email: &str) -> user::Model {
    let now = ts();
    user::Model {
        id,
        created_at: now,
        updated_at: now,
        name: Some("Test".to_string()),
        surname: Some("User".to_string()),
        email: email.to_string(),
        hashed_password: Some("$argon2id$placeholder".to_string()),
        is_verified: false,
        is_active: true,
        is_superuser: false,
        locale: "en".to_string(),
        timezone: "UTC".to_string(),
        last_login: None,
    }
}

/// Driver error shaped like Postgres' `23505 unique_violation`.
#[derive(Debug, thiserror::Error)]
#[error("duplicate key value violates unique constraint \"{constraint}\"")]
pub struct UniqueViolation {
    constraint: String,
}

impl DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint"
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed("23505"))
    }

    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }

    fn constraint(&self) -> Option<&str> {
        Some(&self.constraint)
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::UniqueViolation
    }
}

/// Insert failure as the pool reports a unique constraint hit.
pub fn unique_violation(constraint: &str) -> DbErr {
    let err = sqlx::Error::Database(Box::new(UniqueViolation {
        constraint: constraint.to_string(),
    }));
    DbErr::Query(RuntimeErr::SqlxError(Arc::new(err)))
}

/// Query failure as the pool reports a refused connection.
pub fn connection_refused() -> DbErr {
    let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
    DbErr::Query(RuntimeErr::SqlxError(Arc::new(sqlx::Error::Io(io))))
}
