use crate::auth::AuthError;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Unavailable(String),
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(message)
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Unavailable(message)
            | Self::Internal(message) => message.as_str(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::WrongKind
            | AuthError::Unauthorized => {
                tracing::debug!(reason = %err, "request rejected");
                AppError::unauthorized("Unauthorized")
            }
            AuthError::OAuthExchangeFailed(reason) => {
                tracing::warn!(%reason, "oauth exchange failed");
                AppError::bad_request("OAuth exchange failed")
            }
            AuthError::DuplicateEmail => AppError::conflict("Email already registered"),
            AuthError::UnknownUser => AppError::not_found("User not found"),
            AuthError::InvalidInput(message) => AppError::bad_request(message),
            AuthError::Unavailable(reason) => {
                tracing::error!(%reason, "backing service unavailable");
                AppError::unavailable("Service unavailable")
            }
            AuthError::Internal(reason) => {
                tracing::error!(%reason, "internal error");
                AppError::internal("Internal server error")
            }
        }
    }
}
