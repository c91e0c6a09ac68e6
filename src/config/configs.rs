use std::str::FromStr;

use anyhow::{Context, Result};
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

use super::{defaults, envconfig::EnvConfig, validate};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub jwt: JwtConfig,
    pub google: GoogleConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub superuser: Option<SuperuserConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        <Self as EnvConfig>::from_env()
    }
}

impl EnvConfig for AppConfig {
    fn finalize(mut self) -> Result<Self> {
        self.jwt.signing_algorithm = Algorithm::from_str(self.jwt.algorithm.trim())
            .with_context(|| format!("unknown jwt.algorithm '{}'", self.jwt.algorithm))?;
        self.cors.all_cors_origins = parse_cors(&self.cors.backend_cors_origins)?;
        self.database.uri = self.database.build_uri();
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        validate::validate(self)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub host: String,
    pub port: u16,
    pub api_prefix: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT as u16,
            api_prefix: defaults::DEFAULT_API_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub rust_log: String,
    /// `pretty` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log: defaults::DEFAULT_RUST_LOG.to_string(),
            format: defaults::DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct JwtConfig {
    pub secret_token: String,
    pub refresh_secret_token: String,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    #[serde(skip, default = "default_signing_algorithm")]
    pub signing_algorithm: Algorithm,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret_token: defaults::DEFAULT_SECRET_TOKEN.to_string(),
            refresh_secret_token: defaults::DEFAULT_REFRESH_SECRET_TOKEN.to_string(),
            algorithm: defaults::DEFAULT_ALGORITHM.to_string(),
            access_token_expire_minutes: defaults::DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
            refresh_token_expire_days: defaults::DEFAULT_REFRESH_TOKEN_EXPIRE_DAYS,
            signing_algorithm: default_signing_algorithm(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: defaults::DEFAULT_GOOGLE_CLIENT_ID.to_string(),
            client_secret: defaults::DEFAULT_GOOGLE_CLIENT_SECRET.to_string(),
            redirect_uri: defaults::DEFAULT_GOOGLE_REDIRECT_URI.to_string(),
            auth_url: defaults::GOOGLE_AUTH_URL.to_string(),
            token_url: defaults::GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: defaults::GOOGLE_USERINFO_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Comma separated list or JSON array of origins.
    pub backend_cors_origins: String,
    #[serde(skip)]
    pub all_cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db: String,
    pub max_connections: u32,
    pub min_idle: u32,
    #[serde(skip)]
    pub uri: String,
}

impl DatabaseConfig {
    pub fn build_uri(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.password),
            self.server,
            self.port,
            self.db
        )
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let mut cfg = Self {
            server: defaults::DEFAULT_POSTGRES_SERVER.to_string(),
            port: defaults::DEFAULT_POSTGRES_PORT as u16,
            user: defaults::DEFAULT_POSTGRES_USER.to_string(),
            password: defaults::DEFAULT_POSTGRES_PASSWORD.to_string(),
            db: defaults::DEFAULT_POSTGRES_DB.to_string(),
            max_connections: defaults::DEFAULT_DB_MAX_CONNECTIONS as u32,
            min_idle: defaults::DEFAULT_DB_MIN_IDLE as u32,
            uri: String::new(),
        };
        cfg.uri = cfg.build_uri();
        cfg
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SuperuserConfig {
    pub email: String,
    pub password: String,
}

fn default_signing_algorithm() -> Algorithm {
    Algorithm::HS256
}

fn parse_cors(raw: &str) -> Result<Vec<String>> {
    let raw = raw.trim();
    let origins: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str(raw).context("cors.backend_cors_origins is not a JSON array")?
    } else {
        raw.split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    };

    Ok(origins
        .into_iter()
        .map(|origin| origin.trim_end_matches('/').to_string())
        .collect())
}
