pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: i64 = 8000;
pub const DEFAULT_API_PREFIX: &str = "/api";
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_LOG_FORMAT: &str = "pretty";

pub const DEFAULT_SECRET_TOKEN: &str = "your_secret_token_here";
pub const DEFAULT_REFRESH_SECRET_TOKEN: &str = "your_refresh_secret_token_here";
pub const DEFAULT_ALGORITHM: &str = "HS256";
pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;
pub const DEFAULT_REFRESH_TOKEN_EXPIRE_DAYS: i64 = 7;
pub const MAX_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 60 * 24 * 365;
pub const MAX_REFRESH_TOKEN_EXPIRE_DAYS: i64 = 365 * 10;

pub const DEFAULT_GOOGLE_CLIENT_ID: &str = "YOUR_GOOGLE_CLIENT_ID.apps.googleusercontent.com";
pub const DEFAULT_GOOGLE_CLIENT_SECRET: &str = "YOUR_GOOGLE_CLIENT_SECRET";
pub const DEFAULT_GOOGLE_REDIRECT_URI: &str = "http://localhost:8000/api/auth/google/callback";
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

pub const DEFAULT_POSTGRES_SERVER: &str = "localhost";
pub const DEFAULT_POSTGRES_PORT: i64 = 5432;
pub const DEFAULT_POSTGRES_USER: &str = "postgres";
pub const DEFAULT_POSTGRES_PASSWORD: &str = "postgres";
pub const DEFAULT_POSTGRES_DB: &str = "hacklathon_db";
pub const DEFAULT_DB_MAX_CONNECTIONS: i64 = 10;
pub const DEFAULT_DB_MIN_IDLE: i64 = 2;
