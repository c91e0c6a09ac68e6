pub mod configs;
pub mod defaults;
pub mod envconfig;
pub mod validate;

pub use configs::{
    AppConfig, CorsConfig, DatabaseConfig, GeneralConfig, GoogleConfig, JwtConfig, LoggingConfig,
    SuperuserConfig,
};
pub use envconfig::EnvConfig;
