//! Server configuration: host/port, the SQLite database path, CORS, and
//! logging, loaded from environment variables with `GAZETTEER_` prefix.

use serde::{Deserialize, Serialize};

/// Main server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Path to the SQLite database file backing the pipeline.
    pub db_path: String,
    /// Whether `/compare` should invoke the LLM judge tiebreak by default
    /// when the request body omits `use_llm`.
    pub default_use_llm: bool,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allow any origin (development only).
    pub allow_any_origin: bool,
    /// List of allowed origins when `allow_any_origin` is false.
    pub allowed_origins: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format (json, pretty, compact).
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            db_path: "gazetteer.sqlite".to_string(),
            default_use_llm: false,
            cors: CorsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_any_origin: false,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables (`GAZETTEER__*`) layered
    /// over the defaults above.
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&ServerConfig::default())?)
            .add_source(config::Environment::with_prefix("GAZETTEER").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be greater than 0".to_string());
        }
        if self.db_path.is_empty() {
            return Err("db_path must not be empty".to_string());
        }
        Ok(())
    }
}
