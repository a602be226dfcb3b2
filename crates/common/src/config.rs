//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Question listing and view-counting policy.
    #[serde(default)]
    pub questions: QuestionsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a new connection to be established.
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

/// Question policy values.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionsConfig {
    /// Window in which repeated views by the same user count once.
    #[serde(default = "default_view_dedup_window_secs")]
    pub view_dedup_window_secs: i64,
    /// Page size used when a list request omits `limit`.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    /// Upper bound for any list request.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    /// Maximum number of tags on a question.
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
}

impl Default for QuestionsConfig {
    fn default() -> Self {
        Self {
            view_dedup_window_secs: default_view_dedup_window_secs(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_tags: default_max_tags(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_view_dedup_window_secs() -> i64 {
    60
}

const fn default_page_size() -> u64 {
    10
}

const fn default_max_page_size() -> u64 {
    50
}

const fn default_max_tags() -> usize {
    5
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `STACKIT_ENV`)
    /// 3. Environment variables with `STACKIT_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("STACKIT_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("STACKIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("STACKIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = from_toml(
            r#"
            [server]
            [database]
            url = "postgres://localhost/stackit"
            "#,
        );

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 100);
        assert_eq!(config.database.acquire_timeout_secs, 10);
        assert_eq!(config.questions.view_dedup_window_secs, 60);
        assert_eq!(config.questions.max_page_size, 50);
        assert_eq!(config.questions.max_tags, 5);
    }

    #[test]
    fn test_view_window_overridable() {
        let config = from_toml(
            r#"
            [server]
            port = 8080
            [database]
            url = "postgres://localhost/stackit"
            [questions]
            view_dedup_window_secs = 300
            "#,
        );

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.questions.view_dedup_window_secs, 300);
        assert_eq!(config.questions.default_page_size, 10);
    }
}
