//! Configuration for the record service.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;

use crate::error::Result;

/// Flat environment variables understood for compatibility with existing
/// deployments, mapped onto their configuration paths.
static LEGACY_ENV: [(&str, &str); 5] = [
    ("REDIS_HOST", "redis.host"),
    ("POSTGRES_HOST", "postgres.host"),
    ("POSTGRES_USER", "postgres.user"),
    ("POSTGRES_PASSWORD", "postgres.password"),
    ("POSTGRES_DB", "postgres.database"),
];

/// Service configuration.
#[derive(Debug, Default, Deserialize)]
pub struct RecordServiceConfig {
    /// Service network configuration.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Redis configuration.
    #[serde(default)]
    pub redis: RedisConfig,
    /// PostgreSQL configuration.
    #[serde(default)]
    pub postgres: PostgresConfig,
    /// Request log configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Service network configuration.
#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Redis configuration.
#[derive(Debug, Deserialize)]
pub struct RedisConfig {
    /// Redis host name.
    #[serde(default = "default_redis_host")]
    pub host: String,
    /// Redis port.
    #[serde(default = "default_redis_port")]
    pub port: u16,
}

/// PostgreSQL configuration.
///
/// Connection parameters have no defaults; unset values stay empty and
/// usually make the connection fail at startup.
#[derive(Debug, Deserialize)]
pub struct PostgresConfig {
    /// Database host.
    #[serde(default)]
    pub host: String,
    /// Database user.
    #[serde(default)]
    pub user: String,
    /// Database password.
    #[serde(default)]
    pub password: String,
    /// Database name.
    #[serde(default)]
    pub database: String,
    /// Database port.
    #[serde(default = "default_postgres_port")]
    pub port: u16,
    /// Maximum connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

/// Request log configuration.
#[derive(Debug, Deserialize)]
pub struct LogConfig {
    /// Directory holding the log file, created at startup if missing.
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
    /// Log file name inside `directory`.
    #[serde(default = "default_log_file")]
    pub file: String,
    /// Minimum level written to the file.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_redis_host(),
            port: default_redis_port(),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
            port: default_postgres_port(),
            max_connections: default_max_connections(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    50051
}

fn default_redis_host() -> String {
    "localhost".to_string()
}

const fn default_redis_port() -> u16 {
    6379
}

const fn default_postgres_port() -> u16 {
    5432
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_connect_timeout() -> u64 {
    30
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_file() -> String {
    "grpc-server.log".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServiceConfig {
    /// Socket address the listener binds to.
    ///
    /// # Errors
    ///
    /// Returns error if host and port do not form a valid socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

impl RedisConfig {
    /// Connection URL for database 0 without authentication.
    #[must_use]
    pub fn url(&self) -> String {
        format!("redis://{}:{}/0", self.host, self.port)
    }
}

impl PostgresConfig {
    /// Connection options with TLS disabled.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(PgSslMode::Disable)
    }

    /// Pool acquire timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl LogConfig {
    /// Full path of the log file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file)
    }

    /// Parsed minimum level; unrecognised values fall back to `info`.
    #[must_use]
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::INFO)
    }
}

impl RecordServiceConfig {
    /// Load configuration from files and environment.
    ///
    /// Later sources win: `config/default.toml`, `config/local.toml`,
    /// `RECORD_SERVICE_*` variables, then the flat `REDIS_HOST` and
    /// `POSTGRES_*` variables. Empty flat variables are ignored.
    ///
    /// # Errors
    ///
    /// Returns error if configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self> {
        let mut figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Toml::file("config/local.toml"))
            .merge(Env::prefixed("RECORD_SERVICE_").split("__"));

        for (path, value) in legacy_env() {
            figment = figment.merge(Serialized::default(path, value));
        }

        let config: Self = figment.extract()?;
        Ok(config)
    }
}

/// Load variables from a `.env` file without overriding ones already set.
///
/// A missing file is not an error.
///
/// # Errors
///
/// Returns error if the file exists but cannot be read or parsed.
pub fn load_env_file(path: &Path) -> Result<(), dotenvy::Error> {
    match dotenvy::from_path(path) {
        Err(e) if e.not_found() => Ok(()),
        other => other,
    }
}

fn legacy_env() -> impl Iterator<Item = (&'static str, String)> {
    LEGACY_ENV.iter().filter_map(|(var, path)| {
        std::env::var(var)
            .ok()
            .filter(|value| !value.is_empty())
            .map(|value| (*path, value))
    })
}
