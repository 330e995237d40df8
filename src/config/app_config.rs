use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;

use crate::infrastructure::auth::JwtConfig;
use crate::infrastructure::observability::ObservabilityConfig;
use crate::infrastructure::rate_limit::RateLimitConfig;
use crate::infrastructure::storage::{PostgresConfig, StorageConfig, StorageType};
use crate::infrastructure::user::HashingConfig;

/// Environment variables honoured when the `APP__` form is not set
const LEGACY_ENV: &[(&str, &str, &str)] = &[
    ("JWT_SECRET", "APP__AUTH__JWT_SECRET", "auth.jwt_secret"),
    ("DATABASE_URL", "APP__STORAGE__DATABASE_URL", "storage.database_url"),
    ("PORT", "APP__SERVER__PORT", "server.port"),
];

/// Longest accepted session lifetime
pub const MAX_TOKEN_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Credential store settings
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// `memory` or `postgres`
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Apply pending migrations at startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for session tokens; required to serve
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: u64,
    #[serde(default)]
    pub hashing: HashingConfig,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "jwt_secret",
                &self.jwt_secret.as_ref().map(|_| "[hidden]"),
            )
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("hashing", &self.hashing)
            .finish()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_level() -> String {
    "info".to_string()
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_token_ttl_seconds() -> u64 {
    3600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            database_url: None,
            max_connections: default_max_connections(),
            run_migrations: default_true(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_seconds: default_token_ttl_seconds(),
            hashing: HashingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `config/default`, `config/local` and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(std::env::vars().collect())
    }

    /// Load with an explicit environment map instead of the process environment
    pub fn load_with_env(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            );

        for (legacy, app_key, path) in LEGACY_ENV {
            if vars.contains_key(*app_key) {
                continue;
            }

            let value = vars.get(*legacy).filter(|v| !v.is_empty()).cloned();
            builder = builder.set_override_option(*path, value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.auth.jwt_secret.as_deref() {
            None | Some("") => {
                return Err(ConfigError::Message(
                    "auth.jwt_secret is required (set APP__AUTH__JWT_SECRET or JWT_SECRET)"
                        .to_string(),
                ))
            }
            Some(_) => {}
        }

        if self.auth.token_ttl_seconds == 0 {
            return Err(ConfigError::Message(
                "auth.token_ttl_seconds must be greater than zero".to_string(),
            ));
        }

        if self.auth.token_ttl_seconds > MAX_TOKEN_TTL_SECONDS {
            return Err(ConfigError::Message(format!(
                "auth.token_ttl_seconds must be at most {} (one year)",
                MAX_TOKEN_TTL_SECONDS
            )));
        }

        if self.rate_limit.enabled
            && (self.rate_limit.window_seconds == 0 || self.rate_limit.max_requests == 0)
        {
            return Err(ConfigError::Message(
                "rate_limit.window_seconds and rate_limit.max_requests must be greater than zero"
                    .to_string(),
            ));
        }

        self.observability.validate().map_err(ConfigError::Message)?;

        self.storage_config().map(|_| ())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.server.host.parse::<IpAddr>().map_err(|e| {
            ConfigError::Message(format!("Invalid server.host '{}': {}", self.server.host, e))
        })?;

        Ok(SocketAddr::from((ip, self.server.port)))
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.auth.token_ttl_seconds)
    }

    pub fn jwt_config(&self) -> Result<JwtConfig, ConfigError> {
        let secret = self
            .auth
            .jwt_secret
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::Message("auth.jwt_secret is required".to_string()))?;

        Ok(JwtConfig::new(secret, self.token_ttl()))
    }

    /// Resolve the storage section into a backend configuration
    pub fn storage_config(&self) -> Result<StorageConfig, ConfigError> {
        let backend = self
            .storage
            .backend
            .parse::<StorageType>()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        match backend {
            StorageType::InMemory => Ok(StorageConfig::InMemory),
            StorageType::Postgres => {
                let url = self
                    .storage
                    .database_url
                    .clone()
                    .filter(|u| !u.is_empty())
                    .ok_or_else(|| {
                        ConfigError::Message(
                            "storage.database_url is required for the postgres backend"
                                .to_string(),
                        )
                    })?;

                Ok(StorageConfig::Postgres {
                    config: PostgresConfig::new(url)
                        .with_max_connections(self.storage.max_connections),
                    run_migrations: self.storage.run_migrations,
                })
            }
        }
    }
}
