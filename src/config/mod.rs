use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub api: ApiConfig,
    pub mirror: MirrorConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

// Настройки удалённого REST API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Учётка для фоновой синхронизации из бинарника. Библиотека её сама не читает.
    pub service_account: Option<ServiceAccount>,
}

#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

// Настройки локального зеркала (SQLite)
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки Circuit Breaker
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: 5, timeout_seconds: 60 }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            app: AppConfig {
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "ticket_client=debug,sqlx=warn".to_string()),
                log_format: parse_var("LOG_FORMAT", LogFormat::Pretty)?,
            },
            api: ApiConfig {
                base_url: env::var("API_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:3000/api".to_string()),
                timeout_seconds: parse_var("API_TIMEOUT_SECONDS", 30)?,
                service_account: service_account_from_env(),
            },
            mirror: MirrorConfig {
                url: env::var("MIRROR_DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://ticket_mirror.db".to_string()),
                pool_size: parse_var("MIRROR_POOL_SIZE", 4)?,
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: parse_var("CIRCUIT_BREAKER_FAILURE_THRESHOLD", 5)?,
                timeout_seconds: parse_var("CIRCUIT_BREAKER_TIMEOUT_SECONDS", 60)?,
            },
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

// Учётка нужна только целиком: email без пароля (или наоборот) считается отсутствием
fn service_account_from_env() -> Option<ServiceAccount> {
    let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.is_empty());
    Some(ServiceAccount {
        email: non_empty("API_EMAIL")?,
        password: non_empty("API_PASSWORD")?,
    })
}
