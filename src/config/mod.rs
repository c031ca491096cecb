use std::env;
use std::str::FromStr;
use std::time::Duration;

// Top-level configuration, one section per concern
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub booking: BookingConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout: Duration,
}

// Hall cache; disabled when REDIS_URL is not set
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: Option<String>,
    pub hall_ttl_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Upper bound on how long one booking transaction may run.
    pub commit_timeout: Duration,
    pub max_party_size: usize,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            commit_timeout: Duration::from_millis(2000),
            max_party_size: 20,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parsed("PORT", "8000")?,
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "seat_allocator=debug,tower_http=debug".to_string()),
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                pool_size: parsed("DB_POOL_SIZE", "20")?,
                acquire_timeout: Duration::from_secs(parsed("DB_ACQUIRE_TIMEOUT_SECONDS", "5")?),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
                hall_ttl_seconds: parsed("HALL_CACHE_TTL_SECONDS", "3600")?,
            },
            booking: BookingConfig {
                commit_timeout: Duration::from_millis(parsed("BOOKING_COMMIT_TIMEOUT_MS", "2000")?),
                max_party_size: parsed("BOOKING_MAX_PARTY_SIZE", "20")?,
            },
        })
    }
}
