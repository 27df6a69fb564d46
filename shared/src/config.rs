use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

/// Connection parameters for the key-value store.
#[derive(Clone, Debug)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub response_timeout: Duration,
    pub connection_timeout: Duration,
}

impl RedisSettings {
    // Capped exponential backoff: min(factor * base^n, max) milliseconds
    pub const RETRY_FACTOR_MS: u64 = 50;
    pub const RETRY_EXPONENT_BASE: u64 = 2;
    pub const RETRY_MAX_DELAY_MS: u64 = 2000;
    pub const MAX_RETRIES: usize = 3;

    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            response_timeout: Duration::from_millis(2000),
            connection_timeout: Duration::from_millis(2000),
        }
    }
}

pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub environment: Environment,
    pub data_dir: String,
    pub cache_backend: CacheBackend,
    pub cache_ttl_secs: u64,
    pub redis: RedisSettings,
    /// Seed administrator, created at startup when both are set
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_HTTP_PORT: u16 = 5000;
    const DEFAULT_DATA_DIR: &str = "./data";
    const DEFAULT_CACHE_TTL_SECS: u64 = 300;

    pub fn from_env() -> Self {
        let defaults = RedisSettings::default();

        let environment = match std::env::var("ARBOR_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        };

        let cache_backend = match std::env::var("ARBOR_CACHE_BACKEND")
            .unwrap_or_else(|_| "redis".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => CacheBackend::Memory,
            "redis" => CacheBackend::Redis,
            other => {
                warn!("Unknown ARBOR_CACHE_BACKEND '{}', falling back to redis", other);
                CacheBackend::Redis
            }
        };

        Self {
            host: std::env::var("ARBOR_HOST").unwrap_or_else(|_| Self::DEFAULT_HOST.to_string()),
            http_port: parse_env("ARBOR_HTTP_PORT", Self::DEFAULT_HTTP_PORT),
            environment,
            data_dir: std::env::var("ARBOR_DATA_DIR")
                .unwrap_or_else(|_| Self::DEFAULT_DATA_DIR.to_string()),
            cache_backend,
            cache_ttl_secs: parse_env("ARBOR_CACHE_TTL_SECS", Self::DEFAULT_CACHE_TTL_SECS),
            redis: RedisSettings {
                host: std::env::var("REDIS_HOST").unwrap_or(defaults.host),
                port: parse_env("REDIS_PORT", defaults.port),
                response_timeout: Duration::from_millis(parse_env(
                    "REDIS_RESPONSE_TIMEOUT_MS",
                    defaults.response_timeout.as_millis() as u64,
                )),
                connection_timeout: Duration::from_millis(parse_env(
                    "REDIS_CONNECT_TIMEOUT_MS",
                    defaults.connection_timeout.as_millis() as u64,
                )),
            },
            admin_email: non_empty_env("ARBOR_ADMIN_EMAIL"),
            admin_password: non_empty_env("ARBOR_ADMIN_PASSWORD"),
        }
    }

    /// Development mode exposes stack traces in error responses.
    pub fn debug_mode(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_url() {
        let settings = RedisSettings {
            host: "cache.internal".to_string(),
            port: 6380,
            ..RedisSettings::default()
        };
        assert_eq!(settings.url(), "redis://cache.internal:6380/");
    }

    #[test]
    fn test_parse_env_falls_back_on_garbage() {
        // SAFETY: test-local variable name, not read concurrently elsewhere
        unsafe { std::env::set_var("ARBOR_TEST_PARSE_ENV_PORT", "not-a-port") };
        assert_eq!(parse_env("ARBOR_TEST_PARSE_ENV_PORT", 42u16), 42);

        unsafe { std::env::set_var("ARBOR_TEST_PARSE_ENV_PORT", " 8081 ") };
        assert_eq!(parse_env("ARBOR_TEST_PARSE_ENV_PORT", 42u16), 8081);

        unsafe { std::env::remove_var("ARBOR_TEST_PARSE_ENV_PORT") };
        assert_eq!(parse_env("ARBOR_TEST_PARSE_ENV_PORT", 42u16), 42);
    }
}
