//! API server configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use membergraph_shared_config::{
    get_env_or_default, parse_env, CommonConfig, ConfigError, DatabaseConfig, Environment,
};

/// Which [`Store`](crate::store::Store) implementation backs the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// In-process tables, lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

/// When the whole dataset is fetched up front for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreloadMode {
    Never,
    Always,
    /// Decide per request from the shape of the query document
    #[default]
    Auto,
}

impl FromStr for PreloadMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "never" | "off" => Ok(Self::Never),
            "always" | "on" => Ok(Self::Always),
            "auto" => Ok(Self::Auto),
            _ => Err(()),
        }
    }
}

/// What a root list field answers when its read fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFieldFallback {
    /// Surface the failure as a field error
    #[default]
    Error,
    /// Log the failure and answer an empty list
    Empty,
}

impl FromStr for ListFieldFallback {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "empty" => Ok(Self::Empty),
            _ => Err(()),
        }
    }
}

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with other services
    pub common: CommonConfig,

    /// Server port (default: 8080)
    pub port: u16,

    /// Store implementation (default: postgres)
    pub store_backend: StoreBackend,

    /// Preload policy (default: auto)
    pub preload_mode: PreloadMode,

    /// Distinct root list fields that make `auto` preload (default: 2)
    pub preload_min_list_fields: usize,

    /// Batch collection window in milliseconds (default: 1)
    pub loader_batch_delay_ms: u64,

    /// Keys per store call before a batch is split (default: 1000)
    pub loader_max_batch_size: usize,

    /// Maximum query depth (default: 5)
    pub max_query_depth: usize,

    /// Root list field failure policy (default: error)
    pub list_field_fallback: ListFieldFallback,

    /// CORS allowed origins (optional)
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// In production mode with the postgres backend, `DATABASE_URL` must be
    /// set explicitly. In development/staging mode, sensible defaults are
    /// used for convenience.
    pub fn from_env() -> Result<Self> {
        let environment = Environment::from_str(&get_env_or_default("ENVIRONMENT", "development"))
            .unwrap_or_default();

        let store_backend = parse_choice("STORE_BACKEND", StoreBackend::default(), "postgres, memory")?;

        if environment.is_production() && store_backend == StoreBackend::Postgres {
            Self::validate_database_url()?;
        }

        let common = CommonConfig::from_env().context("Failed to load common config")?;

        let config = Self {
            common,
            port: parse_env("PORT", 8080).context("Invalid PORT value")?,
            store_backend,
            preload_mode: parse_choice("PRELOAD_MODE", PreloadMode::default(), "never, always, auto")?,
            preload_min_list_fields: parse_env("PRELOAD_MIN_LIST_FIELDS", 2)?,
            loader_batch_delay_ms: parse_env("LOADER_BATCH_DELAY_MS", 1)?,
            loader_max_batch_size: parse_env("LOADER_MAX_BATCH_SIZE", 1000)?,
            max_query_depth: parse_env("MAX_QUERY_DEPTH", 5)?,
            list_field_fallback: parse_choice(
                "LIST_FIELD_FALLBACK",
                ListFieldFallback::default(),
                "error, empty",
            )?,
            cors_allowed_origins: env::var("CORS_ORIGINS").ok().map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.loader_max_batch_size == 0 {
            bail!("LOADER_MAX_BATCH_SIZE must be at least 1");
        }
        if self.max_query_depth == 0 {
            bail!("MAX_QUERY_DEPTH must be at least 1");
        }
        if self.preload_min_list_fields == 0 {
            bail!("PRELOAD_MIN_LIST_FIELDS must be at least 1; use PRELOAD_MODE=always instead");
        }
        Ok(())
    }

    /// Validate that DATABASE_URL is explicitly set in production
    fn validate_database_url() -> Result<()> {
        match env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => Ok(()),
            _ => {
                bail!(
                    "DATABASE_URL environment variable is required in production. \
                     Please set your PostgreSQL connection string or use STORE_BACKEND=memory."
                );
            }
        }
    }

    /// Batch collection window for the per-request loaders
    pub fn loader_delay(&self) -> Duration {
        Duration::from_millis(self.loader_batch_delay_ms)
    }

    /// Get database configuration
    pub fn database(&self) -> &DatabaseConfig {
        &self.common.database
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}

impl Default for Config {
    /// Development settings over the in-memory store
    fn default() -> Self {
        Self {
            common: CommonConfig {
                database: DatabaseConfig::default(),
                environment: Environment::Development,
                log_level: "info".to_string(),
            },
            port: 8080,
            store_backend: StoreBackend::Memory,
            preload_mode: PreloadMode::Auto,
            preload_min_list_fields: 2,
            loader_batch_delay_ms: 1,
            loader_max_batch_size: 1000,
            max_query_depth: 5,
            list_field_fallback: ListFieldFallback::Error,
            cors_allowed_origins: None,
        }
    }
}

/// Parse a variable restricted to a fixed set of values
fn parse_choice<T: FromStr>(name: &str, default: T, expected: &'static str) -> Result<T> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => value.parse().map_err(|_| {
            ConfigError::UnknownChoice {
                name: name.to_string(),
                value,
                expected,
            }
            .into()
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const API_VARS: [&str; 10] = [
        "ENVIRONMENT",
        "DATABASE_URL",
        "STORE_BACKEND",
        "PORT",
        "PRELOAD_MODE",
        "PRELOAD_MIN_LIST_FIELDS",
        "LOADER_BATCH_DELAY_MS",
        "LOADER_MAX_BATCH_SIZE",
        "MAX_QUERY_DEPTH",
        "LIST_FIELD_FALLBACK",
    ];

    fn with_clean_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let mut all: Vec<(&str, Option<&str>)> = API_VARS.iter().map(|k| (*k, None)).collect();
        for &(k, v) in vars {
            all.retain(|(name, _)| *name != k);
            all.push((k, Some(v)));
        }
        temp_env::with_vars(all, f);
    }

    #[test]
    fn test_defaults() {
        with_clean_env(&[], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.port, 8080);
            assert_eq!(config.store_backend, StoreBackend::Postgres);
            assert_eq!(config.preload_mode, PreloadMode::Auto);
            assert_eq!(config.preload_min_list_fields, 2);
            assert_eq!(config.loader_delay(), Duration::from_millis(1));
            assert_eq!(config.loader_max_batch_size, 1000);
            assert_eq!(config.max_query_depth, 5);
            assert_eq!(config.list_field_fallback, ListFieldFallback::Error);
        });
    }

    #[test]
    fn test_database_url_required_in_production() {
        with_clean_env(&[("ENVIRONMENT", "production")], || {
            let err = Config::from_env().unwrap_err().to_string();
            assert!(err.contains("DATABASE_URL"));
            assert!(err.contains("required in production"));
        });
    }

    #[test]
    fn test_memory_backend_needs_no_database_in_production() {
        with_clean_env(
            &[("ENVIRONMENT", "production"), ("STORE_BACKEND", "memory")],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.store_backend, StoreBackend::Memory);
                assert!(config.is_production());
            },
        );
    }

    #[test]
    fn test_unknown_preload_mode_rejected() {
        with_clean_env(&[("PRELOAD_MODE", "sometimes")], || {
            let err = Config::from_env().unwrap_err().to_string();
            assert!(err.contains("PRELOAD_MODE"));
            assert!(err.contains("never, always, auto"));
        });
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        with_clean_env(&[("LOADER_MAX_BATCH_SIZE", "0")], || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn test_list_fallback_and_mode_overrides() {
        with_clean_env(
            &[
                ("LIST_FIELD_FALLBACK", "EMPTY"),
                ("PRELOAD_MODE", "always"),
                ("MAX_QUERY_DEPTH", "8"),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.list_field_fallback, ListFieldFallback::Empty);
                assert_eq!(config.preload_mode, PreloadMode::Always);
                assert_eq!(config.max_query_depth, 8);
            },
        );
    }
}
