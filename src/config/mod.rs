use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub schedule: ScheduleConfig,
    pub soft_delete: SoftDeleteConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub max_limit: Option<i32>,
    pub max_nested_depth: u32,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub reject_inverted_times: bool,
    pub reject_overlaps: bool,
    pub max_range_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftDeleteConfig {
    /// Name of the nullable timestamp column marking a row as logically deleted
    pub field: String,
    pub warm_on_startup: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Filter overrides
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().ok();
        }
        if let Ok(v) = env::var("FILTER_MAX_NESTED_DEPTH") {
            self.filter.max_nested_depth = v.parse().unwrap_or(self.filter.max_nested_depth);
        }
        if let Ok(v) = env::var("FILTER_DEBUG_LOGGING") {
            self.filter.debug_logging = v.parse().unwrap_or(self.filter.debug_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        match env::var("DATABASE_BACKEND").as_deref() {
            Ok("memory") => self.database.backend = StorageBackend::Memory,
            Ok("postgres") | Ok("pg") => self.database.backend = StorageBackend::Postgres,
            _ => {
                if self.database.url.is_none() {
                    self.database.backend = StorageBackend::Memory;
                }
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Some(port) = env::var("API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|v| v.parse().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Schedule overrides
        if let Ok(v) = env::var("SCHEDULE_REJECT_INVERTED_TIMES") {
            self.schedule.reject_inverted_times = v.parse().unwrap_or(self.schedule.reject_inverted_times);
        }
        if let Ok(v) = env::var("SCHEDULE_REJECT_OVERLAPS") {
            self.schedule.reject_overlaps = v.parse().unwrap_or(self.schedule.reject_overlaps);
        }
        if let Ok(v) = env::var("SCHEDULE_MAX_RANGE_DAYS") {
            self.schedule.max_range_days = v.parse().ok();
        }

        // Soft delete overrides
        if let Ok(v) = env::var("SOFT_DELETE_FIELD") {
            if !v.trim().is_empty() {
                self.soft_delete.field = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("SOFT_DELETE_WARM_ON_STARTUP") {
            self.soft_delete.warm_on_startup = v.parse().unwrap_or(self.soft_delete.warm_on_startup);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            filter: FilterConfig {
                max_limit: Some(1000),
                max_nested_depth: 10,
                debug_logging: true,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            schedule: ScheduleConfig {
                reject_inverted_times: true,
                reject_overlaps: true,
                max_range_days: Some(3 * 366),
            },
            soft_delete: SoftDeleteConfig {
                field: "deleted_at".to_string(),
                warm_on_startup: true,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            filter: FilterConfig {
                max_limit: Some(500),
                max_nested_depth: 6,
                debug_logging: false,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            schedule: ScheduleConfig {
                reject_inverted_times: true,
                reject_overlaps: true,
                max_range_days: Some(2 * 366),
            },
            soft_delete: SoftDeleteConfig {
                field: "deleted_at".to_string(),
                warm_on_startup: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            filter: FilterConfig {
                max_limit: Some(100),
                max_nested_depth: 5,
                debug_logging: false,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
            },
            schedule: ScheduleConfig {
                reject_inverted_times: true,
                reject_overlaps: true,
                max_range_days: Some(2 * 366),
            },
            soft_delete: SoftDeleteConfig {
                field: "deleted_at".to_string(),
                warm_on_startup: true,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.filter.max_limit, Some(1000));
        assert!(config.database.run_migrations);
        assert_eq!(config.soft_delete.field, "deleted_at");
        assert!(config.schedule.reject_overlaps);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.filter.max_limit, Some(100));
        assert!(!config.database.run_migrations);
        assert!(!config.api.enable_request_logging);
        assert_eq!(config.schedule.max_range_days, Some(732));
    }
}
