/// Configuration management for the posting service
///
/// All settings come from environment variables (a `.env` file is loaded by
/// `main` before this runs). Missing values fall back to development defaults;
/// malformed numeric values are rejected.
use db_pool::env_utils::{parse_env_optional, parse_env_or_default, parse_env_with_default};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

impl CorsConfig {
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
    }
}

/// Which repository implementation backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// Apply embedded migrations at startup
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `{post_id}.{image_format}` files
    pub image_base_path: PathBuf,
    pub image_format: String,
    /// Upper bound on the decoded image size in bytes
    pub image_max_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token_ttl_minutes: i64,
    pub token_sweep_interval_secs: u64,
}

impl AuthConfig {
    /// Token lifetime, held within `1..=MAX_TOKEN_TTL_MINUTES` minutes.
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token_ttl_minutes.clamp(1, MAX_TOKEN_TTL_MINUTES))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub per_page: u32,
}

pub const DEFAULT_IMAGE_MAX_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 24 * 60;
/// One leap year
pub const MAX_TOKEN_TTL_MINUTES: i64 = 366 * 24 * 60;
pub const DEFAULT_PER_PAGE: u32 = 10;

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env: String = parse_env_with_default("APP_ENV", "development".to_string());
        let is_production = app_env.eq_ignore_ascii_case("production");

        let allowed_origins = match parse_env_optional::<String>("CORS_ALLOWED_ORIGINS") {
            Some(value) => value,
            None if is_production => {
                return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
            }
            None => "http://localhost:3000".to_string(),
        };
        if is_production && allowed_origins.trim() == "*" {
            return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
        }

        let backend = match parse_env_with_default("STORAGE_BACKEND", "postgres".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "postgres" => StorageBackend::Postgres,
            "memory" if is_production => {
                return Err("STORAGE_BACKEND=memory is not allowed in production".to_string())
            }
            "memory" => StorageBackend::Memory,
            other => return Err(format!("Unknown STORAGE_BACKEND: {}", other)),
        };

        let config = Config {
            app: AppConfig {
                env: app_env,
                host: parse_env_with_default("POSTING_SERVICE_HOST", "0.0.0.0".to_string()),
                port: parse_env_or_default("POSTING_SERVICE_PORT", 8080)?,
            },
            cors: CorsConfig { allowed_origins },
            database: DatabaseConfig {
                backend,
                run_migrations: parse_env_or_default("RUN_MIGRATIONS", true)?,
            },
            storage: StorageConfig {
                image_base_path: PathBuf::from(parse_env_with_default(
                    "IMAGE_BASE_PATH",
                    "images".to_string(),
                )),
                image_format: parse_env_with_default("IMAGE_FORMAT", "jpeg".to_string()),
                image_max_bytes: parse_env_or_default("IMAGE_MAX_BYTES", DEFAULT_IMAGE_MAX_BYTES)?,
            },
            auth: AuthConfig {
                token_ttl_minutes: parse_env_or_default(
                    "TOKEN_TTL_MINUTES",
                    DEFAULT_TOKEN_TTL_MINUTES,
                )?,
                token_sweep_interval_secs: parse_env_or_default("TOKEN_SWEEP_INTERVAL_SECS", 3600)?,
            },
            pagination: PaginationConfig {
                per_page: parse_env_or_default("PAGE_SIZE", DEFAULT_PER_PAGE)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.auth.token_ttl_minutes <= 0 {
            return Err("TOKEN_TTL_MINUTES must be positive".to_string());
        }
        if self.auth.token_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            return Err(format!(
                "TOKEN_TTL_MINUTES may not exceed {}",
                MAX_TOKEN_TTL_MINUTES
            ));
        }
        if self.auth.token_sweep_interval_secs == 0 {
            return Err("TOKEN_SWEEP_INTERVAL_SECS must be positive".to_string());
        }
        if self.pagination.per_page == 0 {
            return Err("PAGE_SIZE must be positive".to_string());
        }
        if self.storage.image_max_bytes == 0 {
            return Err("IMAGE_MAX_BYTES must be positive".to_string());
        }
        if self.storage.image_format.is_empty()
            || !self
                .storage
                .image_format
                .chars()
                .all(|c| c.is_ascii_alphanumeric())
        {
            return Err(format!(
                "IMAGE_FORMAT must be a plain extension, got {:?}",
                self.storage.image_format
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    /// Development defaults, also used by tests
    fn default() -> Self {
        Config {
            app: AppConfig {
                env: "development".to_string(),
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            cors: CorsConfig {
                allowed_origins: "http://localhost:3000".to_string(),
            },
            database: DatabaseConfig {
                backend: StorageBackend::Memory,
                run_migrations: false,
            },
            storage: StorageConfig {
                image_base_path: PathBuf::from("images"),
                image_format: "jpeg".to_string(),
                image_max_bytes: DEFAULT_IMAGE_MAX_BYTES,
            },
            auth: AuthConfig {
                token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
                token_sweep_interval_secs: 3600,
            },
            pagination: PaginationConfig {
                per_page: DEFAULT_PER_PAGE,
            },
        }
    }
}
