use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use artikey_application::{DEFAULT_CLIENT_CACHE_TTL, DEFAULT_ROLE_LOCK_BUCKETS};
use artikey_core::AppError;
use tracing_subscriber::EnvFilter;

const MIN_ADMIN_TOKEN_LENGTH: usize = 32;

/// Where roles, recovery records and backend configuration are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(AppError::Validation(format!(
                "STORAGE_BACKEND must be 'postgres' or 'memory', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub api_host: String,
    pub api_port: u16,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub admin_token: String,
    pub role_lock_buckets: usize,
    pub client_cache_ttl: Duration,
    pub recovery_min_age: Duration,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => StorageBackend::parse(&value)?,
            Err(_) => StorageBackend::Postgres,
        };
        let database_url = match storage_backend {
            StorageBackend::Postgres => Some(required_non_empty_env("DATABASE_URL")?),
            StorageBackend::Memory => None,
        };

        if migrate_only && database_url.is_none() {
            return Err(AppError::Validation(
                "migrate requires STORAGE_BACKEND=postgres".to_owned(),
            ));
        }

        let admin_token = if migrate_only {
            String::new()
        } else {
            let token = required_non_empty_env("ADMIN_TOKEN")?;
            if token.trim().len() < MIN_ADMIN_TOKEN_LENGTH {
                return Err(AppError::Validation(format!(
                    "ADMIN_TOKEN must be at least {MIN_ADMIN_TOKEN_LENGTH} characters"
                )));
            }
            token.trim().to_owned()
        };

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = parse_env_u16("API_PORT", 3001)?;

        let role_lock_buckets = parse_env_usize("ROLE_LOCK_BUCKETS", DEFAULT_ROLE_LOCK_BUCKETS)?;
        if role_lock_buckets == 0 {
            return Err(AppError::Validation(
                "ROLE_LOCK_BUCKETS must be greater than zero".to_owned(),
            ));
        }

        let client_cache_ttl = Duration::from_secs(parse_env_u64(
            "ARTIFACTORY_CLIENT_TTL_SECONDS",
            DEFAULT_CLIENT_CACHE_TTL.as_secs(),
        )?);
        let recovery_min_age = Duration::from_secs(parse_env_u64("RECOVERY_MIN_AGE_SECONDS", 0)?);

        Ok(Self {
            migrate_only,
            api_host,
            api_port,
            storage_backend,
            database_url,
            admin_token,
            role_lock_buckets,
            client_cache_ttl,
            recovery_min_age,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, AppError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<u16>()
            .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}"))),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, AppError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}"))),
        Err(_) => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, AppError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<usize>()
            .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}"))),
        Err(_) => Ok(default),
    }
}
