//! Artikey recovery-log sweeper.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use artikey_application::{
    ArtifactoryClientCache, BackendConfigService, DEFAULT_CLIENT_CACHE_TTL,
    DEFAULT_ROLE_LOCK_BUCKETS, KeyValueStore, ReconciliationService, RecoveryLog, RoleLockTable,
    RoleStore,
};
use artikey_core::{AppError, AppResult};
use artikey_infrastructure::{HttpArtifactoryClientFactory, PostgresKeyValueStore};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct WorkerConfig {
    database_url: String,
    sweep_interval_ms: u64,
    recovery_min_age: Duration,
    role_lock_buckets: usize,
    client_cache_ttl: Duration,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;
    let reconciliation_service =
        build_reconciliation_service(Arc::new(PostgresKeyValueStore::new(pool)), &config);

    info!(
        sweep_interval_ms = config.sweep_interval_ms,
        recovery_min_age_seconds = config.recovery_min_age.as_secs(),
        "artikey-worker started"
    );

    loop {
        match reconciliation_service
            .replay_recovery_log(config.recovery_min_age)
            .await
        {
            Ok(report) => {
                for warning in &report.warnings {
                    warn!(warning = %warning, "recovery sweep warning");
                }
                if report.replayed > 0 || report.retained > 0 {
                    info!(
                        replayed = report.replayed,
                        retained = report.retained,
                        "recovery sweep finished"
                    );
                }
            }
            Err(error) => warn!(error = %error, "recovery sweep failed"),
        }

        tokio::time::sleep(Duration::from_millis(config.sweep_interval_ms)).await;
    }
}

fn build_reconciliation_service(
    store: Arc<dyn KeyValueStore>,
    config: &WorkerConfig,
) -> ReconciliationService {
    let client_cache = Arc::new(ArtifactoryClientCache::new(
        Arc::new(HttpArtifactoryClientFactory::new()),
        config.client_cache_ttl,
    ));

    ReconciliationService::new(
        RoleStore::new(store.clone()),
        RecoveryLog::new(store.clone()),
        Arc::new(RoleLockTable::new(config.role_lock_buckets)),
        BackendConfigService::new(store, client_cache),
    )
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let sweep_interval_ms = parse_env_u64("WORKER_SWEEP_INTERVAL_MS", 60_000)?;
        let recovery_min_age = Duration::from_secs(parse_env_u64("RECOVERY_MIN_AGE_SECONDS", 300)?);
        let role_lock_buckets = parse_env_usize("ROLE_LOCK_BUCKETS", DEFAULT_ROLE_LOCK_BUCKETS)?;
        let client_cache_ttl = Duration::from_secs(parse_env_u64(
            "ARTIFACTORY_CLIENT_TTL_SECONDS",
            DEFAULT_CLIENT_CACHE_TTL.as_secs(),
        )?);

        if sweep_interval_ms == 0 {
            return Err(AppError::Validation(
                "WORKER_SWEEP_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        if role_lock_buckets == 0 {
            return Err(AppError::Validation(
                "ROLE_LOCK_BUCKETS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            sweep_interval_ms,
            recovery_min_age,
            role_lock_buckets,
            client_cache_ttl,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> AppResult<usize> {
    match env::var(name) {
        Ok(value) => value.parse::<usize>().map_err(|error| {
            AppError::Validation(format!("invalid {name} '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
