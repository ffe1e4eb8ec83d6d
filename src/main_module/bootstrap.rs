//! Store construction and startup checks

use log::{info, warn};
use std::sync::Arc;

use crate::catalog::default_catalog;
use crate::core::config::{AppConfig, ConfigError};
use crate::core::shared::utils::{create_conn, run_migrations};
use crate::store::{ComplianceStore, InMemoryStore, PgStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to create database pool: {0}")]
    Pool(String),
    #[error("Failed to run migrations: {0}")]
    Migrations(String),
    #[error("Failed to seed control catalog: {0}")]
    Seed(#[from] StoreError),
}

/// Parse command line arguments. `--memory` runs without PostgreSQL.
pub fn parse_cli_args(args: &[String]) -> StoreMode {
    if args.iter().any(|a| a == "--memory") {
        StoreMode::Memory
    } else {
        StoreMode::Postgres
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Postgres,
    Memory,
}

fn seed_catalog(store: &dyn ComplianceStore) -> Result<(), StoreError> {
    let inserted = store.seed_controls(default_catalog())?;
    if inserted > 0 {
        info!("Seeded {} controls into the catalog", inserted);
    } else {
        info!("Control catalog already populated");
    }
    Ok(())
}

/// Opens the configured store, applies pending migrations and seeds the
/// control catalog when it is empty.
pub fn init_store(
    config: &AppConfig,
    mode: StoreMode,
) -> Result<Arc<dyn ComplianceStore>, BootstrapError> {
    let store: Arc<dyn ComplianceStore> = match mode {
        StoreMode::Memory => {
            warn!("Using in-memory store; data is lost on shutdown");
            Arc::new(InMemoryStore::new())
        }
        StoreMode::Postgres => {
            let database = config.require_database()?;
            info!("Connecting to database (pool size {})", database.pool_size);
            let pool = create_conn(database).map_err(|e| BootstrapError::Pool(e.to_string()))?;
            run_migrations(&pool).map_err(|e| BootstrapError::Migrations(e.to_string()))?;
            Arc::new(PgStore::new(pool))
        }
    };

    seed_catalog(store.as_ref())?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_args() {
        let args = vec!["compliancevault".to_string(), "--memory".to_string()];
        assert_eq!(parse_cli_args(&args), StoreMode::Memory);
        assert_eq!(
            parse_cli_args(&["compliancevault".to_string()]),
            StoreMode::Postgres
        );
    }

    #[test]
    fn test_memory_store_is_seeded() {
        let store = init_store(&AppConfig::default(), StoreMode::Memory).unwrap();
        assert_eq!(
            store.list_controls().unwrap().len(),
            default_catalog().len()
        );
    }

    #[test]
    fn test_postgres_mode_requires_database_url() {
        let Err(err) = init_store(&AppConfig::default(), StoreMode::Postgres) else {
            panic!("postgres mode started without DATABASE_URL");
        };
        assert!(matches!(
            err,
            BootstrapError::Config(ConfigError::Missing("DATABASE_URL"))
        ));
    }
}
