//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, plus the schema
//! bootstrap applied at startup. Queries live in the Postgres repositories.

use crate::error::{ApiError, ApiResult};
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use folio_core::StorageError;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tokio_postgres::NoTls;

/// Idempotent bootstrap script for every table.
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: SecretString,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait timeout when checking out a connection
    pub timeout: Duration,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("max_size", &self.max_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "portfolio".to_string(),
            user: "postgres".to_string(),
            password: SecretString::from(String::new()),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("POSTGRES_DB").unwrap_or(defaults.dbname),
            user: std::env::var("POSTGRES_USER").unwrap_or(defaults.user),
            password: SecretString::from(std::env::var("POSTGRES_PASSWORD").unwrap_or_default()),
            max_size: std::env::var("DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.max_size),
            timeout: defaults.timeout,
        }
    }

    /// Create a connection pool from this configuration.
    ///
    /// Connections are opened lazily, so this succeeds without a reachable
    /// server.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.expose_secret().to_string());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls).map_err(|e| {
            tracing::error!(error = %e, "Failed to create database pool");
            ApiError::database_error()
        })
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Cloneable handle over the connection pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Check out a connection.
    pub async fn get_conn(&self) -> Result<deadpool_postgres::Object, StorageError> {
        self.pool.get().await.map_err(|e| {
            tracing::error!(error = %e, "Connection pool error");
            StorageError::backend(e)
        })
    }

    /// Apply the embedded schema.
    pub async fn ensure_schema(&self) -> ApiResult<()> {
        let conn = self.pool.get().await?;
        conn.batch_execute(SCHEMA_SQL).await?;
        tracing::info!("Database schema ensured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DbConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "portfolio");
        assert_eq!(config.user, "postgres");
        assert_eq!(config.max_size, 16);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = DbConfig {
            password: SecretString::from("hunter2".to_string()),
            ..DbConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_schema_covers_every_table() {
        for table in [
            "hero_pages",
            "about_pages",
            "about_cards",
            "technical_skills",
            "career_journeys",
            "testimony_pages",
            "testimonies",
            "project_pages",
            "projects",
        ] {
            assert!(
                SCHEMA_SQL.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)),
                "missing table {}",
                table
            );
        }
        assert!(!SCHEMA_SQL.contains("DROP "));
    }

    #[tokio::test]
    async fn test_pool_creation_is_lazy() {
        let client = DbClient::from_config(&DbConfig::default()).expect("pool");
        assert_eq!(client.pool_size(), 0);
    }
}
