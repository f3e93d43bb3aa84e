//! 基础设施资源管理
//!
//! 统一管理服务共享的基础设施资源

use lmis_adapter_postgres::{Migration, MigrationManager, PostgresConfig, create_pool};
use lmis_config::AppConfig;
use lmis_errors::AppResult;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::retry::{Backoff, connect_with_backoff};

/// 基础设施资源容器
///
/// 未配置数据库时 `postgres_pool` 为空，服务应退回内存存储
#[derive(Clone)]
pub struct Infrastructure {
    config: AppConfig,
    postgres_pool: Option<PgPool>,
}

impl Infrastructure {
    /// 从配置创建基础设施资源（带重试）
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let postgres_pool = match &config.database {
            Some(database) => {
                let pg_config = PostgresConfig::new(database.url.expose_secret())
                    .with_max_connections(database.max_connections);
                let backoff = Backoff::for_database(database);
                let pool = connect_with_backoff(&backoff, "PostgreSQL", || {
                    let cfg = pg_config.clone();
                    async move { create_pool(&cfg).await }
                })
                .await?;
                info!(
                    max_connections = database.max_connections,
                    "PostgreSQL connection pool created"
                );
                Some(pool)
            }
            None => {
                warn!("No database configured, using in-memory storage");
                None
            }
        };

        Ok(Self {
            config,
            postgres_pool,
        })
    }

    /// 不连接数据库（测试、本地开发）
    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            config,
            postgres_pool: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn postgres_pool(&self) -> Option<PgPool> {
        self.postgres_pool.clone()
    }

    pub fn has_database(&self) -> bool {
        self.postgres_pool.is_some()
    }

    /// 按配置执行迁移
    pub async fn run_migrations(&self, migrations: &[Migration]) -> AppResult<()> {
        let (Some(pool), Some(database)) = (&self.postgres_pool, &self.config.database) else {
            return Ok(());
        };
        if !database.run_migrations {
            info!("Migrations disabled by configuration");
            return Ok(());
        }

        let report = MigrationManager::new(pool.clone()).migrate(migrations).await?;
        info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "Database migrations finished"
        );
        Ok(())
    }
}
