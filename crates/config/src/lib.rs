//! lmis-config - 配置加载库

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use thiserror::Error;

use secrecy::Secret;

/// 环境变量前缀，层级分隔符为 `__`，例如 `LMIS_SERVER__PORT`
pub const ENV_PREFIX: &str = "LMIS_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// 启动时执行迁移
    #[serde(default = "default_true")]
    pub run_migrations: bool,
    /// 启动时连接数据库的最多尝试次数
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    /// 首次重连前的等待（毫秒），之后逐次翻倍
    #[serde(default = "default_connect_backoff_ms")]
    pub connect_backoff_ms: u64,
}

fn default_connect_attempts() -> u32 {
    5
}

fn default_connect_backoff_ms() -> u64 {
    500
}

fn default_max_connections() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 是否暴露 /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_enabled: true,
        }
    }
}

/// 申请单业务配置
#[derive(Debug, Clone, Deserialize)]
pub struct RequisitionConfig {
    /// 计算调整后消耗量时每月天数
    #[serde(default = "default_days_in_month")]
    pub days_in_month: i64,
    /// 参考数据种子文件（JSON）
    pub reference_data_file: Option<String>,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

fn default_days_in_month() -> i64 {
    30
}

fn default_page_size() -> u32 {
    20
}

impl Default for RequisitionConfig {
    fn default() -> Self {
        Self {
            days_in_month: default_days_in_month(),
            reference_data_file: None,
            default_page_size: default_page_size(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub app_env: String,
    /// 未配置时使用内存存储
    pub database: Option<DatabaseConfig>,
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub requisition: RequisitionConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config: Self = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests;
