//! 服务启动器
//!
//! 提供统一的 HTTP 服务启动模式

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use lmis_config::AppConfig;
use lmis_errors::AppResult;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::health::{HealthChecker, health_routes};
use crate::infrastructure::Infrastructure;
use crate::metrics::{MetricsRecorder, track_http_metrics};
use crate::runtime::{init_runtime, shutdown_signal};

/// 运行 HTTP 服务
///
/// 1. 加载配置并初始化日志
/// 2. 安装 metrics recorder
/// 3. 创建基础设施资源
/// 4. 调用 `router_builder` 构建业务路由
/// 5. 合并健康检查路由，启动服务器并处理 graceful shutdown
///
/// ```ignore
/// lmis_bootstrap::run("config", |infra| async move {
///     Ok(my_service::api::routes(build_state(infra).await?))
/// })
/// .await
/// ```
pub async fn run<F, Fut>(config_dir: &str, router_builder: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(Infrastructure) -> Fut,
    Fut: Future<Output = AppResult<Router>>,
{
    let config = AppConfig::load(config_dir)?;
    init_runtime(&config)?;

    info!("Starting {} service", config.app_name);

    let metrics = if config.telemetry.metrics_enabled {
        Some(Arc::new(MetricsRecorder::install()?))
    } else {
        None
    };

    let infra = Infrastructure::from_config(config.clone()).await?;
    let checker = Arc::new(HealthChecker::new(infra.clone()));

    let app = router_builder(infra)
        .await?
        .merge(health_routes(checker, metrics))
        .layer(middleware::from_fn(track_http_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = config.server_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Service stopped");
    Ok(())
}
