//! 启动期连接重试
//!
//! 数据库等外部依赖可能晚于服务就绪，连接失败时按指数退避重试

use std::future::Future;
use std::time::Duration;

use lmis_config::DatabaseConfig;
use tracing::{info, warn};

/// 退避上限
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// 退避策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// 总尝试次数，含第一次
    pub attempts: u32,
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn new(attempts: u32, initial: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            initial,
            max: MAX_BACKOFF,
        }
    }

    /// 数据库连接使用的策略
    pub fn for_database(config: &DatabaseConfig) -> Self {
        Self::new(
            config.connect_attempts,
            Duration::from_millis(config.connect_backoff_ms),
        )
    }

    /// 第 `retry` 次重试（从 0 计）前的等待
    pub fn delay(&self, retry: u32) -> Duration {
        self.initial
            .checked_mul(2u32.saturating_pow(retry))
            .map_or(self.max, |d| d.min(self.max))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(500))
    }
}

/// 反复执行 `connect` 直到成功或用完尝试次数，失败时返回最后一次的错误
pub async fn connect_with_backoff<F, Fut, T, E>(
    backoff: &Backoff,
    target: &str,
    mut connect: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut retry = 0;
    loop {
        let attempt = retry + 1;
        let error = match connect().await {
            Ok(value) => {
                if retry > 0 {
                    info!(target_name = target, attempt, "Connected after retry");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if attempt >= backoff.attempts {
            warn!(
                target_name = target,
                attempt,
                error = %error,
                "Giving up on connection"
            );
            return Err(error);
        }

        let delay = backoff.delay(retry);
        warn!(
            target_name = target,
            attempt,
            attempts = backoff.attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Connection failed, retrying"
        );
        tokio::time::sleep(delay).await;
        retry += 1;
    }
}
