//! 通用工具函数

/// 截断到毫秒精度
///
/// 内存实现与数据库中的时间戳保持同一精度
pub fn truncate_to_millis(ts: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
    use chrono::{DurationRound, TimeDelta};
    ts.duration_trunc(TimeDelta::milliseconds(1)).unwrap_or(ts)
}
