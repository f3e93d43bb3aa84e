//! 实体基础 trait

use lmis_common::AuditInfo;

/// 实体 trait
pub trait Entity {
    type Id;

    fn id(&self) -> &Self::Id;
}

/// 聚合根 trait
pub trait AggregateRoot: Entity {
    fn audit_info(&self) -> &AuditInfo;
    fn audit_info_mut(&mut self) -> &mut AuditInfo;
}

/// 乐观锁版本
pub trait Versioned {
    fn version(&self) -> i64;

    /// 调用方持有的版本是否已过期
    fn is_stale(&self, expected: i64) -> bool {
        self.version() != expected
    }
}
