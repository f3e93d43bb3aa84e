//! 持久化实现

mod converters;
mod memory;
mod postgres;
mod rows;

use lmis_adapter_postgres::Migration;

pub use memory::{
    InMemoryRejectionReasonCategoryRepository, InMemoryRequisitionRepository,
    InMemoryTemplateRepository,
};
pub use postgres::{
    PostgresRejectionReasonCategoryRepository, PostgresRequisitionRepository,
    PostgresTemplateRepository,
};

/// 服务内嵌的数据库迁移
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration::new(1, "init", include_str!("../../../migrations/0001_init.sql")),
        Migration::new(
            2,
            "rejection_reason_categories",
            include_str!("../../../migrations/0002_rejection_reason_categories.sql"),
        ),
    ]
}
