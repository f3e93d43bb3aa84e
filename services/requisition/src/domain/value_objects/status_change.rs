//! 状态变更审计记录

use chrono::{DateTime, Utc};
use lmis_common::UserId;
use serde::{Deserialize, Serialize};

use crate::domain::enums::RequisitionStatus;

/// 状态变更记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    /// 发起时为空
    pub previous_status: Option<RequisitionStatus>,
    pub status: RequisitionStatus,
    pub author_id: Option<UserId>,
    pub changed_at: DateTime<Utc>,
}

impl StatusChange {
    pub fn new(
        previous_status: Option<RequisitionStatus>,
        status: RequisitionStatus,
        author_id: Option<UserId>,
        changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            previous_status,
            status,
            author_id,
            changed_at,
        }
    }
}
