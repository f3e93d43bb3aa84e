//! 强类型 ID 定义

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From)]
        #[serde(transparent)]
        #[display("{_0}")]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

uuid_id!(
    /// 申请单 ID
    RequisitionId
);
uuid_id!(
    /// 申请单行 ID
    LineItemId
);
uuid_id!(
    /// 列模板 ID
    TemplateId
);
uuid_id!(
    /// 产品 ID
    OrderableId
);
uuid_id!(
    /// 机构 ID
    FacilityId
);
uuid_id!(
    /// 项目 ID
    ProgramId
);
uuid_id!(
    /// 报告期 ID
    ProcessingPeriodId
);
uuid_id!(
    /// 监管节点 ID
    SupervisoryNodeId
);
uuid_id!(
    /// 订单 ID
    OrderId
);
uuid_id!(
    /// 驳回原因分类 ID
    RejectionReasonCategoryId
);
