//! 列数据来源

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 列数据来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnSource {
    /// 用户录入
    UserInput,
    /// 由其他列计算
    Calculated,
    /// 来自参考数据
    ReferenceData,
}

impl ColumnSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserInput => "USER_INPUT",
            Self::Calculated => "CALCULATED",
            Self::ReferenceData => "REFERENCE_DATA",
        }
    }
}

impl fmt::Display for ColumnSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER_INPUT" => Ok(Self::UserInput),
            "CALCULATED" => Ok(Self::Calculated),
            "REFERENCE_DATA" => Ok(Self::ReferenceData),
            other => Err(format!("unknown column source: {}", other)),
        }
    }
}
