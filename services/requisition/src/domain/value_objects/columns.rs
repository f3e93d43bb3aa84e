//! 已知列注册表
//!
//! 按列键访问行数据都经过这里，未登记的列键视为编程错误

use serde::{Deserialize, Serialize};

/// 行级错误统一挂在该键下
pub const REQUISITION_LINE_ITEMS: &str = "requisitionLineItems";

pub const BEGINNING_BALANCE: &str = "beginningBalance";
pub const TOTAL_RECEIVED_QUANTITY: &str = "totalReceivedQuantity";
pub const TOTAL_CONSUMED_QUANTITY: &str = "totalConsumedQuantity";
pub const TOTAL_LOSSES_AND_ADJUSTMENTS: &str = "totalLossesAndAdjustments";
pub const STOCK_ON_HAND: &str = "stockOnHand";
pub const TOTAL_STOCKOUT_DAYS: &str = "totalStockoutDays";
pub const TOTAL: &str = "total";
pub const NUMBER_OF_NEW_PATIENTS_ADDED: &str = "numberOfNewPatientsAdded";
pub const ADJUSTED_CONSUMPTION: &str = "adjustedConsumption";
pub const AVERAGE_CONSUMPTION: &str = "averageConsumption";
pub const MAXIMUM_STOCK_QUANTITY: &str = "maximumStockQuantity";
pub const CALCULATED_ORDER_QUANTITY: &str = "calculatedOrderQuantity";
pub const REQUESTED_QUANTITY: &str = "requestedQuantity";
pub const REQUESTED_QUANTITY_EXPLANATION: &str = "requestedQuantityExplanation";
pub const APPROVED_QUANTITY: &str = "approvedQuantity";
pub const PACKS_TO_SHIP: &str = "packsToShip";
pub const PRICE_PER_PACK: &str = "pricePerPack";
pub const TOTAL_COST: &str = "totalCost";
pub const REMARKS: &str = "remarks";
pub const SKIPPED: &str = "skipped";
pub const PRODUCT_CODE: &str = "orderable.productCode";
pub const FULL_PRODUCT_NAME: &str = "orderable.fullProductName";
pub const DISPENSING_UNIT: &str = "orderable.dispensable";

/// 列值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnKind {
    /// 整数数量，存放在行的数值映射中
    Quantity,
    Text,
    Money,
    Flag,
    /// 产品信息，只读
    Reference,
}

/// 列在哪个阶段录入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPhase {
    /// 发起到授权
    Entry,
    /// 审批
    Approval,
}

/// 列定义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub key: &'static str,
    /// 公式中的字母代号
    pub indicator: &'static str,
    pub label: &'static str,
    pub kind: ColumnKind,
    pub phase: ColumnPhase,
    pub can_be_calculated: bool,
    pub can_be_user_input: bool,
}

const fn column(
    key: &'static str,
    indicator: &'static str,
    label: &'static str,
    kind: ColumnKind,
    phase: ColumnPhase,
    can_be_calculated: bool,
    can_be_user_input: bool,
) -> ColumnDefinition {
    ColumnDefinition {
        key,
        indicator,
        label,
        kind,
        phase,
        can_be_calculated,
        can_be_user_input,
    }
}

use ColumnKind::{Flag, Money, Quantity, Reference, Text};
use ColumnPhase::{Approval, Entry};

static DEFINITIONS: &[ColumnDefinition] = &[
    column(PRODUCT_CODE, "O", "Product code", Reference, Entry, false, false),
    column(FULL_PRODUCT_NAME, "R", "Product", Reference, Entry, false, false),
    column(DISPENSING_UNIT, "U", "Unit/unit of issue", Reference, Entry, false, false),
    column(SKIPPED, "S", "Skip", Flag, Entry, false, true),
    column(BEGINNING_BALANCE, "A", "Beginning balance", Quantity, Entry, true, true),
    column(TOTAL_RECEIVED_QUANTITY, "B", "Total received quantity", Quantity, Entry, true, true),
    column(TOTAL_CONSUMED_QUANTITY, "C", "Total consumed quantity", Quantity, Entry, true, true),
    column(TOTAL_LOSSES_AND_ADJUSTMENTS, "D", "Total losses and adjustments", Quantity, Entry, true, true),
    column(STOCK_ON_HAND, "E", "Stock on hand", Quantity, Entry, true, true),
    column(NUMBER_OF_NEW_PATIENTS_ADDED, "F", "Number of new patients added", Quantity, Entry, false, true),
    column(MAXIMUM_STOCK_QUANTITY, "H", "Maximum stock quantity", Quantity, Entry, true, false),
    column(CALCULATED_ORDER_QUANTITY, "I", "Calculated order quantity", Quantity, Entry, true, false),
    column(REQUESTED_QUANTITY, "J", "Requested quantity", Quantity, Entry, false, true),
    column(APPROVED_QUANTITY, "K", "Approved quantity", Quantity, Approval, false, true),
    column(REMARKS, "L", "Remarks", Text, Approval, false, true),
    column(ADJUSTED_CONSUMPTION, "N", "Adjusted consumption", Quantity, Entry, true, false),
    column(AVERAGE_CONSUMPTION, "P", "Average consumption", Quantity, Entry, true, false),
    column(TOTAL_COST, "Q", "Total cost", Money, Entry, true, false),
    column(PRICE_PER_PACK, "T", "Price per pack", Money, Entry, false, false),
    column(PACKS_TO_SHIP, "V", "Packs to ship", Quantity, Entry, true, false),
    column(REQUESTED_QUANTITY_EXPLANATION, "W", "Requested quantity explanation", Text, Entry, false, true),
    column(TOTAL_STOCKOUT_DAYS, "X", "Total stockout days", Quantity, Entry, false, true),
    column(TOTAL, "Y", "Total", Quantity, Entry, true, false),
];

/// 按键查找列定义
pub fn column_definition(key: &str) -> Option<&'static ColumnDefinition> {
    DEFINITIONS.iter().find(|d| d.key == key)
}

/// 全部已知列
pub fn known_columns() -> &'static [ColumnDefinition] {
    DEFINITIONS
}

/// 是否为数量列
pub fn is_quantity_column(key: &str) -> bool {
    column_definition(key).is_some_and(|d| d.kind == ColumnKind::Quantity)
}
