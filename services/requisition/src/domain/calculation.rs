//! 计算列推导
//!
//! 在校验前对工作副本执行，每次行更新后也会执行。
//! 计算来源的 beginningBalance 与 totalReceivedQuantity 在发起时由外部数据填入，这里不重算。

use lmis_domain_core::Money;
use lmis_errors::AppResult;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::entities::{Requisition, RequisitionLineItem, RequisitionTemplate};
use crate::domain::value_objects::PackagingRules;
use crate::domain::value_objects::columns::*;

/// 默认每月天数
pub const DEFAULT_DAYS_IN_MONTH: u32 = 30;

/// 计算参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculationSettings {
    pub days_in_month: u32,
}

impl Default for CalculationSettings {
    fn default() -> Self {
        Self {
            days_in_month: DEFAULT_DAYS_IN_MONTH,
        }
    }
}

/// 行计算器
#[derive(Debug, Clone, Copy, Default)]
pub struct LineItemFieldsCalculator {
    settings: CalculationSettings,
}

impl LineItemFieldsCalculator {
    pub fn new(settings: CalculationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CalculationSettings {
        &self.settings
    }

    /// 重算全部未跳过行的计算列
    pub fn recalculate(
        &self,
        requisition: &mut Requisition,
        template: &RequisitionTemplate,
    ) -> AppResult<()> {
        let months = requisition.number_of_months_in_period();
        let uses_approved = requisition.status().uses_approved_quantity();

        for item in requisition
            .line_items_mut()
            .iter_mut()
            .filter(|item| !item.is_skipped())
        {
            self.recalculate_line_item(item, template, months, uses_approved)?;
        }
        Ok(())
    }

    fn recalculate_line_item(
        &self,
        item: &mut RequisitionLineItem,
        template: &RequisitionTemplate,
        months_in_period: u32,
        uses_approved_quantity: bool,
    ) -> AppResult<()> {
        let calculated = |key: &str| template.is_column_calculated(key);

        if calculated(TOTAL_CONSUMED_QUANTITY) {
            let value = total_consumed_quantity(
                item.beginning_balance(),
                item.total_received_quantity(),
                item.total_losses_and_adjustments(),
                item.stock_on_hand(),
            );
            item.set_column_value(TOTAL_CONSUMED_QUANTITY, value)?;
        }

        if calculated(STOCK_ON_HAND) {
            let value = stock_on_hand(
                item.beginning_balance(),
                item.total_received_quantity(),
                item.total_consumed_quantity(),
                item.total_losses_and_adjustments(),
            );
            item.set_column_value(STOCK_ON_HAND, value)?;
        }

        if calculated(TOTAL) {
            let value = total(item.beginning_balance(), item.total_received_quantity());
            item.set_column_value(TOTAL, value)?;
        }

        if calculated(ADJUSTED_CONSUMPTION) {
            let value = adjusted_consumption(
                item.total_consumed_quantity(),
                item.total_stockout_days(),
                months_in_period,
                self.settings.days_in_month,
            );
            item.set_column_value(ADJUSTED_CONSUMPTION, value)?;
        }

        if calculated(AVERAGE_CONSUMPTION) {
            let value = average_consumption(
                item.previous_adjusted_consumptions(),
                template.number_of_periods_to_average(),
                item.adjusted_consumption(),
            );
            item.set_column_value(AVERAGE_CONSUMPTION, value)?;
        }

        if calculated(MAXIMUM_STOCK_QUANTITY) {
            let value =
                maximum_stock_quantity(item.average_consumption(), item.max_periods_of_stock());
            item.set_column_value(MAXIMUM_STOCK_QUANTITY, value)?;
        }

        if calculated(CALCULATED_ORDER_QUANTITY) {
            let value =
                calculated_order_quantity(item.maximum_stock_quantity(), item.stock_on_hand());
            item.set_column_value(CALCULATED_ORDER_QUANTITY, value)?;
        }

        if calculated(PACKS_TO_SHIP) {
            let quantity = order_quantity(item, uses_approved_quantity);
            let value = packs_to_ship(quantity, item.packaging());
            item.set_column_value(PACKS_TO_SHIP, value)?;
        }

        if calculated(TOTAL_COST) {
            item.set_total_cost(total_cost(item.price_per_pack(), item.packs_to_ship()));
        }

        Ok(())
    }
}

/// 订货数量：审批阶段优先取批准数量，其次申请数量，最后取计算订货量
pub fn order_quantity(item: &RequisitionLineItem, uses_approved_quantity: bool) -> Option<i64> {
    if uses_approved_quantity && let Some(approved) = item.approved_quantity() {
        return Some(approved);
    }
    item.requested_quantity()
        .or_else(|| item.calculated_order_quantity())
}

/// E = A + B - C + D
pub fn stock_on_hand(
    beginning_balance: Option<i64>,
    total_received: Option<i64>,
    total_consumed: Option<i64>,
    losses_and_adjustments: Option<i64>,
) -> Option<i64> {
    beginning_balance?
        .checked_add(total_received?)?
        .checked_sub(total_consumed?)?
        .checked_add(losses_and_adjustments.unwrap_or(0))
}

/// C = A + B + D - E
pub fn total_consumed_quantity(
    beginning_balance: Option<i64>,
    total_received: Option<i64>,
    losses_and_adjustments: Option<i64>,
    stock_on_hand: Option<i64>,
) -> Option<i64> {
    beginning_balance?
        .checked_add(total_received?)?
        .checked_add(losses_and_adjustments.unwrap_or(0))?
        .checked_sub(stock_on_hand?)
}

/// Y = A + B
pub fn total(beginning_balance: Option<i64>, total_received: Option<i64>) -> Option<i64> {
    beginning_balance?.checked_add(total_received?)
}

/// N = ⌈C × 总天数 ÷ (总天数 − X)⌉，无缺货天数时取 C
pub fn adjusted_consumption(
    total_consumed: Option<i64>,
    stockout_days: Option<i64>,
    months_in_period: u32,
    days_in_month: u32,
) -> Option<i64> {
    let consumed = total_consumed?;
    let total_days = i64::from(months_in_period) * i64::from(days_in_month);
    let non_stockout_days = total_days - stockout_days.unwrap_or(0);
    if total_days <= 0 || non_stockout_days <= 0 {
        return Some(consumed);
    }

    let value = Decimal::from(consumed) * Decimal::from(total_days)
        / Decimal::from(non_stockout_days);
    value.ceil().to_i64()
}

/// P = ⌈最近 n−1 期调整消耗量与本期 N 的平均值⌉
pub fn average_consumption(
    previous: &[i64],
    periods_to_average: u32,
    adjusted: Option<i64>,
) -> Option<i64> {
    let current = adjusted?;
    let take = (periods_to_average as usize).saturating_sub(1).min(previous.len());
    let history = &previous[previous.len() - take..];

    let sum: Decimal = history
        .iter()
        .chain(std::iter::once(&current))
        .map(|v| Decimal::from(*v))
        .sum();
    let count = Decimal::from(history.len() + 1);
    (sum / count).ceil().to_i64()
}

/// H = P × 最大库存期数，四舍五入
pub fn maximum_stock_quantity(average: Option<i64>, max_periods_of_stock: Decimal) -> Option<i64> {
    (Decimal::from(average?) * max_periods_of_stock)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// I = max(0, H − E)
pub fn calculated_order_quantity(maximum: Option<i64>, stock_on_hand: Option<i64>) -> Option<i64> {
    maximum?.checked_sub(stock_on_hand?).map(|v| v.max(0))
}

/// V：按包装规则换算
pub fn packs_to_ship(order_quantity: Option<i64>, packaging: &PackagingRules) -> Option<i64> {
    order_quantity.map(|q| packaging.packs_to_order(q))
}

/// Q = T × V
pub fn total_cost(price_per_pack: Money, packs: Option<i64>) -> Option<Money> {
    packs.map(|p| price_per_pack.times(p))
}
