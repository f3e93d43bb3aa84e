//! 申请单行实体

use std::collections::BTreeMap;

use lmis_domain_core::Money;
use lmis_errors::{AppError, AppResult};
use rust_decimal::Decimal;

use crate::domain::value_objects::columns::*;
use crate::domain::value_objects::{
    ColumnKind, LineItemId, OrderableId, PackagingRules, column_definition,
};

/// 申请单行
///
/// 数量列统一存放在 `values` 中，缺失表示未录入（不同于 0）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequisitionLineItem {
    id: LineItemId,
    orderable_id: OrderableId,
    values: BTreeMap<String, i64>,
    remarks: Option<String>,
    requested_quantity_explanation: Option<String>,
    price_per_pack: Money,
    total_cost: Option<Money>,
    non_full_supply: bool,
    skipped: bool,
    packaging: PackagingRules,
    max_periods_of_stock: Decimal,
    previous_adjusted_consumptions: Vec<i64>,
}

/// 行的全部字段，用于从存储或导入恢复
#[derive(Debug, Clone, Default)]
pub struct LineItemParts {
    pub id: LineItemId,
    pub orderable_id: OrderableId,
    pub values: BTreeMap<String, i64>,
    pub remarks: Option<String>,
    pub requested_quantity_explanation: Option<String>,
    pub price_per_pack: Money,
    pub total_cost: Option<Money>,
    pub non_full_supply: bool,
    pub skipped: bool,
    pub packaging: PackagingRules,
    pub max_periods_of_stock: Decimal,
    pub previous_adjusted_consumptions: Vec<i64>,
}

impl RequisitionLineItem {
    /// 全供应产品行
    pub fn full_supply(
        orderable_id: OrderableId,
        packaging: PackagingRules,
        price_per_pack: Money,
        max_periods_of_stock: Decimal,
    ) -> Self {
        Self::restore(LineItemParts {
            id: LineItemId::new(),
            orderable_id,
            price_per_pack,
            packaging,
            max_periods_of_stock,
            ..Default::default()
        })
    }

    /// 非全供应产品行
    pub fn non_full_supply(
        orderable_id: OrderableId,
        packaging: PackagingRules,
        price_per_pack: Money,
        max_periods_of_stock: Decimal,
    ) -> Self {
        let mut item = Self::full_supply(orderable_id, packaging, price_per_pack, max_periods_of_stock);
        item.non_full_supply = true;
        item
    }

    pub fn restore(parts: LineItemParts) -> Self {
        Self {
            id: parts.id,
            orderable_id: parts.orderable_id,
            values: parts.values,
            remarks: parts.remarks,
            requested_quantity_explanation: parts.requested_quantity_explanation,
            price_per_pack: parts.price_per_pack,
            total_cost: parts.total_cost,
            non_full_supply: parts.non_full_supply,
            skipped: parts.skipped,
            packaging: parts.packaging,
            max_periods_of_stock: parts.max_periods_of_stock,
            previous_adjusted_consumptions: parts.previous_adjusted_consumptions,
        }
    }

    pub fn into_parts(self) -> LineItemParts {
        LineItemParts {
            id: self.id,
            orderable_id: self.orderable_id,
            values: self.values,
            remarks: self.remarks,
            requested_quantity_explanation: self.requested_quantity_explanation,
            price_per_pack: self.price_per_pack,
            total_cost: self.total_cost,
            non_full_supply: self.non_full_supply,
            skipped: self.skipped,
            packaging: self.packaging,
            max_periods_of_stock: self.max_periods_of_stock,
            previous_adjusted_consumptions: self.previous_adjusted_consumptions,
        }
    }

    // ========== Getters ==========

    pub fn id(&self) -> &LineItemId {
        &self.id
    }

    pub fn orderable_id(&self) -> &OrderableId {
        &self.orderable_id
    }

    pub fn values(&self) -> &BTreeMap<String, i64> {
        &self.values
    }

    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    pub fn requested_quantity_explanation(&self) -> Option<&str> {
        self.requested_quantity_explanation.as_deref()
    }

    pub fn price_per_pack(&self) -> Money {
        self.price_per_pack
    }

    pub fn total_cost(&self) -> Option<Money> {
        self.total_cost
    }

    pub fn is_non_full_supply(&self) -> bool {
        self.non_full_supply
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    pub fn packaging(&self) -> &PackagingRules {
        &self.packaging
    }

    pub fn max_periods_of_stock(&self) -> Decimal {
        self.max_periods_of_stock
    }

    pub fn previous_adjusted_consumptions(&self) -> &[i64] {
        &self.previous_adjusted_consumptions
    }

    // ========== 按列访问 ==========

    /// 数量列的值，不校验列键
    pub fn value(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    /// 数量列的值，非数量列属于编程错误
    pub fn column_value(&self, key: &str) -> AppResult<Option<i64>> {
        ensure_quantity_column(key)?;
        Ok(self.value(key))
    }

    /// 设置数量列，`None` 表示清空
    pub fn set_column_value(&mut self, key: &str, value: Option<i64>) -> AppResult<()> {
        ensure_quantity_column(key)?;
        match value {
            Some(v) => {
                self.values.insert(key.to_string(), v);
            }
            None => {
                self.values.remove(key);
            }
        }
        Ok(())
    }

    /// 任意已知列是否已有值
    pub fn has_value(&self, key: &str) -> AppResult<bool> {
        let definition = column_definition(key)
            .ok_or_else(|| AppError::illegal_state(format!("Unknown line item column: {}", key)))?;

        Ok(match definition.kind {
            ColumnKind::Quantity => self.values.contains_key(key),
            ColumnKind::Text => self.text_value(key)?.is_some_and(|t| !t.trim().is_empty()),
            ColumnKind::Money => key != TOTAL_COST || self.total_cost.is_some(),
            ColumnKind::Flag | ColumnKind::Reference => true,
        })
    }

    /// 文本列的值
    pub fn text_value(&self, key: &str) -> AppResult<Option<&str>> {
        match key {
            REMARKS => Ok(self.remarks()),
            REQUESTED_QUANTITY_EXPLANATION => Ok(self.requested_quantity_explanation()),
            other => Err(AppError::illegal_state(format!(
                "Column {} is not a text column",
                other
            ))),
        }
    }

    /// 设置文本列，空白视为清空
    pub fn set_text_value(&mut self, key: &str, value: Option<String>) -> AppResult<()> {
        let value = value.filter(|v| !v.trim().is_empty());
        match key {
            REMARKS => self.remarks = value,
            REQUESTED_QUANTITY_EXPLANATION => self.requested_quantity_explanation = value,
            other => {
                return Err(AppError::illegal_state(format!(
                    "Column {} is not a text column",
                    other
                )));
            }
        }
        Ok(())
    }

    /// 计算 `key` 所需的录入字段是否全部为空
    ///
    /// 用于区分“缺少输入没有算出值”与“算出的值恰好为 0”
    pub fn all_required_calc_fields_not_filled(&self, key: &str) -> bool {
        let fields = required_calc_fields(key);
        !fields.is_empty() && fields.iter().all(|field| self.value(field).is_none())
    }

    // ========== 常用字段 ==========

    pub fn beginning_balance(&self) -> Option<i64> {
        self.value(BEGINNING_BALANCE)
    }

    pub fn total_received_quantity(&self) -> Option<i64> {
        self.value(TOTAL_RECEIVED_QUANTITY)
    }

    pub fn total_consumed_quantity(&self) -> Option<i64> {
        self.value(TOTAL_CONSUMED_QUANTITY)
    }

    pub fn total_losses_and_adjustments(&self) -> Option<i64> {
        self.value(TOTAL_LOSSES_AND_ADJUSTMENTS)
    }

    pub fn stock_on_hand(&self) -> Option<i64> {
        self.value(STOCK_ON_HAND)
    }

    pub fn total_stockout_days(&self) -> Option<i64> {
        self.value(TOTAL_STOCKOUT_DAYS)
    }

    pub fn requested_quantity(&self) -> Option<i64> {
        self.value(REQUESTED_QUANTITY)
    }

    pub fn approved_quantity(&self) -> Option<i64> {
        self.value(APPROVED_QUANTITY)
    }

    pub fn calculated_order_quantity(&self) -> Option<i64> {
        self.value(CALCULATED_ORDER_QUANTITY)
    }

    pub fn adjusted_consumption(&self) -> Option<i64> {
        self.value(ADJUSTED_CONSUMPTION)
    }

    pub fn average_consumption(&self) -> Option<i64> {
        self.value(AVERAGE_CONSUMPTION)
    }

    pub fn maximum_stock_quantity(&self) -> Option<i64> {
        self.value(MAXIMUM_STOCK_QUANTITY)
    }

    pub fn packs_to_ship(&self) -> Option<i64> {
        self.value(PACKS_TO_SHIP)
    }

    // ========== 修改 ==========

    /// 跳过该行，仅全供应产品可跳过
    pub fn skip(&mut self) -> bool {
        if self.non_full_supply {
            return false;
        }
        self.skipped = true;
        true
    }

    pub fn unskip(&mut self) {
        self.skipped = false;
    }

    pub(crate) fn set_total_cost(&mut self, total_cost: Option<Money>) {
        self.total_cost = total_cost;
    }

    pub(crate) fn set_previous_adjusted_consumptions(&mut self, history: Vec<i64>) {
        self.previous_adjusted_consumptions = history;
    }
}

fn ensure_quantity_column(key: &str) -> AppResult<()> {
    match column_definition(key) {
        Some(d) if d.kind == ColumnKind::Quantity => Ok(()),
        Some(_) => Err(AppError::illegal_state(format!(
            "Column {} is not a quantity column",
            key
        ))),
        None => Err(AppError::illegal_state(format!(
            "Unknown line item column: {}",
            key
        ))),
    }
}

/// 计算某列需要的录入字段
fn required_calc_fields(key: &str) -> &'static [&'static str] {
    match key {
        TOTAL_CONSUMED_QUANTITY => &[STOCK_ON_HAND],
        STOCK_ON_HAND => &[TOTAL_CONSUMED_QUANTITY],
        TOTAL_RECEIVED_QUANTITY => &[TOTAL_RECEIVED_QUANTITY],
        TOTAL => &[BEGINNING_BALANCE, TOTAL_RECEIVED_QUANTITY],
        ADJUSTED_CONSUMPTION => &[TOTAL_CONSUMED_QUANTITY],
        CALCULATED_ORDER_QUANTITY => &[STOCK_ON_HAND],
        TOTAL_COST => &[PACKS_TO_SHIP],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> RequisitionLineItem {
        RequisitionLineItem::full_supply(
            OrderableId::new(),
            PackagingRules::default(),
            Money::from_minor_units(250),
            Decimal::from(3),
        )
    }

    #[test]
    fn test_absent_value_is_null_not_zero() {
        let mut item = item();
        assert_eq!(item.stock_on_hand(), None);

        item.set_column_value(STOCK_ON_HAND, Some(0)).unwrap();
        assert_eq!(item.stock_on_hand(), Some(0));

        item.set_column_value(STOCK_ON_HAND, None).unwrap();
        assert_eq!(item.stock_on_hand(), None);
    }

    #[test]
    fn test_unknown_column_is_illegal_state() {
        let mut item = item();
        assert!(matches!(item.column_value("bogus"), Err(AppError::IllegalState(_))));
        assert!(matches!(
            item.set_column_value("bogus", Some(1)),
            Err(AppError::IllegalState(_))
        ));
        assert!(matches!(
            item.set_column_value(REMARKS, Some(1)),
            Err(AppError::IllegalState(_))
        ));
        assert!(matches!(item.has_value("bogus"), Err(AppError::IllegalState(_))));
    }

    #[test]
    fn test_required_calc_fields() {
        let mut item = item();
        assert!(item.all_required_calc_fields_not_filled(TOTAL_CONSUMED_QUANTITY));
        assert!(item.all_required_calc_fields_not_filled(TOTAL_RECEIVED_QUANTITY));

        item.set_column_value(STOCK_ON_HAND, Some(0)).unwrap();
        assert!(!item.all_required_calc_fields_not_filled(TOTAL_CONSUMED_QUANTITY));

        item.set_column_value(TOTAL_RECEIVED_QUANTITY, Some(0)).unwrap();
        assert!(!item.all_required_calc_fields_not_filled(TOTAL_RECEIVED_QUANTITY));
        assert!(!item.all_required_calc_fields_not_filled(TOTAL));

        assert!(!item.all_required_calc_fields_not_filled(REMARKS));
    }

    #[test]
    fn test_text_values() {
        let mut item = item();
        assert!(!item.has_value(REMARKS).unwrap());

        item.set_text_value(REMARKS, Some("checked".into())).unwrap();
        assert_eq!(item.remarks(), Some("checked"));
        assert!(item.has_value(REMARKS).unwrap());

        item.set_text_value(REMARKS, Some("   ".into())).unwrap();
        assert_eq!(item.remarks(), None);
        assert!(item.set_text_value(STOCK_ON_HAND, None).is_err());
    }

    #[test]
    fn test_only_full_supply_can_be_skipped() {
        let mut full = item();
        assert!(full.skip());
        assert!(full.is_skipped());
        full.unskip();
        assert!(!full.is_skipped());

        let mut nfs = RequisitionLineItem::non_full_supply(
            OrderableId::new(),
            PackagingRules::default(),
            Money::zero(),
            Decimal::ONE,
        );
        assert!(nfs.is_non_full_supply());
        assert!(!nfs.skip());
        assert!(!nfs.is_skipped());
    }

    #[test]
    fn test_parts_round_trip() {
        let mut item = item();
        item.set_column_value(BEGINNING_BALANCE, Some(12)).unwrap();
        let copy = RequisitionLineItem::restore(item.clone().into_parts());
        assert_eq!(copy, item);
    }
}
