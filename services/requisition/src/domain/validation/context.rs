//! 校验上下文

use crate::domain::calculation::CalculationSettings;
use crate::domain::entities::{Requisition, RequisitionTemplate};
use crate::domain::enums::RequisitionStatus;

/// 一次状态转换校验所需的全部输入
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// 已重算的工作副本
    pub requisition: &'a Requisition,
    pub template: &'a RequisitionTemplate,
    pub target: RequisitionStatus,
    pub settings: &'a CalculationSettings,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        requisition: &'a Requisition,
        template: &'a RequisitionTemplate,
        target: RequisitionStatus,
        settings: &'a CalculationSettings,
    ) -> Self {
        Self {
            requisition,
            template,
            target,
            settings,
        }
    }

    /// 本期总天数
    pub fn days_in_period(&self) -> i64 {
        i64::from(self.requisition.number_of_months_in_period())
            * i64::from(self.settings.days_in_month)
    }
}
