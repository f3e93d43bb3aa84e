//! 供货机构

use lmis_errors::{AppResult, FieldErrors, Message};

use super::single;
use crate::domain::messages::{ERROR_SUPPLYING_FACILITY_REQUIRED, FIELD_SUPPLYING_FACILITY};
use crate::domain::validation::ValidationContext;

/// 转订单前必须已指定供货机构
pub(crate) fn validate(ctx: &ValidationContext<'_>) -> AppResult<FieldErrors> {
    let missing = ctx.requisition.supplying_facility_id().is_none();
    Ok(single(
        FIELD_SUPPLYING_FACILITY,
        missing.then(|| Message::new(ERROR_SUPPLYING_FACILITY_REQUIRED)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enums::RequisitionStatus;
    use crate::domain::validation::rules::fixtures::*;
    use crate::domain::value_objects::FacilityId;
    use chrono::Utc;
    use lmis_domain_core::UserId;

    #[test]
    fn test_supplying_facility_required() {
        let template = template(vec![]);
        let settings = settings();
        let mut requisition = requisition(vec![]);

        let ctx = ValidationContext::new(&requisition, &template, RequisitionStatus::Released, &settings);
        assert!(
            validate(&ctx)
                .unwrap()
                .contains(FIELD_SUPPLYING_FACILITY, ERROR_SUPPLYING_FACILITY_REQUIRED)
        );

        requisition.apply_status_change(RequisitionStatus::Approved, &UserId::new(), Utc::now());
        requisition.assign_supplying_facility(FacilityId::new()).unwrap();
        let ctx = ValidationContext::new(&requisition, &template, RequisitionStatus::Released, &settings);
        assert!(validate(&ctx).unwrap().is_empty());
    }
}
