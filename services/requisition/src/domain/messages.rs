//! 消息键
//!
//! 文本模板见 `api::messages::MessageCatalogue`

pub const ERROR_VALUE_MUST_BE_ENTERED: &str = "requisition.error.validation.valueMustBeEntered";
pub const ERROR_MUST_BE_NON_NEGATIVE: &str = "requisition.error.validation.mustBeNonNegative";
pub const ERROR_FIELD_MUST_HAVE_VALUES: &str = "requisition.error.validation.fieldMustHaveValues";
pub const ERROR_STOCK_ON_HAND_INCONSISTENT: &str =
    "requisition.error.validation.stockOnHandInconsistent";
pub const ERROR_STOCKOUT_DAYS_EXCEED_PERIOD: &str =
    "requisition.error.validation.stockoutDaysCantBeGreaterThanLengthOfPeriod";
pub const ERROR_EXPLANATION_REQUIRED: &str =
    "requisition.error.validation.requestedQuantityExplanationRequired";
pub const ERROR_SUPPLYING_FACILITY_REQUIRED: &str =
    "requisition.error.validation.supplyingFacilityRequired";
pub const ERROR_CANNOT_SKIP_EMERGENCY: &str = "requisition.error.skip.emergencyRequisition";
pub const ERROR_CANNOT_SKIP_NON_FULL_SUPPLY: &str = "requisition.error.skip.nonFullSupplyLineItem";
pub const ERROR_SKIP_NOT_ALLOWED: &str = "requisition.error.skip.notAllowedByTemplate";

pub const ERROR_STATUS_TRANSITION_NOT_ALLOWED: &str = "requisition.error.status.transitionNotAllowed";
pub const ERROR_CANNOT_UPDATE_WITH_STATUS: &str = "requisition.error.update.cannotUpdateWithStatus";
pub const ERROR_CALCULATED_FIELD_NOT_EDITABLE: &str = "requisition.error.update.calculatedFieldNotEditable";
pub const ERROR_FIELD_NOT_EDITABLE: &str = "requisition.error.update.fieldNotEditable";
pub const ERROR_COLUMN_NOT_IN_TEMPLATE: &str = "requisition.error.update.columnNotInTemplate";
pub const ERROR_LINE_ITEM_NOT_FOUND: &str = "requisition.error.update.lineItemNotFound";
pub const ERROR_NON_FULL_SUPPLY_NOT_AVAILABLE: &str =
    "requisition.error.update.nonFullSupplyProductNotAvailable";
pub const ERROR_DATE_STOCK_COUNT_IN_FUTURE: &str =
    "requisition.error.update.datePhysicalStockCountCompletedInFuture";

pub const ERROR_FACILITY_DOES_NOT_SUPPORT_PROGRAM: &str =
    "requisition.error.initiate.facilityDoesNotSupportProgram";
pub const ERROR_REQUISITION_ALREADY_EXISTS: &str = "requisition.error.initiate.alreadyExists";

pub const ERROR_SEARCH_INVALID_PARAMS: &str = "requisition.error.search.invalidParams";
pub const ERROR_INVALID_REQUISITION_STATUS: &str = "requisition.error.search.invalidStatus";
pub const ERROR_INVALID_SEARCH_PARAM_VALUE: &str = "requisition.error.search.invalidParamValue";

pub const ERROR_SUPPLYING_FACILITY_NOT_AVAILABLE: &str =
    "requisition.error.convert.supplyingFacilityNotAvailable";

pub const ERROR_REJECTION_REASON_CATEGORY_NAME_REQUIRED: &str =
    "requisition.error.rejectionReasonCategory.nameRequired";
pub const ERROR_REJECTION_REASON_CATEGORY_CODE_REQUIRED: &str =
    "requisition.error.rejectionReasonCategory.codeRequired";

pub const ERROR_VERSION_MISMATCH: &str = "requisition.error.versionMismatch";

/// 状态字段
pub const FIELD_STATUS: &str = "status";
pub const FIELD_SUPPLYING_FACILITY: &str = "supplyingFacility";
pub const FIELD_EMERGENCY: &str = "emergency";
pub const FIELD_FACILITY: &str = "facility";
pub const FIELD_DATE_PHYSICAL_STOCK_COUNT: &str = "datePhysicalStockCountCompleted";
pub const FIELD_NAME: &str = "name";
pub const FIELD_CODE: &str = "code";
