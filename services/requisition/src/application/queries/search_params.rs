//! 搜索参数解析

use std::str::FromStr;

use chrono::{DateTime, Utc};
use lmis_common::Pagination;
use lmis_errors::{AppError, AppResult, FieldErrors, Message};

use super::{RequisitionsForConvertQuery, SearchRequisitionsQuery};
use crate::domain::enums::RequisitionStatus;
use crate::domain::messages::{
    ERROR_INVALID_REQUISITION_STATUS, ERROR_INVALID_SEARCH_PARAM_VALUE,
    ERROR_SEARCH_INVALID_PARAMS,
};
use crate::domain::repositories::RequisitionFilter;

pub const FACILITY: &str = "facility";
pub const PROGRAM: &str = "program";
pub const PROCESSING_PERIOD: &str = "processingPeriod";
pub const SUPERVISORY_NODE: &str = "supervisoryNode";
pub const REQUISITION_STATUS: &str = "requisitionStatus";
pub const EMERGENCY: &str = "emergency";
pub const INITIATED_DATE_FROM: &str = "initiatedDateFrom";
pub const INITIATED_DATE_TO: &str = "initiatedDateTo";
pub const MODIFIED_DATE_FROM: &str = "modifiedDateFrom";
pub const MODIFIED_DATE_TO: &str = "modifiedDateTo";
pub const PAGE: &str = "page";
pub const SIZE: &str = "size";

/// 把查询串键值对解析为搜索查询
///
/// `requisitionStatus` 可重复出现；所有错误一并返回
pub fn parse_search_params(
    params: &[(String, String)],
    default_page_size: u32,
) -> AppResult<SearchRequisitionsQuery> {
    let mut filter = RequisitionFilter::default();
    let mut page = 0;
    let mut size = default_page_size;
    let mut errors = FieldErrors::new();

    for (key, value) in params {
        let value = value.trim();
        let result = match key.as_str() {
            FACILITY => parse(key, value).map(|v| filter.facility_id = Some(v)),
            PROGRAM => parse(key, value).map(|v| filter.program_id = Some(v)),
            PROCESSING_PERIOD => parse(key, value).map(|v| filter.processing_period_id = Some(v)),
            SUPERVISORY_NODE => parse(key, value).map(|v| filter.supervisory_node_id = Some(v)),
            REQUISITION_STATUS => RequisitionStatus::from_str(value)
                .map(|status| filter.statuses.push(status))
                .map_err(|_| Message::new(ERROR_INVALID_REQUISITION_STATUS).param(value)),
            EMERGENCY => parse(key, value).map(|v| filter.emergency = Some(v)),
            INITIATED_DATE_FROM => parse(key, value).map(|v| filter.initiated_date_from = Some(v)),
            INITIATED_DATE_TO => parse(key, value).map(|v| filter.initiated_date_to = Some(v)),
            MODIFIED_DATE_FROM => {
                parse_date_time(key, value).map(|v| filter.modified_date_from = Some(v))
            }
            MODIFIED_DATE_TO => parse_date_time(key, value).map(|v| filter.modified_date_to = Some(v)),
            PAGE => parse(key, value).map(|v| page = v),
            SIZE => parse(key, value).map(|v| size = v),
            _ => Err(Message::new(ERROR_SEARCH_INVALID_PARAMS).param(key)),
        };

        if let Err(message) = result {
            errors.add(key.as_str(), message);
        }
    }

    if !errors.is_empty() {
        return Err(AppError::invalid_fields(errors));
    }

    Ok(SearchRequisitionsQuery {
        filter,
        pagination: Pagination::new(page, size),
    })
}

/// 待转订单列表的查询串，只接受 `facility`、`program` 与分页参数
pub fn parse_convert_params(
    params: &[(String, String)],
    default_page_size: u32,
) -> AppResult<RequisitionsForConvertQuery> {
    let mut query = RequisitionsForConvertQuery::default();
    let mut page = 0;
    let mut size = default_page_size;
    let mut errors = FieldErrors::new();

    for (key, value) in params {
        let value = value.trim();
        let result = match key.as_str() {
            FACILITY => parse(key, value).map(|v| query.facility_id = Some(v)),
            PROGRAM => parse(key, value).map(|v| query.program_id = Some(v)),
            PAGE => parse(key, value).map(|v| page = v),
            SIZE => parse(key, value).map(|v| size = v),
            _ => Err(Message::new(ERROR_SEARCH_INVALID_PARAMS).param(key)),
        };
        if let Err(message) = result {
            errors.add(key.as_str(), message);
        }
    }

    if !errors.is_empty() {
        return Err(AppError::invalid_fields(errors));
    }
    query.pagination = Pagination::new(page, size);
    Ok(query)
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, Message> {
    value.parse().map_err(|_| invalid_value(key, value))
}

fn parse_date_time(key: &str, value: &str) -> Result<DateTime<Utc>, Message> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid_value(key, value))
}

fn invalid_value(key: &str, value: &str) -> Message {
    Message::new(ERROR_INVALID_SEARCH_PARAM_VALUE)
        .param(key)
        .param(value)
}
