//! 库存查询

use cqrs_core::Query;

use crate::domain::entities::DispatchLineItem;
use crate::domain::services::StockValidation;

/// 库存充足性校验查询（只读，不持配货锁）
#[derive(Debug, Clone)]
pub struct ValidateStockQuery {
    pub line_items: Vec<DispatchLineItem>,
}

impl Query for ValidateStockQuery {
    type Result = StockValidation;
}
