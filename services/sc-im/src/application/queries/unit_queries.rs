//! 布卷查询

use cqrs_core::Query;

use crate::domain::entities::StockUnit;
use crate::domain::value_objects::{DesignId, FactoryId, QualityId};

/// 在库布卷列表查询
#[derive(Debug, Clone, Default)]
pub struct ListAvailableUnitsQuery {
    pub quality_id: Option<QualityId>,
    pub design_id: Option<DesignId>,
    pub factory_id: Option<FactoryId>,
}

impl Query for ListAvailableUnitsQuery {
    type Result = Vec<StockUnit>;
}
