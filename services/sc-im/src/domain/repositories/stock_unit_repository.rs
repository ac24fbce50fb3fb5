//! 布卷仓储接口

use async_trait::async_trait;
use errors::AppResult;

use crate::domain::entities::StockUnit;
use crate::domain::value_objects::{DesignId, FactoryId, QualityId, StockUnitId};

/// 在库布卷查询条件
#[derive(Debug, Clone, Default)]
pub struct UnitFilter {
    pub quality_id: Option<QualityId>,
    pub design_id: Option<DesignId>,
    pub factory_id: Option<FactoryId>,
}

/// 布卷仓储接口
#[async_trait]
pub trait StockUnitRepository: Send + Sync {
    /// 按 ID 查找
    async fn find_by_id(&self, id: &StockUnitId) -> AppResult<Option<StockUnit>>;

    /// 按 ID 批量查找
    async fn find_by_ids(&self, ids: &[StockUnitId]) -> AppResult<Vec<StockUnit>>;

    /// 按条件列出在库可售布卷
    async fn list_available(&self, filter: &UnitFilter) -> AppResult<Vec<StockUnit>>;

    /// 全部布卷（重算用）
    async fn list_all(&self) -> AppResult<Vec<StockUnit>>;

    /// 保存布卷（新建）
    async fn save(&self, unit: &StockUnit) -> AppResult<()>;

    /// 更新布卷
    async fn update(&self, unit: &StockUnit) -> AppResult<()>;
}
