//! 库存记录仓储接口

use async_trait::async_trait;
use errors::AppResult;

use crate::domain::entities::InventoryRecord;
use crate::domain::value_objects::{
    ColorGroupId, DesignId, InventoryRecordId, QualityId, StockPartition,
};

/// 库存记录仓储接口
#[async_trait]
pub trait InventoryRecordRepository: Send + Sync {
    /// 按分区键精确查找
    async fn find_by_partition(
        &self,
        partition: &StockPartition,
    ) -> AppResult<Option<InventoryRecord>>;

    /// 同品质的全部匹布记录（跨工厂）
    async fn find_bulk_by_quality(&self, quality_id: &QualityId)
    -> AppResult<Vec<InventoryRecord>>;

    /// 同品质/花型/配色组的全部计件记录（跨工厂，不过滤裁切规格）
    async fn find_count_by_group(
        &self,
        quality_id: &QualityId,
        design_id: &DesignId,
        color_group_id: &ColorGroupId,
    ) -> AppResult<Vec<InventoryRecord>>;

    /// 全部记录（重算用）
    async fn list_all(&self) -> AppResult<Vec<InventoryRecord>>;

    /// 保存记录（新建）
    async fn save(&self, record: &InventoryRecord) -> AppResult<()>;

    /// 更新记录
    async fn update(&self, record: &InventoryRecord) -> AppResult<()>;

    /// 删除记录（仅重算器清理孤儿记录时使用）
    async fn delete(&self, id: &InventoryRecordId) -> AppResult<()>;
}
