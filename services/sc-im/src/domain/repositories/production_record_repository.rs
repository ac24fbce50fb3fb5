//! 生产记录仓储接口

use async_trait::async_trait;
use errors::AppResult;

use crate::domain::entities::ProductionRecord;

/// 生产记录仓储接口
#[async_trait]
pub trait ProductionRecordRepository: Send + Sync {
    /// 追加生产记录（不可变，只增不改）
    async fn save(&self, record: &ProductionRecord) -> AppResult<()>;

    /// 全部历史生产记录（重算用）
    async fn list_all(&self) -> AppResult<Vec<ProductionRecord>>;
}
