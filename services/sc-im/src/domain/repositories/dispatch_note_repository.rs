//! 出货单仓储接口

use async_trait::async_trait;
use errors::AppResult;

use crate::domain::entities::DispatchNote;
use crate::domain::value_objects::DispatchNoteId;

/// 出货单仓储接口
#[async_trait]
pub trait DispatchNoteRepository: Send + Sync {
    /// 按 ID 查找
    async fn find_by_id(&self, id: &DispatchNoteId) -> AppResult<Option<DispatchNote>>;

    /// 保存出货单（新建）
    async fn save(&self, note: &DispatchNote) -> AppResult<()>;

    /// 全部历史出货单（重算用）
    async fn list_all(&self) -> AppResult<Vec<DispatchNote>>;
}
