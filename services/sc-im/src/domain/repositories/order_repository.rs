//! 订单仓储接口
//!
//! 订单主数据归销售服务，此处只消费读 + 出货计数回写的窄契约

use async_trait::async_trait;
use errors::AppResult;

use crate::domain::entities::Order;
use crate::domain::value_objects::OrderId;

/// 订单仓储接口
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 按 ID 查找（带订单行）
    async fn find_by_id(&self, id: &OrderId) -> AppResult<Option<Order>>;

    /// 全部未终态订单（重算预留用）
    async fn list_open(&self) -> AppResult<Vec<Order>>;

    /// 保存订单（新建）
    async fn save(&self, order: &Order) -> AppResult<()>;

    /// 回写出货计数与状态
    async fn update(&self, order: &Order) -> AppResult<()>;
}
