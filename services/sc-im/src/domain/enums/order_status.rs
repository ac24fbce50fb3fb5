//! 订单业务状态枚举

use serde::{Deserialize, Serialize};

/// 订单业务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// 进行中（参与库存预留）
    #[default]
    Open,
    /// 已关闭
    Closed,
    /// 已取消
    Cancelled,
}

impl OrderStatus {
    /// 终态订单不再预留库存
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Closed | OrderStatus::Cancelled)
    }
}

impl From<i16> for OrderStatus {
    fn from(value: i16) -> Self {
        match value {
            2 => OrderStatus::Closed,
            3 => OrderStatus::Cancelled,
            _ => OrderStatus::Open,
        }
    }
}

impl From<OrderStatus> for i16 {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Open => 1,
            OrderStatus::Closed => 2,
            OrderStatus::Cancelled => 3,
        }
    }
}
