//! 订单出货状态枚举

use serde::{Deserialize, Serialize};

/// 订单出货状态
///
/// 状态机只进不退：pending → partial → completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DispatchStatus {
    /// 未出货
    #[default]
    Pending,
    /// 部分出货
    Partial,
    /// 全部出货
    Completed,
}

impl DispatchStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, DispatchStatus::Completed)
    }

    /// 状态机序号，用于单调推进判断
    pub fn rank(&self) -> u8 {
        match self {
            DispatchStatus::Pending => 0,
            DispatchStatus::Partial => 1,
            DispatchStatus::Completed => 2,
        }
    }
}

impl From<i16> for DispatchStatus {
    fn from(value: i16) -> Self {
        match value {
            2 => DispatchStatus::Partial,
            3 => DispatchStatus::Completed,
            _ => DispatchStatus::Pending,
        }
    }
}

impl From<DispatchStatus> for i16 {
    fn from(status: DispatchStatus) -> Self {
        match status {
            DispatchStatus::Pending => 1,
            DispatchStatus::Partial => 2,
            DispatchStatus::Completed => 3,
        }
    }
}
