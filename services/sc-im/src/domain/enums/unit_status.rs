//! 布卷状态枚举

use serde::{Deserialize, Serialize};

/// 布卷状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UnitStatus {
    /// 在库可售
    #[default]
    Available,
    /// 已随出货单售出
    Sold,
}

impl UnitStatus {
    pub fn is_sold(&self) -> bool {
        matches!(self, UnitStatus::Sold)
    }
}

impl From<i16> for UnitStatus {
    fn from(value: i16) -> Self {
        match value {
            2 => UnitStatus::Sold,
            _ => UnitStatus::Available,
        }
    }
}

impl From<UnitStatus> for i16 {
    fn from(status: UnitStatus) -> Self {
        match status {
            UnitStatus::Available => 1,
            UnitStatus::Sold => 2,
        }
    }
}
