//! 库存品类枚举

use serde::{Deserialize, Serialize};

/// 库存品类
///
/// 匹布按连续数量（米）管理并登记到具体布卷；
/// 计件成品只按件数管理，按配色组/裁切规格分组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemClass {
    /// 匹布（按米计量）
    Bulk,
    /// 计件成品（按件计量）
    Count,
}

impl ItemClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemClass::Bulk => "bulk",
            ItemClass::Count => "count",
        }
    }

    pub fn is_bulk(&self) -> bool {
        matches!(self, ItemClass::Bulk)
    }
}

impl From<i16> for ItemClass {
    fn from(value: i16) -> Self {
        match value {
            2 => ItemClass::Count,
            _ => ItemClass::Bulk,
        }
    }
}

impl From<ItemClass> for i16 {
    fn from(class: ItemClass) -> Self {
        match class {
            ItemClass::Bulk => 1,
            ItemClass::Count => 2,
        }
    }
}
