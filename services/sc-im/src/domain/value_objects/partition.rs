//! 库存分区键

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::domain::enums::ItemClass;
use crate::domain::value_objects::{ColorGroupId, DesignId, FactoryId, QualityId};

/// 裁切规格（计件库存的二级维度）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[display("{_0}")]
pub struct SubCut(pub String);

impl SubCut {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

/// 库存分区键
///
/// 每条库存记录对应一个分区：
/// `(item_class, quality, design, factory, color_group, sub_cut)`。
/// 匹布（按米计）只用到 quality 和 factory；
/// 计件成品还带 design、color_group 和可选的 sub_cut。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockPartition {
    pub item_class: ItemClass,
    pub quality_id: QualityId,
    pub design_id: Option<DesignId>,
    pub factory_id: FactoryId,
    pub color_group_id: Option<ColorGroupId>,
    pub sub_cut: Option<SubCut>,
}

impl StockPartition {
    /// 匹布分区
    pub fn bulk(quality_id: QualityId, factory_id: FactoryId) -> Self {
        Self {
            item_class: ItemClass::Bulk,
            quality_id,
            design_id: None,
            factory_id,
            color_group_id: None,
            sub_cut: None,
        }
    }

    /// 计件分区
    pub fn count(
        quality_id: QualityId,
        design_id: DesignId,
        factory_id: FactoryId,
        color_group_id: ColorGroupId,
        sub_cut: Option<SubCut>,
    ) -> Self {
        Self {
            item_class: ItemClass::Count,
            quality_id,
            design_id: Some(design_id),
            factory_id,
            color_group_id: Some(color_group_id),
            sub_cut,
        }
    }

    /// 校验阶段的匹布匹配：同品质即可，工厂刻意不限
    /// （扣减允许从任意工厂取货，见配货引擎）
    pub fn matches_bulk_quality(&self, quality_id: &QualityId) -> bool {
        self.item_class == ItemClass::Bulk && &self.quality_id == quality_id
    }

    /// 校验阶段的计件匹配：品质 + 花型 + 配色组，不含裁切规格
    pub fn matches_count_group(
        &self,
        quality_id: &QualityId,
        design_id: &DesignId,
        color_group_id: &ColorGroupId,
    ) -> bool {
        self.item_class == ItemClass::Count
            && &self.quality_id == quality_id
            && self.design_id.as_ref() == Some(design_id)
            && self.color_group_id.as_ref() == Some(color_group_id)
    }

    /// 扣减阶段的计件匹配：在配色组之上再精确匹配裁切规格
    pub fn matches_count_partition(
        &self,
        quality_id: &QualityId,
        design_id: &DesignId,
        color_group_id: &ColorGroupId,
        sub_cut: Option<&SubCut>,
    ) -> bool {
        self.matches_count_group(quality_id, design_id, color_group_id)
            && self.sub_cut.as_ref() == sub_cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_match_ignores_factory() {
        let quality = QualityId::new();
        let a = StockPartition::bulk(quality.clone(), FactoryId::new());
        let b = StockPartition::bulk(quality.clone(), FactoryId::new());
        assert!(a.matches_bulk_quality(&quality));
        assert!(b.matches_bulk_quality(&quality));
    }

    #[test]
    fn test_count_group_match_ignores_sub_cut() {
        let quality = QualityId::new();
        let design = DesignId::new();
        let group = ColorGroupId::new();
        let with_cut = StockPartition::count(
            quality.clone(),
            design.clone(),
            FactoryId::new(),
            group.clone(),
            Some(SubCut::new("3.2m")),
        );
        assert!(with_cut.matches_count_group(&quality, &design, &group));
        assert!(!with_cut.matches_count_partition(&quality, &design, &group, None));
        assert!(with_cut.matches_count_partition(
            &quality,
            &design,
            &group,
            Some(&SubCut::new("3.2m"))
        ));
    }

    #[test]
    fn test_bulk_does_not_match_count_group() {
        let quality = QualityId::new();
        let partition = StockPartition::bulk(quality.clone(), FactoryId::new());
        assert!(!partition.matches_count_group(&quality, &DesignId::new(), &ColorGroupId::new()));
    }
}
