//! 生产记录实体

use common::AuditInfo;
use domain_core::{AggregateRoot, Entity, Quantity};
use serde::{Deserialize, Serialize};

use crate::domain::enums::ItemClass;
use crate::domain::value_objects::{
    ColorGroupId, DesignId, FactoryId, ProductionId, QualityId, StockPartition, StockUnitId, SubCut,
};

/// 生产入库的配色组件数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducedPieceGroup {
    pub color_group_id: ColorGroupId,
    pub pieces: i64,
}

/// 生产记录
///
/// 不可变的入库凭证。匹布生产带总米数和当批新建的布卷；
/// 计件生产带按配色组拆分的件数，每个配色组落到各自的分区。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionRecord {
    /// 生产记录 ID
    id: ProductionId,
    /// 品类
    item_class: ItemClass,
    /// 布种
    quality_id: QualityId,
    /// 花型（计件）
    design_id: Option<DesignId>,
    /// 生产工厂
    factory_id: FactoryId,
    /// 裁切规格（计件）
    sub_cut: Option<SubCut>,
    /// 入库米数（匹布）
    bulk_qty: Option<Quantity>,
    /// 当批新建布卷（匹布）
    unit_ids: Vec<StockUnitId>,
    /// 按配色组拆分的件数（计件）
    piece_groups: Vec<ProducedPieceGroup>,
    /// 审计信息
    audit_info: AuditInfo,
}

impl ProductionRecord {
    /// 匹布生产
    pub fn bulk(
        quality_id: QualityId,
        factory_id: FactoryId,
        bulk_qty: Quantity,
        unit_ids: Vec<StockUnitId>,
    ) -> Self {
        Self {
            id: ProductionId::new(),
            item_class: ItemClass::Bulk,
            quality_id,
            design_id: None,
            factory_id,
            sub_cut: None,
            bulk_qty: Some(bulk_qty),
            unit_ids,
            piece_groups: Vec::new(),
            audit_info: AuditInfo::default(),
        }
    }

    /// 计件生产
    pub fn count(
        quality_id: QualityId,
        design_id: DesignId,
        factory_id: FactoryId,
        sub_cut: Option<SubCut>,
        piece_groups: Vec<ProducedPieceGroup>,
    ) -> Self {
        Self {
            id: ProductionId::new(),
            item_class: ItemClass::Count,
            quality_id,
            design_id: Some(design_id),
            factory_id,
            sub_cut,
            bulk_qty: None,
            unit_ids: Vec::new(),
            piece_groups,
            audit_info: AuditInfo::default(),
        }
    }

    /// 从各部分构建（用于从数据库加载）
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: ProductionId,
        item_class: ItemClass,
        quality_id: QualityId,
        design_id: Option<DesignId>,
        factory_id: FactoryId,
        sub_cut: Option<SubCut>,
        bulk_qty: Option<Quantity>,
        unit_ids: Vec<StockUnitId>,
        piece_groups: Vec<ProducedPieceGroup>,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            item_class,
            quality_id,
            design_id,
            factory_id,
            sub_cut,
            bulk_qty,
            unit_ids,
            piece_groups,
            audit_info,
        }
    }

    // ========== Getters ==========

    pub fn id(&self) -> &ProductionId {
        &self.id
    }

    pub fn item_class(&self) -> ItemClass {
        self.item_class
    }

    pub fn quality_id(&self) -> &QualityId {
        &self.quality_id
    }

    pub fn design_id(&self) -> Option<&DesignId> {
        self.design_id.as_ref()
    }

    pub fn factory_id(&self) -> &FactoryId {
        &self.factory_id
    }

    pub fn sub_cut(&self) -> Option<&SubCut> {
        self.sub_cut.as_ref()
    }

    pub fn bulk_qty(&self) -> Option<&Quantity> {
        self.bulk_qty.as_ref()
    }

    pub fn unit_ids(&self) -> &[StockUnitId] {
        &self.unit_ids
    }

    pub fn piece_groups(&self) -> &[ProducedPieceGroup] {
        &self.piece_groups
    }

    /// 匹布入库对应的分区
    pub fn bulk_partition(&self) -> Option<StockPartition> {
        if !self.item_class.is_bulk() {
            return None;
        }
        Some(StockPartition::bulk(
            self.quality_id.clone(),
            self.factory_id.clone(),
        ))
    }

    /// 计件入库对应的各分区及件数
    pub fn piece_partitions(&self) -> Vec<(StockPartition, i64)> {
        let Some(design_id) = self.design_id.clone() else {
            return Vec::new();
        };
        self.piece_groups
            .iter()
            .map(|group| {
                (
                    StockPartition::count(
                        self.quality_id.clone(),
                        design_id.clone(),
                        self.factory_id.clone(),
                        group.color_group_id.clone(),
                        self.sub_cut.clone(),
                    ),
                    group.pieces,
                )
            })
            .collect()
    }
}

impl Entity for ProductionRecord {
    type Id = ProductionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for ProductionRecord {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}
