//! 出货单（challan）实体

use common::AuditInfo;
use domain_core::{AggregateRoot, Entity, Quantity};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    ColorGroupId, DesignId, DispatchNoteId, OrderId, QualityId, StockUnitId, SubCut,
};

/// 计件出货的配色组需求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorGroupRequest {
    pub color_group_id: ColorGroupId,
    pub pieces: i64,
}

/// 匹布出货行
///
/// 调用方要么显式指定米数，要么预选布卷——
/// 预选时所需米数为布卷携带米数之和
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDispatchLine {
    pub quality_id: QualityId,
    pub bulk_qty: Option<Quantity>,
    pub unit_ids: Vec<StockUnitId>,
}

/// 计件出货行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountDispatchLine {
    pub quality_id: QualityId,
    pub design_id: DesignId,
    pub sub_cut: Option<SubCut>,
    pub groups: Vec<ColorGroupRequest>,
}

/// 出货行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DispatchLineItem {
    Bulk(BulkDispatchLine),
    Count(CountDispatchLine),
}

/// 出货单（challan）
///
/// 针对某订单的一张出库凭证
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchNote {
    /// 出货单 ID
    id: DispatchNoteId,
    /// 出货单号
    challan_no: String,
    /// 来源订单
    order_id: OrderId,
    /// 出货行
    line_items: Vec<DispatchLineItem>,
    /// 审计信息
    audit_info: AuditInfo,
}

impl DispatchNote {
    pub fn new(
        challan_no: impl Into<String>,
        order_id: OrderId,
        line_items: Vec<DispatchLineItem>,
    ) -> Self {
        Self {
            id: DispatchNoteId::new(),
            challan_no: challan_no.into(),
            order_id,
            line_items,
            audit_info: AuditInfo::default(),
        }
    }

    /// 从各部分构建（用于从数据库加载）
    pub fn from_parts(
        id: DispatchNoteId,
        challan_no: String,
        order_id: OrderId,
        line_items: Vec<DispatchLineItem>,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            challan_no,
            order_id,
            line_items,
            audit_info,
        }
    }

    // ========== Getters ==========

    pub fn id(&self) -> &DispatchNoteId {
        &self.id
    }

    pub fn challan_no(&self) -> &str {
        &self.challan_no
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn line_items(&self) -> &[DispatchLineItem] {
        &self.line_items
    }
}

impl Entity for DispatchNote {
    type Id = DispatchNoteId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for DispatchNote {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}
