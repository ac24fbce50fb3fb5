//! 布卷实体

use common::AuditInfo;
use domain_core::{AggregateRoot, Entity, Quantity};
use errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::enums::UnitStatus;
use crate::domain::value_objects::{DispatchNoteId, StockPartition, StockUnitId};

/// 布卷实体
///
/// 物理编号的单卷匹布，带自身携带的米数。
/// 不变式：`status == Sold ⟺ dispatch_note_id != None`，
/// 状态只能通过本实体的方法变更以维持该不变式。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockUnit {
    /// 布卷 ID
    id: StockUnitId,
    /// 物理卷号
    unit_no: String,
    /// 所属分区
    partition: StockPartition,
    /// 携带米数
    quantity: Quantity,
    /// 状态
    status: UnitStatus,
    /// 售出时关联的出货单
    dispatch_note_id: Option<DispatchNoteId>,
    /// 审计信息
    audit_info: AuditInfo,
}

impl StockUnit {
    pub fn new(unit_no: impl Into<String>, partition: StockPartition, quantity: Quantity) -> Self {
        Self {
            id: StockUnitId::new(),
            unit_no: unit_no.into(),
            partition,
            quantity,
            status: UnitStatus::Available,
            dispatch_note_id: None,
            audit_info: AuditInfo::default(),
        }
    }

    /// 从各部分构建（用于从数据库加载）
    pub fn from_parts(
        id: StockUnitId,
        unit_no: String,
        partition: StockPartition,
        quantity: Quantity,
        status: UnitStatus,
        dispatch_note_id: Option<DispatchNoteId>,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            unit_no,
            partition,
            quantity,
            status,
            dispatch_note_id,
            audit_info,
        }
    }

    // ========== Getters ==========

    pub fn id(&self) -> &StockUnitId {
        &self.id
    }

    pub fn unit_no(&self) -> &str {
        &self.unit_no
    }

    pub fn partition(&self) -> &StockPartition {
        &self.partition
    }

    pub fn quantity(&self) -> &Quantity {
        &self.quantity
    }

    pub fn status(&self) -> UnitStatus {
        self.status
    }

    pub fn dispatch_note_id(&self) -> Option<&DispatchNoteId> {
        self.dispatch_note_id.as_ref()
    }

    /// 不变式是否成立：Sold ⟺ 关联出货单
    pub fn is_status_consistent(&self) -> bool {
        self.status.is_sold() == self.dispatch_note_id.is_some()
    }

    // ========== 状态变更 ==========

    /// 随出货单售出
    ///
    /// 一卷布在出货单之间互斥：已随其他出货单售出时报冲突
    pub fn mark_sold(&mut self, dispatch_note_id: DispatchNoteId) -> AppResult<()> {
        if self.status.is_sold() && self.dispatch_note_id.as_ref() != Some(&dispatch_note_id) {
            return Err(AppError::conflict(format!(
                "布卷 {} 已随其他出货单售出",
                self.unit_no
            )));
        }
        self.status = UnitStatus::Sold;
        self.dispatch_note_id = Some(dispatch_note_id);
        self.audit_info.update(None);
        Ok(())
    }

    /// 回到在库可售状态，清除出货单关联
    pub fn mark_available(&mut self) {
        self.status = UnitStatus::Available;
        self.dispatch_note_id = None;
        self.audit_info.update(None);
    }

    /// 显式设置状态（SetUnitStatus 操作）
    ///
    /// 置 Sold 必须带出货单；置 Available 会清除关联
    pub fn set_status(
        &mut self,
        status: UnitStatus,
        dispatch_note_id: Option<DispatchNoteId>,
    ) -> AppResult<()> {
        match status {
            UnitStatus::Sold => {
                let note = dispatch_note_id.ok_or_else(|| {
                    AppError::validation("置为已售必须关联出货单")
                })?;
                self.mark_sold(note)
            }
            UnitStatus::Available => {
                self.mark_available();
                Ok(())
            }
        }
    }

    /// 按出货单关联重新推导状态（重算器第 7 步），返回是否修正
    pub fn resync_status(&mut self) -> bool {
        if self.is_status_consistent() {
            return false;
        }
        self.status = if self.dispatch_note_id.is_some() {
            UnitStatus::Sold
        } else {
            UnitStatus::Available
        };
        self.audit_info.update(None);
        true
    }
}

impl Entity for StockUnit {
    type Id = StockUnitId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for StockUnit {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{FactoryId, QualityId};
    use domain_core::Unit;

    fn unit() -> StockUnit {
        StockUnit::new(
            "TH-0001",
            StockPartition::bulk(QualityId::new(), FactoryId::new()),
            Quantity::from_decimal(110.0, Unit::meter()),
        )
    }

    #[test]
    fn test_mark_sold_sets_reference() {
        let mut u = unit();
        let note = DispatchNoteId::new();
        u.mark_sold(note.clone()).unwrap();
        assert!(u.status().is_sold());
        assert_eq!(u.dispatch_note_id(), Some(&note));
        assert!(u.is_status_consistent());
    }

    #[test]
    fn test_mark_sold_twice_same_note_is_idempotent() {
        let mut u = unit();
        let note = DispatchNoteId::new();
        u.mark_sold(note.clone()).unwrap();
        assert!(u.mark_sold(note).is_ok());
    }

    #[test]
    fn test_mark_sold_conflicts_across_notes() {
        let mut u = unit();
        u.mark_sold(DispatchNoteId::new()).unwrap();
        assert!(matches!(
            u.mark_sold(DispatchNoteId::new()),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_set_sold_requires_note() {
        let mut u = unit();
        assert!(matches!(
            u.set_status(UnitStatus::Sold, None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_resync_fixes_drift() {
        let mut u = unit();
        u.mark_sold(DispatchNoteId::new()).unwrap();
        // 模拟批量重算把状态写回 Available 但保留了关联
        u.status = UnitStatus::Available;
        assert!(!u.is_status_consistent());
        assert!(u.resync_status());
        assert!(u.status().is_sold());
        assert!(!u.resync_status());
    }
}
