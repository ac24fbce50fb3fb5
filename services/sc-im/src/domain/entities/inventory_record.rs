//! 库存记录聚合根

use common::AuditInfo;
use domain_core::{AggregateRoot, Entity, Quantity, Unit};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{InventoryRecordId, StockPartition};

/// 库存记录聚合根
///
/// 每个分区一行的去规范化计数器。produced 为累计在库量
/// （生产累加、出货扣减后的余额），reserved 为未出货订单的预留量。
/// 静止状态下所有计数器均不为负；扣减中途的负值一律截断，绝不落库。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// 记录 ID
    id: InventoryRecordId,
    /// 分区键
    partition: StockPartition,
    /// 在库匹布米数
    produced_bulk: Quantity,
    /// 在库布卷数（仅匹布有意义）
    produced_unit_count: i64,
    /// 在库件数（仅计件成品有意义）
    produced_piece_qty: i64,
    /// 预留匹布米数
    reserved_bulk: Quantity,
    /// 预留布卷数（重算后恒为 0，见重算器）
    reserved_unit_count: i64,
    /// 预留件数
    reserved_piece_qty: i64,
    /// 审计信息
    audit_info: AuditInfo,
}

impl InventoryRecord {
    /// 首次观察到分区键时惰性创建，计数器全零
    pub fn new(partition: StockPartition) -> Self {
        Self {
            id: InventoryRecordId::new(),
            partition,
            produced_bulk: Quantity::zero(Unit::meter()),
            produced_unit_count: 0,
            produced_piece_qty: 0,
            reserved_bulk: Quantity::zero(Unit::meter()),
            reserved_unit_count: 0,
            reserved_piece_qty: 0,
            audit_info: AuditInfo::default(),
        }
    }

    /// 从各部分构建（用于从数据库加载）
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: InventoryRecordId,
        partition: StockPartition,
        produced_bulk: Quantity,
        produced_unit_count: i64,
        produced_piece_qty: i64,
        reserved_bulk: Quantity,
        reserved_unit_count: i64,
        reserved_piece_qty: i64,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            partition,
            produced_bulk,
            produced_unit_count,
            produced_piece_qty,
            reserved_bulk,
            reserved_unit_count,
            reserved_piece_qty,
            audit_info,
        }
    }

    // ========== Getters ==========

    pub fn id(&self) -> &InventoryRecordId {
        &self.id
    }

    pub fn partition(&self) -> &StockPartition {
        &self.partition
    }

    pub fn produced_bulk(&self) -> &Quantity {
        &self.produced_bulk
    }

    pub fn produced_unit_count(&self) -> i64 {
        self.produced_unit_count
    }

    pub fn produced_piece_qty(&self) -> i64 {
        self.produced_piece_qty
    }

    pub fn reserved_bulk(&self) -> &Quantity {
        &self.reserved_bulk
    }

    pub fn reserved_unit_count(&self) -> i64 {
        self.reserved_unit_count
    }

    pub fn reserved_piece_qty(&self) -> i64 {
        self.reserved_piece_qty
    }

    /// 匹布可用余量（produced − reserved），可为负以提示超订
    pub fn bulk_slack(&self) -> i64 {
        self.produced_bulk.value - self.reserved_bulk.value
    }

    /// 计件可用余量（produced − reserved），可为负以提示超订
    pub fn piece_slack(&self) -> i64 {
        self.produced_piece_qty - self.reserved_piece_qty
    }

    /// 孤儿记录：所有计数器归零
    pub fn is_orphan(&self) -> bool {
        self.produced_bulk.is_zero()
            && self.produced_unit_count == 0
            && self.produced_piece_qty == 0
            && self.reserved_bulk.is_zero()
            && self.reserved_unit_count == 0
            && self.reserved_piece_qty == 0
    }

    // ========== 计数器变更 ==========

    /// 生产入库：累加在库量
    pub fn add_production(&mut self, bulk: Option<&Quantity>, unit_count: i64, pieces: i64) {
        if let Some(bulk) = bulk {
            self.produced_bulk = self.produced_bulk.clone() + bulk.clone();
        }
        self.produced_unit_count += unit_count;
        self.produced_piece_qty += pieces;
        self.audit_info.update(None);
    }

    /// 订单预留：累加预留量
    pub fn add_reservation(&mut self, bulk: Option<&Quantity>, pieces: i64) {
        if let Some(bulk) = bulk {
            self.reserved_bulk = self.reserved_bulk.clone() + bulk.clone();
        }
        self.reserved_piece_qty += pieces;
        self.audit_info.update(None);
    }

    /// 匹布扣减：出货同时核销等量预留，负值一律截断
    pub fn deduct_bulk(&mut self, take: &Quantity, unit_take: i64) {
        self.produced_bulk = self.produced_bulk.saturating_sub(take);
        self.reserved_bulk = self.reserved_bulk.saturating_sub(take);
        self.produced_unit_count = (self.produced_unit_count - unit_take).max(0);
        self.reserved_unit_count = (self.reserved_unit_count - unit_take).max(0);
        self.audit_info.update(None);
    }

    /// 计件扣减：出货同时核销等量预留，负值一律截断
    pub fn deduct_pieces(&mut self, take: i64) {
        self.produced_piece_qty = (self.produced_piece_qty - take).max(0);
        self.reserved_piece_qty = (self.reserved_piece_qty - take).max(0);
        self.audit_info.update(None);
    }

    /// 重算回写：用重算结果整体覆盖计数器
    ///
    /// 仅在与当前值不同时生效，返回是否发生变化（重算器据此统计
    /// 回写行数，并保证重复重算第二遍零更新）
    #[allow(clippy::too_many_arguments)]
    pub fn overwrite_counters(
        &mut self,
        produced_bulk: Quantity,
        produced_unit_count: i64,
        produced_piece_qty: i64,
        reserved_bulk: Quantity,
        reserved_unit_count: i64,
        reserved_piece_qty: i64,
    ) -> bool {
        let changed = self.produced_bulk != produced_bulk
            || self.produced_unit_count != produced_unit_count
            || self.produced_piece_qty != produced_piece_qty
            || self.reserved_bulk != reserved_bulk
            || self.reserved_unit_count != reserved_unit_count
            || self.reserved_piece_qty != reserved_piece_qty;

        if changed {
            self.produced_bulk = produced_bulk;
            self.produced_unit_count = produced_unit_count;
            self.produced_piece_qty = produced_piece_qty;
            self.reserved_bulk = reserved_bulk;
            self.reserved_unit_count = reserved_unit_count;
            self.reserved_piece_qty = reserved_piece_qty;
            self.audit_info.update(None);
        }

        changed
    }
}

impl Entity for InventoryRecord {
    type Id = InventoryRecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for InventoryRecord {
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

    fn meters(v: f64) -> Quantity {
        Quantity::from_decimal(v, Unit::meter())
    }

    fn bulk_record() -> InventoryRecord {
        InventoryRecord::new(StockPartition::bulk(QualityId::new(), FactoryId::new()))
    }

    #[test]
    fn test_deduct_never_goes_negative() {
        let mut record = bulk_record();
        record.add_production(Some(&meters(40.0)), 2, 0);

        record.deduct_bulk(&meters(100.0), 5);

        assert!(record.produced_bulk().is_zero());
        assert_eq!(record.produced_unit_count(), 0);
        assert!(record.reserved_bulk().is_zero());
    }

    #[test]
    fn test_deduct_retires_reservation() {
        let mut record = bulk_record();
        record.add_production(Some(&meters(100.0)), 4, 0);
        record.add_reservation(Some(&meters(60.0)), 0);

        record.deduct_bulk(&meters(60.0), 2);

        assert_eq!(record.produced_bulk(), &meters(40.0));
        assert!(record.reserved_bulk().is_zero());
        assert_eq!(record.produced_unit_count(), 2);
    }

    #[test]
    fn test_overwrite_counters_reports_change() {
        let mut record = bulk_record();
        record.add_production(Some(&meters(10.0)), 1, 0);

        let changed = record.overwrite_counters(
            meters(10.0),
            1,
            0,
            Quantity::zero(Unit::meter()),
            0,
            0,
        );
        assert!(!changed);

        let changed = record.overwrite_counters(
            meters(25.0),
            2,
            0,
            Quantity::zero(Unit::meter()),
            0,
            0,
        );
        assert!(changed);
        assert_eq!(record.produced_bulk(), &meters(25.0));
    }

    #[test]
    fn test_orphan_detection() {
        let mut record = bulk_record();
        assert!(record.is_orphan());
        record.add_production(Some(&meters(5.0)), 1, 0);
        assert!(!record.is_orphan());
    }
}
