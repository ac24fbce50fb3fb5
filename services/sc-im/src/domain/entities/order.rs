//! 订单实体

use common::AuditInfo;
use domain_core::{AggregateRoot, Entity, Quantity, Unit};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::enums::{DispatchStatus, OrderStatus};
use crate::domain::value_objects::{ColorGroupId, DesignId, OrderId, QualityId, SubCut};

/// 计件订单行的配色组
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorGroupOrderLine {
    pub color_group_id: ColorGroupId,
    /// 下单件数
    pub quantity: i64,
    /// 累计出货件数
    pub dispatched: i64,
}

/// 匹布订单行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkOrderLine {
    pub quality_id: QualityId,
    /// 下单米数
    pub quantity: Quantity,
    /// 累计出货米数
    pub dispatched: Quantity,
}

impl BulkOrderLine {
    pub fn new(quality_id: QualityId, quantity: Quantity) -> Self {
        Self {
            quality_id,
            quantity,
            dispatched: Quantity::zero(Unit::meter()),
        }
    }
}

/// 计件订单行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountOrderLine {
    pub quality_id: QualityId,
    pub design_id: DesignId,
    pub sub_cut: Option<SubCut>,
    pub groups: Vec<ColorGroupOrderLine>,
}

/// 订单行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderLineItem {
    Bulk(BulkOrderLine),
    Count(CountOrderLine),
}

impl OrderLineItem {
    /// 本行是否已足量出货
    fn is_fully_dispatched(&self) -> bool {
        match self {
            OrderLineItem::Bulk(line) => line.dispatched >= line.quantity,
            OrderLineItem::Count(line) => line
                .groups
                .iter()
                .all(|group| group.dispatched >= group.quantity),
        }
    }

    /// 本行是否有任何出货
    fn has_any_dispatch(&self) -> bool {
        match self {
            OrderLineItem::Bulk(line) => line.dispatched.is_positive(),
            OrderLineItem::Count(line) => line.groups.iter().any(|group| group.dispatched > 0),
        }
    }
}

/// 订单聚合根
///
/// 行上维护累计出货量，出货状态由行状态推导。
/// 状态机 pending → partial → completed 只进不退。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// 订单 ID
    id: OrderId,
    /// 订单号
    order_no: String,
    /// 业务状态
    status: OrderStatus,
    /// 出货状态
    dispatch_status: DispatchStatus,
    /// 订单行
    line_items: Vec<OrderLineItem>,
    /// 审计信息
    audit_info: AuditInfo,
}

impl Order {
    pub fn new(order_no: impl Into<String>, line_items: Vec<OrderLineItem>) -> Self {
        Self {
            id: OrderId::new(),
            order_no: order_no.into(),
            status: OrderStatus::Open,
            dispatch_status: DispatchStatus::Pending,
            line_items,
            audit_info: AuditInfo::default(),
        }
    }

    /// 从各部分构建（用于从数据库加载）
    pub fn from_parts(
        id: OrderId,
        order_no: String,
        status: OrderStatus,
        dispatch_status: DispatchStatus,
        line_items: Vec<OrderLineItem>,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            order_no,
            status,
            dispatch_status,
            line_items,
            audit_info,
        }
    }

    // ========== Getters ==========

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn order_no(&self) -> &str {
        &self.order_no
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn dispatch_status(&self) -> DispatchStatus {
        self.dispatch_status
    }

    pub fn line_items(&self) -> &[OrderLineItem] {
        &self.line_items
    }

    /// 是否参与库存预留
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn close(&mut self) {
        self.status = OrderStatus::Closed;
        self.audit_info.update(None);
    }

    pub fn cancel(&mut self) {
        self.status = OrderStatus::Cancelled;
        self.audit_info.update(None);
    }

    // ========== 出货累计 ==========

    /// 按行号累加匹布出货量
    pub fn add_dispatched_bulk(&mut self, line_index: usize, qty: &Quantity) {
        match self.line_items.get_mut(line_index) {
            Some(OrderLineItem::Bulk(line)) => {
                line.dispatched = line.dispatched.clone() + qty.clone();
                self.audit_info.update(None);
            }
            Some(OrderLineItem::Count(_)) => {
                warn!(
                    order_no = %self.order_no,
                    line_index, "Dispatched bulk quantity against a count order line, skipping"
                );
            }
            None => {
                warn!(
                    order_no = %self.order_no,
                    line_index, "Dispatched line index not present on order, skipping"
                );
            }
        }
    }

    /// 按行号 + 配色组累加计件出货量
    pub fn add_dispatched_pieces(
        &mut self,
        line_index: usize,
        color_group_id: &ColorGroupId,
        pieces: i64,
    ) {
        match self.line_items.get_mut(line_index) {
            Some(OrderLineItem::Count(line)) => {
                match line
                    .groups
                    .iter_mut()
                    .find(|group| &group.color_group_id == color_group_id)
                {
                    Some(group) => {
                        group.dispatched += pieces;
                        self.audit_info.update(None);
                    }
                    None => {
                        warn!(
                            order_no = %self.order_no,
                            line_index,
                            color_group = %color_group_id,
                            "Dispatched color group not present on order line, skipping"
                        );
                    }
                }
            }
            Some(OrderLineItem::Bulk(_)) => {
                warn!(
                    order_no = %self.order_no,
                    line_index, "Dispatched pieces against a bulk order line, skipping"
                );
            }
            None => {
                warn!(
                    order_no = %self.order_no,
                    line_index, "Dispatched line index not present on order, skipping"
                );
            }
        }
    }

    /// 从行状态推导出货状态
    fn derive_dispatch_status(&self) -> DispatchStatus {
        if !self.line_items.is_empty()
            && self.line_items.iter().all(OrderLineItem::is_fully_dispatched)
        {
            return DispatchStatus::Completed;
        }
        if self.line_items.iter().any(OrderLineItem::has_any_dispatch) {
            return DispatchStatus::Partial;
        }
        DispatchStatus::Pending
    }

    /// 重新推导出货状态，只进不退
    pub fn refresh_dispatch_status(&mut self) {
        let derived = self.derive_dispatch_status();
        if derived.rank() > self.dispatch_status.rank() {
            self.dispatch_status = derived;
            self.audit_info.update(None);
        }
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Order {
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

    fn meters(v: f64) -> Quantity {
        Quantity::from_decimal(v, Unit::meter())
    }

    fn bulk_order(requested: f64) -> Order {
        Order::new(
            "SO-1001",
            vec![OrderLineItem::Bulk(BulkOrderLine::new(
                QualityId::new(),
                meters(requested),
            ))],
        )
    }

    #[test]
    fn test_pending_to_partial_to_completed() {
        let mut order = bulk_order(100.0);
        assert_eq!(order.dispatch_status(), DispatchStatus::Pending);

        order.add_dispatched_bulk(0, &meters(40.0));
        order.refresh_dispatch_status();
        assert_eq!(order.dispatch_status(), DispatchStatus::Partial);

        order.add_dispatched_bulk(0, &meters(60.0));
        order.refresh_dispatch_status();
        assert_eq!(order.dispatch_status(), DispatchStatus::Completed);
    }

    #[test]
    fn test_status_never_regresses() {
        let mut order = bulk_order(100.0);
        order.add_dispatched_bulk(0, &meters(100.0));
        order.refresh_dispatch_status();
        assert_eq!(order.dispatch_status(), DispatchStatus::Completed);

        // 行数据被改回不足量后状态依然保持 completed
        if let Some(OrderLineItem::Bulk(line)) = order.line_items.get_mut(0) {
            line.dispatched = meters(10.0);
        }
        order.refresh_dispatch_status();
        assert_eq!(order.dispatch_status(), DispatchStatus::Completed);
    }

    #[test]
    fn test_count_line_completion_requires_every_group() {
        let group_a = ColorGroupId::new();
        let group_b = ColorGroupId::new();
        let mut order = Order::new(
            "SO-1002",
            vec![OrderLineItem::Count(CountOrderLine {
                quality_id: QualityId::new(),
                design_id: DesignId::new(),
                sub_cut: None,
                groups: vec![
                    ColorGroupOrderLine {
                        color_group_id: group_a.clone(),
                        quantity: 10,
                        dispatched: 0,
                    },
                    ColorGroupOrderLine {
                        color_group_id: group_b.clone(),
                        quantity: 5,
                        dispatched: 0,
                    },
                ],
            })],
        );

        order.add_dispatched_pieces(0, &group_a, 10);
        order.refresh_dispatch_status();
        assert_eq!(order.dispatch_status(), DispatchStatus::Partial);

        order.add_dispatched_pieces(0, &group_b, 5);
        order.refresh_dispatch_status();
        assert_eq!(order.dispatch_status(), DispatchStatus::Completed);
    }

    #[test]
    fn test_unknown_group_is_skipped() {
        let mut order = bulk_order(50.0);
        order.add_dispatched_pieces(0, &ColorGroupId::new(), 5);
        order.refresh_dispatch_status();
        assert_eq!(order.dispatch_status(), DispatchStatus::Pending);
    }
}
