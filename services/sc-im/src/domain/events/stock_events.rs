//! 库存领域事件

use event_core::DomainEvent;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{DispatchNoteId, OrderId, ProductionId, QualityId};

/// 生产入库事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionRecorded {
    pub production_id: ProductionId,
    pub quality_id: QualityId,
    /// 入库米数（匹布）
    pub bulk_meters: Option<f64>,
    /// 新建布卷数
    pub unit_count: i64,
    /// 入库件数（计件）
    pub pieces: i64,
}

/// 库存扣减事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockDeducted {
    pub dispatch_note_id: DispatchNoteId,
    pub line_count: usize,
}

/// 出货单建立事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchNoteCreated {
    pub dispatch_note_id: DispatchNoteId,
    pub challan_no: String,
    pub order_id: OrderId,
    pub line_count: usize,
}

/// 订单预留事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStockReserved {
    pub order_id: OrderId,
    pub line_count: usize,
}

/// 库存重算事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRecalculated {
    pub updated_records: u64,
    pub pruned_records: u64,
    pub units_resynced: u64,
}

/// 库存领域事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StockEvent {
    /// 生产入库
    ProductionRecorded(ProductionRecorded),
    /// 库存扣减
    StockDeducted(StockDeducted),
    /// 出货单建立
    DispatchNoteCreated(DispatchNoteCreated),
    /// 订单预留
    OrderStockReserved(OrderStockReserved),
    /// 库存重算
    StockRecalculated(StockRecalculated),
}

impl DomainEvent for StockEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StockEvent::ProductionRecorded(_) => "ProductionRecorded",
            StockEvent::StockDeducted(_) => "StockDeducted",
            StockEvent::DispatchNoteCreated(_) => "DispatchNoteCreated",
            StockEvent::OrderStockReserved(_) => "OrderStockReserved",
            StockEvent::StockRecalculated(_) => "StockRecalculated",
        }
    }

    fn aggregate_type(&self) -> &'static str {
        "stock_ledger"
    }

    fn aggregate_id(&self) -> String {
        match self {
            StockEvent::ProductionRecorded(e) => e.production_id.to_string(),
            StockEvent::StockDeducted(e) => e.dispatch_note_id.to_string(),
            StockEvent::DispatchNoteCreated(e) => e.dispatch_note_id.to_string(),
            StockEvent::OrderStockReserved(e) => e.order_id.to_string(),
            StockEvent::StockRecalculated(_) => "stock_ledger".to_string(),
        }
    }
}
