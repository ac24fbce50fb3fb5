//! 数据库行到领域对象的转换

use chrono::{DateTime, Utc};
use common::{AuditInfo, UserId};
use domain_core::{Quantity, Unit};
use errors::{AppError, AppResult};
use uuid::Uuid;

use crate::domain::entities::{
    DispatchLineItem, DispatchNote, InventoryRecord, Order, OrderLineItem, ProducedPieceGroup,
    ProductionRecord, StockUnit,
};
use crate::domain::enums::ItemClass;
use crate::domain::value_objects::{
    ColorGroupId, DesignId, DispatchNoteId, FactoryId, InventoryRecordId, OrderId, ProductionId,
    QualityId, StockPartition, StockUnitId, SubCut,
};

use super::rows::{
    DispatchNoteRow, InventoryRecordRow, OrderRow, ProductionRecordRow, StockUnitRow,
};

/// 从分区各列组装分区键
fn partition_from_columns(
    item_class: i16,
    quality_id: Uuid,
    design_id: Option<Uuid>,
    factory_id: Uuid,
    color_group_id: Option<Uuid>,
    sub_cut: Option<String>,
) -> StockPartition {
    StockPartition {
        item_class: ItemClass::from(item_class),
        quality_id: QualityId::from_uuid(quality_id),
        design_id: design_id.map(DesignId::from_uuid),
        factory_id: FactoryId::from_uuid(factory_id),
        color_group_id: color_group_id.map(ColorGroupId::from_uuid),
        sub_cut: sub_cut.map(SubCut::new),
    }
}

pub fn build_audit_info(
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    updated_at: DateTime<Utc>,
    updated_by: Option<Uuid>,
) -> AuditInfo {
    AuditInfo {
        created_at,
        created_by: created_by.map(UserId::from_uuid),
        updated_at,
        updated_by: updated_by.map(UserId::from_uuid),
    }
}

/// 将 InventoryRecordRow 转换为 InventoryRecord
pub fn inventory_record_from_row(row: InventoryRecordRow) -> InventoryRecord {
    InventoryRecord::from_parts(
        InventoryRecordId::from_uuid(row.id),
        partition_from_columns(
            row.item_class,
            row.quality_id,
            row.design_id,
            row.factory_id,
            row.color_group_id,
            row.sub_cut,
        ),
        Quantity::from_raw(row.produced_bulk, Unit::meter()),
        row.produced_unit_count,
        row.produced_piece_qty,
        Quantity::from_raw(row.reserved_bulk, Unit::meter()),
        row.reserved_unit_count,
        row.reserved_piece_qty,
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    )
}

/// 将 StockUnitRow 转换为 StockUnit
pub fn stock_unit_from_row(row: StockUnitRow) -> StockUnit {
    StockUnit::from_parts(
        StockUnitId::from_uuid(row.id),
        row.unit_no,
        partition_from_columns(
            row.item_class,
            row.quality_id,
            row.design_id,
            row.factory_id,
            row.color_group_id,
            row.sub_cut,
        ),
        Quantity::from_raw(row.quantity, Unit::meter()),
        row.status.into(),
        row.dispatch_note_id.map(DispatchNoteId::from_uuid),
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    )
}

/// 将 OrderRow 转换为 Order
pub fn order_from_row(row: OrderRow) -> AppResult<Order> {
    let line_items: Vec<OrderLineItem> = serde_json::from_value(row.line_items)
        .map_err(|e| AppError::internal(format!("反序列化订单行失败: {}", e)))?;

    Ok(Order::from_parts(
        OrderId::from_uuid(row.id),
        row.order_no,
        row.status.into(),
        row.dispatch_status.into(),
        line_items,
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    ))
}

/// 将 ProductionRecordRow 转换为 ProductionRecord
pub fn production_record_from_row(row: ProductionRecordRow) -> AppResult<ProductionRecord> {
    let unit_ids: Vec<StockUnitId> = serde_json::from_value(row.unit_ids)
        .map_err(|e| AppError::internal(format!("反序列化布卷清单失败: {}", e)))?;
    let piece_groups: Vec<ProducedPieceGroup> = serde_json::from_value(row.piece_groups)
        .map_err(|e| AppError::internal(format!("反序列化配色组件数失败: {}", e)))?;

    Ok(ProductionRecord::from_parts(
        ProductionId::from_uuid(row.id),
        ItemClass::from(row.item_class),
        QualityId::from_uuid(row.quality_id),
        row.design_id.map(DesignId::from_uuid),
        FactoryId::from_uuid(row.factory_id),
        row.sub_cut.map(SubCut::new),
        row.bulk_qty.map(|value| Quantity::from_raw(value, Unit::meter())),
        unit_ids,
        piece_groups,
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    ))
}

/// 将 DispatchNoteRow 转换为 DispatchNote
pub fn dispatch_note_from_row(row: DispatchNoteRow) -> AppResult<DispatchNote> {
    let line_items: Vec<DispatchLineItem> = serde_json::from_value(row.line_items)
        .map_err(|e| AppError::internal(format!("反序列化出货行失败: {}", e)))?;

    Ok(DispatchNote::from_parts(
        DispatchNoteId::from_uuid(row.id),
        row.challan_no,
        OrderId::from_uuid(row.order_id),
        line_items,
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    ))
}
