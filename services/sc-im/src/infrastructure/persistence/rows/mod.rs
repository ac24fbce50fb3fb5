//! 数据库行映射结构

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// 库存记录数据库行
#[derive(Debug, FromRow)]
pub struct InventoryRecordRow {
    pub id: Uuid,
    pub item_class: i16,
    pub quality_id: Uuid,
    pub design_id: Option<Uuid>,
    pub factory_id: Uuid,
    pub color_group_id: Option<Uuid>,
    pub sub_cut: Option<String>,
    pub produced_bulk: i64,
    pub produced_unit_count: i64,
    pub produced_piece_qty: i64,
    pub reserved_bulk: i64,
    pub reserved_unit_count: i64,
    pub reserved_piece_qty: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 布卷数据库行
#[derive(Debug, FromRow)]
pub struct StockUnitRow {
    pub id: Uuid,
    pub unit_no: String,
    pub item_class: i16,
    pub quality_id: Uuid,
    pub design_id: Option<Uuid>,
    pub factory_id: Uuid,
    pub color_group_id: Option<Uuid>,
    pub sub_cut: Option<String>,
    pub quantity: i64,
    pub status: i16,
    pub dispatch_note_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 订单数据库行
#[derive(Debug, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub order_no: String,
    pub status: i16,
    pub dispatch_status: i16,
    pub line_items: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 生产记录数据库行
#[derive(Debug, FromRow)]
pub struct ProductionRecordRow {
    pub id: Uuid,
    pub item_class: i16,
    pub quality_id: Uuid,
    pub design_id: Option<Uuid>,
    pub factory_id: Uuid,
    pub sub_cut: Option<String>,
    pub bulk_qty: Option<i64>,
    pub unit_ids: serde_json::Value,
    pub piece_groups: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 出货单数据库行
#[derive(Debug, FromRow)]
pub struct DispatchNoteRow {
    pub id: Uuid,
    pub challan_no: String,
    pub order_id: Uuid,
    pub line_items: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}
