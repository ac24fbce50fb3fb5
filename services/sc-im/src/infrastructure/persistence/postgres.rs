//! PostgreSQL repository implementation

use async_trait::async_trait;
use domain_core::AggregateRoot;
use errors::{AppError, AppResult};
use sqlx::PgPool;

use crate::domain::entities::{
    DispatchNote, InventoryRecord, Order, ProductionRecord, StockUnit,
};
use crate::domain::repositories::{
    DispatchNoteRepository, InventoryRecordRepository, MasterDataLookup, OrderRepository,
    ProductionRecordRepository, StockUnitRepository, UnitFilter,
};
use crate::domain::value_objects::{
    ColorGroupId, DesignId, DispatchNoteId, FactoryId, InventoryRecordId, OrderId, QualityId,
    StockPartition, StockUnitId,
};

use super::converters::{
    dispatch_note_from_row, inventory_record_from_row, order_from_row,
    production_record_from_row, stock_unit_from_row,
};
use super::rows::{
    DispatchNoteRow, InventoryRecordRow, OrderRow, ProductionRecordRow, StockUnitRow,
};

const INVENTORY_RECORD_COLUMNS: &str = r#"
    id, item_class, quality_id, design_id, factory_id, color_group_id, sub_cut,
    produced_bulk, produced_unit_count, produced_piece_qty,
    reserved_bulk, reserved_unit_count, reserved_piece_qty,
    created_at, created_by, updated_at, updated_by
"#;

const STOCK_UNIT_COLUMNS: &str = r#"
    id, unit_no, item_class, quality_id, design_id, factory_id, color_group_id, sub_cut,
    quantity, status, dispatch_note_id,
    created_at, created_by, updated_at, updated_by
"#;

// ============================================================================
// InventoryRecordRepository 实现
// ============================================================================

pub struct PostgresInventoryRecordRepository {
    pool: PgPool,
}

impl PostgresInventoryRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryRecordRepository for PostgresInventoryRecordRepository {
    async fn find_by_partition(
        &self,
        partition: &StockPartition,
    ) -> AppResult<Option<InventoryRecord>> {
        let row = sqlx::query_as::<_, InventoryRecordRow>(&format!(
            r#"
            SELECT {INVENTORY_RECORD_COLUMNS}
            FROM inventory_records
            WHERE item_class = $1
              AND quality_id = $2
              AND design_id IS NOT DISTINCT FROM $3
              AND factory_id = $4
              AND color_group_id IS NOT DISTINCT FROM $5
              AND sub_cut IS NOT DISTINCT FROM $6
            "#
        ))
        .bind(i16::from(partition.item_class))
        .bind(partition.quality_id.0)
        .bind(partition.design_id.as_ref().map(|id| id.0))
        .bind(partition.factory_id.0)
        .bind(partition.color_group_id.as_ref().map(|id| id.0))
        .bind(partition.sub_cut.as_ref().map(|cut| cut.0.clone()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询库存记录失败: {}", e)))?;

        Ok(row.map(inventory_record_from_row))
    }

    async fn find_bulk_by_quality(
        &self,
        quality_id: &QualityId,
    ) -> AppResult<Vec<InventoryRecord>> {
        let rows = sqlx::query_as::<_, InventoryRecordRow>(&format!(
            r#"
            SELECT {INVENTORY_RECORD_COLUMNS}
            FROM inventory_records
            WHERE item_class = $1 AND quality_id = $2
            "#
        ))
        .bind(i16::from(crate::domain::enums::ItemClass::Bulk))
        .bind(quality_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询库存记录失败: {}", e)))?;

        Ok(rows.into_iter().map(inventory_record_from_row).collect())
    }

    async fn find_count_by_group(
        &self,
        quality_id: &QualityId,
        design_id: &DesignId,
        color_group_id: &ColorGroupId,
    ) -> AppResult<Vec<InventoryRecord>> {
        let rows = sqlx::query_as::<_, InventoryRecordRow>(&format!(
            r#"
            SELECT {INVENTORY_RECORD_COLUMNS}
            FROM inventory_records
            WHERE item_class = $1
              AND quality_id = $2
              AND design_id = $3
              AND color_group_id = $4
            "#
        ))
        .bind(i16::from(crate::domain::enums::ItemClass::Count))
        .bind(quality_id.0)
        .bind(design_id.0)
        .bind(color_group_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询库存记录失败: {}", e)))?;

        Ok(rows.into_iter().map(inventory_record_from_row).collect())
    }

    async fn list_all(&self) -> AppResult<Vec<InventoryRecord>> {
        let rows = sqlx::query_as::<_, InventoryRecordRow>(&format!(
            "SELECT {INVENTORY_RECORD_COLUMNS} FROM inventory_records"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询库存记录失败: {}", e)))?;

        Ok(rows.into_iter().map(inventory_record_from_row).collect())
    }

    async fn save(&self, record: &InventoryRecord) -> AppResult<()> {
        let partition = record.partition();
        let audit = record.audit_info();
        sqlx::query(
            r#"
            INSERT INTO inventory_records (
                id, item_class, quality_id, design_id, factory_id, color_group_id, sub_cut,
                produced_bulk, produced_unit_count, produced_piece_qty,
                reserved_bulk, reserved_unit_count, reserved_piece_qty,
                created_at, created_by, updated_at, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(record.id().0)
        .bind(i16::from(partition.item_class))
        .bind(partition.quality_id.0)
        .bind(partition.design_id.as_ref().map(|id| id.0))
        .bind(partition.factory_id.0)
        .bind(partition.color_group_id.as_ref().map(|id| id.0))
        .bind(partition.sub_cut.as_ref().map(|cut| cut.0.clone()))
        .bind(record.produced_bulk().value)
        .bind(record.produced_unit_count())
        .bind(record.produced_piece_qty())
        .bind(record.reserved_bulk().value)
        .bind(record.reserved_unit_count())
        .bind(record.reserved_piece_qty())
        .bind(audit.created_at)
        .bind(audit.created_by.as_ref().map(|user| user.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.as_ref().map(|user| user.0))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("保存库存记录失败: {}", e)))?;

        Ok(())
    }

    async fn update(&self, record: &InventoryRecord) -> AppResult<()> {
        let audit = record.audit_info();
        sqlx::query(
            r#"
            UPDATE inventory_records SET
                produced_bulk = $2,
                produced_unit_count = $3,
                produced_piece_qty = $4,
                reserved_bulk = $5,
                reserved_unit_count = $6,
                reserved_piece_qty = $7,
                updated_at = $8,
                updated_by = $9
            WHERE id = $1
            "#,
        )
        .bind(record.id().0)
        .bind(record.produced_bulk().value)
        .bind(record.produced_unit_count())
        .bind(record.produced_piece_qty())
        .bind(record.reserved_bulk().value)
        .bind(record.reserved_unit_count())
        .bind(record.reserved_piece_qty())
        .bind(audit.updated_at)
        .bind(audit.updated_by.as_ref().map(|user| user.0))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("更新库存记录失败: {}", e)))?;

        Ok(())
    }

    async fn delete(&self, id: &InventoryRecordId) -> AppResult<()> {
        sqlx::query("DELETE FROM inventory_records WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("删除库存记录失败: {}", e)))?;

        Ok(())
    }
}

// ============================================================================
// StockUnitRepository 实现
// ============================================================================

pub struct PostgresStockUnitRepository {
    pool: PgPool,
}

impl PostgresStockUnitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StockUnitRepository for PostgresStockUnitRepository {
    async fn find_by_id(&self, id: &StockUnitId) -> AppResult<Option<StockUnit>> {
        let row = sqlx::query_as::<_, StockUnitRow>(&format!(
            "SELECT {STOCK_UNIT_COLUMNS} FROM stock_units WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询布卷失败: {}", e)))?;

        Ok(row.map(stock_unit_from_row))
    }

    async fn find_by_ids(&self, ids: &[StockUnitId]) -> AppResult<Vec<StockUnit>> {
        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| id.0).collect();
        let rows = sqlx::query_as::<_, StockUnitRow>(&format!(
            "SELECT {STOCK_UNIT_COLUMNS} FROM stock_units WHERE id = ANY($1)"
        ))
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询布卷失败: {}", e)))?;

        Ok(rows.into_iter().map(stock_unit_from_row).collect())
    }

    async fn list_available(&self, filter: &UnitFilter) -> AppResult<Vec<StockUnit>> {
        let rows = sqlx::query_as::<_, StockUnitRow>(&format!(
            r#"
            SELECT {STOCK_UNIT_COLUMNS}
            FROM stock_units
            WHERE status = $1
              AND ($2::uuid IS NULL OR quality_id = $2)
              AND ($3::uuid IS NULL OR design_id = $3)
              AND ($4::uuid IS NULL OR factory_id = $4)
            ORDER BY unit_no
            "#
        ))
        .bind(i16::from(crate::domain::enums::UnitStatus::Available))
        .bind(filter.quality_id.as_ref().map(|id| id.0))
        .bind(filter.design_id.as_ref().map(|id| id.0))
        .bind(filter.factory_id.as_ref().map(|id| id.0))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询布卷失败: {}", e)))?;

        Ok(rows.into_iter().map(stock_unit_from_row).collect())
    }

    async fn list_all(&self) -> AppResult<Vec<StockUnit>> {
        let rows = sqlx::query_as::<_, StockUnitRow>(&format!(
            "SELECT {STOCK_UNIT_COLUMNS} FROM stock_units"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询布卷失败: {}", e)))?;

        Ok(rows.into_iter().map(stock_unit_from_row).collect())
    }

    async fn save(&self, unit: &StockUnit) -> AppResult<()> {
        let partition = unit.partition();
        let audit = unit.audit_info();
        sqlx::query(
            r#"
            INSERT INTO stock_units (
                id, unit_no, item_class, quality_id, design_id, factory_id,
                color_group_id, sub_cut, quantity, status, dispatch_note_id,
                created_at, created_by, updated_at, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(unit.id().0)
        .bind(unit.unit_no())
        .bind(i16::from(partition.item_class))
        .bind(partition.quality_id.0)
        .bind(partition.design_id.as_ref().map(|id| id.0))
        .bind(partition.factory_id.0)
        .bind(partition.color_group_id.as_ref().map(|id| id.0))
        .bind(partition.sub_cut.as_ref().map(|cut| cut.0.clone()))
        .bind(unit.quantity().value)
        .bind(i16::from(unit.status()))
        .bind(unit.dispatch_note_id().map(|id| id.0))
        .bind(audit.created_at)
        .bind(audit.created_by.as_ref().map(|user| user.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.as_ref().map(|user| user.0))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("保存布卷失败: {}", e)))?;

        Ok(())
    }

    async fn update(&self, unit: &StockUnit) -> AppResult<()> {
        let audit = unit.audit_info();
        sqlx::query(
            r#"
            UPDATE stock_units SET
                status = $2,
                dispatch_note_id = $3,
                updated_at = $4,
                updated_by = $5
            WHERE id = $1
            "#,
        )
        .bind(unit.id().0)
        .bind(i16::from(unit.status()))
        .bind(unit.dispatch_note_id().map(|id| id.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.as_ref().map(|user| user.0))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("更新布卷失败: {}", e)))?;

        Ok(())
    }
}

// ============================================================================
// OrderRepository 实现
// ============================================================================

pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> AppResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, order_no, status, dispatch_status, line_items,
                   created_at, created_by, updated_at, updated_by
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询订单失败: {}", e)))?;

        row.map(order_from_row).transpose()
    }

    async fn list_open(&self) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, order_no, status, dispatch_status, line_items,
                   created_at, created_by, updated_at, updated_by
            FROM orders
            WHERE status = $1
            "#,
        )
        .bind(i16::from(crate::domain::enums::OrderStatus::Open))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询订单失败: {}", e)))?;

        rows.into_iter().map(order_from_row).collect()
    }

    async fn save(&self, order: &Order) -> AppResult<()> {
        let line_items = serde_json::to_value(order.line_items())
            .map_err(|e| AppError::internal(format!("序列化订单行失败: {}", e)))?;
        let audit = order.audit_info();
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_no, status, dispatch_status, line_items,
                created_at, created_by, updated_at, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id().0)
        .bind(order.order_no())
        .bind(i16::from(order.status()))
        .bind(i16::from(order.dispatch_status()))
        .bind(line_items)
        .bind(audit.created_at)
        .bind(audit.created_by.as_ref().map(|user| user.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.as_ref().map(|user| user.0))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("保存订单失败: {}", e)))?;

        Ok(())
    }

    async fn update(&self, order: &Order) -> AppResult<()> {
        let line_items = serde_json::to_value(order.line_items())
            .map_err(|e| AppError::internal(format!("序列化订单行失败: {}", e)))?;
        let audit = order.audit_info();
        sqlx::query(
            r#"
            UPDATE orders SET
                status = $2,
                dispatch_status = $3,
                line_items = $4,
                updated_at = $5,
                updated_by = $6
            WHERE id = $1
            "#,
        )
        .bind(order.id().0)
        .bind(i16::from(order.status()))
        .bind(i16::from(order.dispatch_status()))
        .bind(line_items)
        .bind(audit.updated_at)
        .bind(audit.updated_by.as_ref().map(|user| user.0))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("更新订单失败: {}", e)))?;

        Ok(())
    }
}

// ============================================================================
// ProductionRecordRepository 实现
// ============================================================================

pub struct PostgresProductionRecordRepository {
    pool: PgPool,
}

impl PostgresProductionRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductionRecordRepository for PostgresProductionRecordRepository {
    async fn save(&self, record: &ProductionRecord) -> AppResult<()> {
        let unit_ids = serde_json::to_value(record.unit_ids())
            .map_err(|e| AppError::internal(format!("序列化布卷清单失败: {}", e)))?;
        let piece_groups = serde_json::to_value(record.piece_groups())
            .map_err(|e| AppError::internal(format!("序列化配色组件数失败: {}", e)))?;
        let audit = record.audit_info();
        sqlx::query(
            r#"
            INSERT INTO production_records (
                id, item_class, quality_id, design_id, factory_id, sub_cut,
                bulk_qty, unit_ids, piece_groups,
                created_at, created_by, updated_at, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(record.id().0)
        .bind(i16::from(record.item_class()))
        .bind(record.quality_id().0)
        .bind(record.design_id().map(|id| id.0))
        .bind(record.factory_id().0)
        .bind(record.sub_cut().map(|cut| cut.0.clone()))
        .bind(record.bulk_qty().map(|qty| qty.value))
        .bind(unit_ids)
        .bind(piece_groups)
        .bind(audit.created_at)
        .bind(audit.created_by.as_ref().map(|user| user.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.as_ref().map(|user| user.0))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("保存生产记录失败: {}", e)))?;

        Ok(())
    }

    async fn list_all(&self) -> AppResult<Vec<ProductionRecord>> {
        let rows = sqlx::query_as::<_, ProductionRecordRow>(
            r#"
            SELECT id, item_class, quality_id, design_id, factory_id, sub_cut,
                   bulk_qty, unit_ids, piece_groups,
                   created_at, created_by, updated_at, updated_by
            FROM production_records
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询生产记录失败: {}", e)))?;

        rows.into_iter().map(production_record_from_row).collect()
    }
}

// ============================================================================
// DispatchNoteRepository 实现
// ============================================================================

pub struct PostgresDispatchNoteRepository {
    pool: PgPool,
}

impl PostgresDispatchNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DispatchNoteRepository for PostgresDispatchNoteRepository {
    async fn find_by_id(&self, id: &DispatchNoteId) -> AppResult<Option<DispatchNote>> {
        let row = sqlx::query_as::<_, DispatchNoteRow>(
            r#"
            SELECT id, challan_no, order_id, line_items,
                   created_at, created_by, updated_at, updated_by
            FROM dispatch_notes
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询出货单失败: {}", e)))?;

        row.map(dispatch_note_from_row).transpose()
    }

    async fn save(&self, note: &DispatchNote) -> AppResult<()> {
        let line_items = serde_json::to_value(note.line_items())
            .map_err(|e| AppError::internal(format!("序列化出货行失败: {}", e)))?;
        let audit = note.audit_info();
        sqlx::query(
            r#"
            INSERT INTO dispatch_notes (
                id, challan_no, order_id, line_items,
                created_at, created_by, updated_at, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(note.id().0)
        .bind(note.challan_no())
        .bind(note.order_id().0)
        .bind(line_items)
        .bind(audit.created_at)
        .bind(audit.created_by.as_ref().map(|user| user.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.as_ref().map(|user| user.0))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("保存出货单失败: {}", e)))?;

        Ok(())
    }

    async fn list_all(&self) -> AppResult<Vec<DispatchNote>> {
        let rows = sqlx::query_as::<_, DispatchNoteRow>(
            r#"
            SELECT id, challan_no, order_id, line_items,
                   created_at, created_by, updated_at, updated_by
            FROM dispatch_notes
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询出货单失败: {}", e)))?;

        rows.into_iter().map(dispatch_note_from_row).collect()
    }
}

// ============================================================================
// MasterDataLookup 实现
// ============================================================================

/// 主数据名称查询（只读，仅用于缺货报告展示）
pub struct PostgresMasterDataLookup {
    pool: PgPool,
}

impl PostgresMasterDataLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lookup_name(&self, table: &str, id: uuid::Uuid) -> AppResult<Option<String>> {
        let name: Option<String> =
            sqlx::query_scalar(&format!("SELECT name FROM {} WHERE id = $1", table))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("查询主数据失败: {}", e)))?;

        Ok(name)
    }
}

#[async_trait]
impl MasterDataLookup for PostgresMasterDataLookup {
    async fn quality_name(&self, id: &QualityId) -> AppResult<Option<String>> {
        self.lookup_name("qualities", id.0).await
    }

    async fn design_name(&self, id: &DesignId) -> AppResult<Option<String>> {
        self.lookup_name("designs", id.0).await
    }

    async fn color_group_name(&self, id: &ColorGroupId) -> AppResult<Option<String>> {
        self.lookup_name("color_groups", id.0).await
    }

    async fn factory_name(&self, id: &FactoryId) -> AppResult<Option<String>> {
        self.lookup_name("factories", id.0).await
    }
}
