//! 内存仓储实现
//!
//! 供测试与嵌入式调用方使用，语义与 PostgreSQL 实现一致

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use errors::{AppError, AppResult};

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

fn poisoned(name: &str) -> AppError {
    AppError::internal(format!("{} 仓储锁中毒", name))
}

/// 库存记录内存仓储
#[derive(Default)]
pub struct InMemoryInventoryRecordRepository {
    records: RwLock<HashMap<InventoryRecordId, InventoryRecord>>,
}

impl InMemoryInventoryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryRecordRepository for InMemoryInventoryRecordRepository {
    async fn find_by_partition(
        &self,
        partition: &StockPartition,
    ) -> AppResult<Option<InventoryRecord>> {
        let records = self.records.read().map_err(|_| poisoned("库存记录"))?;
        Ok(records
            .values()
            .find(|record| record.partition() == partition)
            .cloned())
    }

    async fn find_bulk_by_quality(
        &self,
        quality_id: &QualityId,
    ) -> AppResult<Vec<InventoryRecord>> {
        let records = self.records.read().map_err(|_| poisoned("库存记录"))?;
        Ok(records
            .values()
            .filter(|record| record.partition().matches_bulk_quality(quality_id))
            .cloned()
            .collect())
    }

    async fn find_count_by_group(
        &self,
        quality_id: &QualityId,
        design_id: &DesignId,
        color_group_id: &ColorGroupId,
    ) -> AppResult<Vec<InventoryRecord>> {
        let records = self.records.read().map_err(|_| poisoned("库存记录"))?;
        Ok(records
            .values()
            .filter(|record| {
                record
                    .partition()
                    .matches_count_group(quality_id, design_id, color_group_id)
            })
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> AppResult<Vec<InventoryRecord>> {
        let records = self.records.read().map_err(|_| poisoned("库存记录"))?;
        Ok(records.values().cloned().collect())
    }

    async fn save(&self, record: &InventoryRecord) -> AppResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned("库存记录"))?;
        records.insert(record.id().clone(), record.clone());
        Ok(())
    }

    async fn update(&self, record: &InventoryRecord) -> AppResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned("库存记录"))?;
        records.insert(record.id().clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &InventoryRecordId) -> AppResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned("库存记录"))?;
        records.remove(id);
        Ok(())
    }
}

/// 布卷内存仓储
#[derive(Default)]
pub struct InMemoryStockUnitRepository {
    units: RwLock<HashMap<StockUnitId, StockUnit>>,
}

impl InMemoryStockUnitRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockUnitRepository for InMemoryStockUnitRepository {
    async fn find_by_id(&self, id: &StockUnitId) -> AppResult<Option<StockUnit>> {
        let units = self.units.read().map_err(|_| poisoned("布卷"))?;
        Ok(units.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[StockUnitId]) -> AppResult<Vec<StockUnit>> {
        let units = self.units.read().map_err(|_| poisoned("布卷"))?;
        Ok(ids.iter().filter_map(|id| units.get(id).cloned()).collect())
    }

    async fn list_available(&self, filter: &UnitFilter) -> AppResult<Vec<StockUnit>> {
        let units = self.units.read().map_err(|_| poisoned("布卷"))?;
        Ok(units
            .values()
            .filter(|unit| !unit.status().is_sold())
            .filter(|unit| matches_filter(unit, filter))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> AppResult<Vec<StockUnit>> {
        let units = self.units.read().map_err(|_| poisoned("布卷"))?;
        Ok(units.values().cloned().collect())
    }

    async fn save(&self, unit: &StockUnit) -> AppResult<()> {
        let mut units = self.units.write().map_err(|_| poisoned("布卷"))?;
        units.insert(unit.id().clone(), unit.clone());
        Ok(())
    }

    async fn update(&self, unit: &StockUnit) -> AppResult<()> {
        let mut units = self.units.write().map_err(|_| poisoned("布卷"))?;
        units.insert(unit.id().clone(), unit.clone());
        Ok(())
    }
}

fn matches_filter(unit: &StockUnit, filter: &UnitFilter) -> bool {
    let partition = unit.partition();
    if let Some(quality_id) = &filter.quality_id {
        if &partition.quality_id != quality_id {
            return false;
        }
    }
    if let Some(design_id) = &filter.design_id {
        if partition.design_id.as_ref() != Some(design_id) {
            return false;
        }
    }
    if let Some(factory_id) = &filter.factory_id {
        if &partition.factory_id != factory_id {
            return false;
        }
    }
    true
}

/// 订单内存仓储
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> AppResult<Option<Order>> {
        let orders = self.orders.read().map_err(|_| poisoned("订单"))?;
        Ok(orders.get(id).cloned())
    }

    async fn list_open(&self) -> AppResult<Vec<Order>> {
        let orders = self.orders.read().map_err(|_| poisoned("订单"))?;
        Ok(orders
            .values()
            .filter(|order| order.is_open())
            .cloned()
            .collect())
    }

    async fn save(&self, order: &Order) -> AppResult<()> {
        let mut orders = self.orders.write().map_err(|_| poisoned("订单"))?;
        orders.insert(order.id().clone(), order.clone());
        Ok(())
    }

    async fn update(&self, order: &Order) -> AppResult<()> {
        let mut orders = self.orders.write().map_err(|_| poisoned("订单"))?;
        orders.insert(order.id().clone(), order.clone());
        Ok(())
    }
}

/// 生产记录内存仓储
#[derive(Default)]
pub struct InMemoryProductionRecordRepository {
    records: RwLock<Vec<ProductionRecord>>,
}

impl InMemoryProductionRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductionRecordRepository for InMemoryProductionRecordRepository {
    async fn save(&self, record: &ProductionRecord) -> AppResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned("生产记录"))?;
        records.push(record.clone());
        Ok(())
    }

    async fn list_all(&self) -> AppResult<Vec<ProductionRecord>> {
        let records = self.records.read().map_err(|_| poisoned("生产记录"))?;
        Ok(records.clone())
    }
}

/// 出货单内存仓储
#[derive(Default)]
pub struct InMemoryDispatchNoteRepository {
    notes: RwLock<Vec<DispatchNote>>,
}

impl InMemoryDispatchNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DispatchNoteRepository for InMemoryDispatchNoteRepository {
    async fn find_by_id(&self, id: &DispatchNoteId) -> AppResult<Option<DispatchNote>> {
        let notes = self.notes.read().map_err(|_| poisoned("出货单"))?;
        Ok(notes.iter().find(|note| note.id() == id).cloned())
    }

    async fn save(&self, note: &DispatchNote) -> AppResult<()> {
        let mut notes = self.notes.write().map_err(|_| poisoned("出货单"))?;
        notes.push(note.clone());
        Ok(())
    }

    async fn list_all(&self) -> AppResult<Vec<DispatchNote>> {
        let notes = self.notes.read().map_err(|_| poisoned("出货单"))?;
        Ok(notes.clone())
    }
}

/// 主数据内存查询（测试用）
#[derive(Default)]
pub struct InMemoryMasterData {
    qualities: RwLock<HashMap<QualityId, String>>,
    designs: RwLock<HashMap<DesignId, String>>,
    color_groups: RwLock<HashMap<ColorGroupId, String>>,
    factories: RwLock<HashMap<FactoryId, String>>,
}

impl InMemoryMasterData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_quality(&self, id: QualityId, name: impl Into<String>) {
        if let Ok(mut qualities) = self.qualities.write() {
            qualities.insert(id, name.into());
        }
    }

    pub fn put_design(&self, id: DesignId, name: impl Into<String>) {
        if let Ok(mut designs) = self.designs.write() {
            designs.insert(id, name.into());
        }
    }

    pub fn put_color_group(&self, id: ColorGroupId, name: impl Into<String>) {
        if let Ok(mut color_groups) = self.color_groups.write() {
            color_groups.insert(id, name.into());
        }
    }

    pub fn put_factory(&self, id: FactoryId, name: impl Into<String>) {
        if let Ok(mut factories) = self.factories.write() {
            factories.insert(id, name.into());
        }
    }
}

#[async_trait]
impl MasterDataLookup for InMemoryMasterData {
    async fn quality_name(&self, id: &QualityId) -> AppResult<Option<String>> {
        let qualities = self.qualities.read().map_err(|_| poisoned("主数据"))?;
        Ok(qualities.get(id).cloned())
    }

    async fn design_name(&self, id: &DesignId) -> AppResult<Option<String>> {
        let designs = self.designs.read().map_err(|_| poisoned("主数据"))?;
        Ok(designs.get(id).cloned())
    }

    async fn color_group_name(&self, id: &ColorGroupId) -> AppResult<Option<String>> {
        let color_groups = self.color_groups.read().map_err(|_| poisoned("主数据"))?;
        Ok(color_groups.get(id).cloned())
    }

    async fn factory_name(&self, id: &FactoryId) -> AppResult<Option<String>> {
        let factories = self.factories.read().map_err(|_| poisoned("主数据"))?;
        Ok(factories.get(id).cloned())
    }
}
