//! Business logic handler

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use cqrs_core::{CommandHandler, QueryHandler};
use domain_core::{Quantity, Unit};
use errors::{AppError, AppResult};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::entities::{DispatchNote, InventoryRecord, ProductionRecord, StockUnit};
use crate::domain::enums::ItemClass;
use crate::domain::events::{
    DispatchNoteCreated, OrderStockReserved, ProductionRecorded, StockDeducted, StockEvent,
    StockRecalculated,
};
use crate::domain::repositories::{
    DispatchNoteRepository, InventoryRecordRepository, MasterDataLookup, OrderRepository,
    ProductionRecordRepository, StockUnitRepository, UnitFilter,
};
use crate::domain::services::{
    AllocationEngine, OrderDispatchTracker, RecalculationReport, StockRebuilder, StockReservation,
    StockValidation, StockValidator,
};
use crate::domain::value_objects::{DispatchNoteId, ProductionId, StockPartition};
use crate::infrastructure::observability::metrics;
use crate::infrastructure::persistence::StockEventStore;

use super::commands::*;
use super::queries::*;

/// 库存服务应用处理器
///
/// 编排校验 → 扣减 → 订单回写的出货主流程。校验与扣减之间
/// 没有存储层原子性，靠单个配货互斥锁串行化所有变更路径；
/// 重算持同一把锁整段执行，保证重算期间没有并发配货。
pub struct ServiceHandler {
    inventory_repo: Arc<dyn InventoryRecordRepository>,
    unit_repo: Arc<dyn StockUnitRepository>,
    order_repo: Arc<dyn OrderRepository>,
    production_repo: Arc<dyn ProductionRecordRepository>,
    dispatch_repo: Arc<dyn DispatchNoteRepository>,
    event_store: Arc<dyn StockEventStore>,
    validator: StockValidator,
    engine: AllocationEngine,
    tracker: OrderDispatchTracker,
    reservation: StockReservation,
    rebuilder: StockRebuilder,
    /// 配货互斥锁：串行化 校验→扣减→订单回写 与重算
    allocation_lock: Mutex<()>,
}

impl ServiceHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        inventory_repo: Arc<dyn InventoryRecordRepository>,
        unit_repo: Arc<dyn StockUnitRepository>,
        order_repo: Arc<dyn OrderRepository>,
        production_repo: Arc<dyn ProductionRecordRepository>,
        dispatch_repo: Arc<dyn DispatchNoteRepository>,
        master_data: Arc<dyn MasterDataLookup>,
        event_store: Arc<dyn StockEventStore>,
        prune_orphans: bool,
    ) -> Self {
        let validator = StockValidator::new(
            inventory_repo.clone(),
            unit_repo.clone(),
            master_data.clone(),
        );
        let engine = AllocationEngine::new(inventory_repo.clone(), unit_repo.clone());
        let tracker = OrderDispatchTracker::new(order_repo.clone(), unit_repo.clone());
        let reservation = StockReservation::new(inventory_repo.clone());
        let rebuilder = StockRebuilder::new(
            inventory_repo.clone(),
            unit_repo.clone(),
            order_repo.clone(),
            production_repo.clone(),
            dispatch_repo.clone(),
            prune_orphans,
        );

        Self {
            inventory_repo,
            unit_repo,
            order_repo,
            production_repo,
            dispatch_repo,
            event_store,
            validator,
            engine,
            tracker,
            reservation,
            rebuilder,
            allocation_lock: Mutex::new(()),
        }
    }

    // ========== 校验 ==========

    /// 库存充足性校验（只读）
    pub async fn validate_stock(&self, query: ValidateStockQuery) -> AppResult<StockValidation> {
        let validation = self.validator.validate(&query.line_items).await?;
        metrics::record_validation(validation.valid);
        Ok(validation)
    }

    // ========== 出货 ==========

    /// 建立出货单：校验 → 建单 → 扣减 → 订单回写，全程持配货锁
    pub async fn create_dispatch_note(
        &self,
        cmd: CreateDispatchNoteCommand,
    ) -> AppResult<DispatchNoteId> {
        cmd.validate()?;
        let _guard = self.allocation_lock.lock().await;

        info!(
            challan_no = %cmd.challan_no,
            order = %cmd.order_id,
            lines = cmd.line_items.len(),
            "Creating dispatch note"
        );

        // 1. 校验：不足则在任何变更之前返回
        let validation = self.validator.validate(&cmd.line_items).await?;
        metrics::record_validation(validation.valid);
        if !validation.valid {
            return Err(AppError::failed_precondition(shortage_message(&validation)));
        }

        // 2. 建单
        let note = DispatchNote::new(cmd.challan_no.clone(), cmd.order_id.clone(), cmd.line_items);
        self.dispatch_repo.save(&note).await?;

        // 3. 扣减。此后失败不回滚已完成的变更，交由重算修复
        self.engine.deduct(note.line_items(), note.id()).await?;
        metrics::record_deduction(note.line_items().len());

        // 4. 订单回写
        self.tracker.apply(&cmd.order_id, note.line_items()).await?;

        self.event_store
            .append(StockEvent::DispatchNoteCreated(DispatchNoteCreated {
                dispatch_note_id: note.id().clone(),
                challan_no: cmd.challan_no,
                order_id: cmd.order_id,
                line_count: note.line_items().len(),
            }))
            .await?;

        info!(challan_no = %note.challan_no(), "Dispatch note created");
        Ok(note.id().clone())
    }

    /// 纯扣减（出货单已在别处建立）
    pub async fn deduct(&self, cmd: DeductStockCommand) -> AppResult<()> {
        cmd.validate()?;
        let _guard = self.allocation_lock.lock().await;

        self.engine
            .deduct(&cmd.line_items, &cmd.dispatch_note_id)
            .await?;
        metrics::record_deduction(cmd.line_items.len());

        self.event_store
            .append(StockEvent::StockDeducted(StockDeducted {
                dispatch_note_id: cmd.dispatch_note_id.clone(),
                line_count: cmd.line_items.len(),
            }))
            .await?;

        info!(dispatch_note = %cmd.dispatch_note_id, "Stock deducted");
        Ok(())
    }

    /// 回写订单出货计数
    pub async fn update_order_dispatch(&self, cmd: UpdateOrderDispatchCommand) -> AppResult<()> {
        let _guard = self.allocation_lock.lock().await;
        self.tracker.apply(&cmd.order_id, &cmd.line_items).await
    }

    // ========== 预留 ==========

    /// 订单登记时预留库存
    pub async fn reserve_order_stock(&self, cmd: ReserveOrderStockCommand) -> AppResult<()> {
        let _guard = self.allocation_lock.lock().await;

        let order = self
            .order_repo
            .find_by_id(&cmd.order_id)
            .await?
            .ok_or_else(|| AppError::not_found("订单不存在"))?;

        self.reservation.reserve_for_order(&order).await?;

        self.event_store
            .append(StockEvent::OrderStockReserved(OrderStockReserved {
                order_id: cmd.order_id,
                line_count: order.line_items().len(),
            }))
            .await?;

        Ok(())
    }

    // ========== 生产入库 ==========

    /// 登记生产入库
    pub async fn record_production(&self, cmd: RecordProductionCommand) -> AppResult<ProductionId> {
        cmd.validate()?;
        let _guard = self.allocation_lock.lock().await;

        let production = match cmd.item_class {
            ItemClass::Bulk => self.record_bulk_production(&cmd).await?,
            ItemClass::Count => self.record_count_production(&cmd).await?,
        };
        self.production_repo.save(&production).await?;

        let pieces: i64 = production
            .piece_groups()
            .iter()
            .map(|group| group.pieces)
            .sum();
        self.event_store
            .append(StockEvent::ProductionRecorded(ProductionRecorded {
                production_id: production.id().clone(),
                quality_id: cmd.quality_id.clone(),
                bulk_meters: production.bulk_qty().map(Quantity::to_decimal),
                unit_count: production.unit_ids().len() as i64,
                pieces,
            }))
            .await?;

        info!(
            production = %production.id(),
            quality = %cmd.quality_id,
            "Production recorded"
        );
        Ok(production.id().clone())
    }

    /// 匹布入库：登记布卷并累加分区计数器
    async fn record_bulk_production(
        &self,
        cmd: &RecordProductionCommand,
    ) -> AppResult<ProductionRecord> {
        let partition = StockPartition::bulk(cmd.quality_id.clone(), cmd.factory_id.clone());

        let mut unit_ids = Vec::with_capacity(cmd.units.len());
        let mut units_total = Quantity::zero(Unit::meter());
        for new_unit in &cmd.units {
            let unit = StockUnit::new(
                new_unit.unit_no.clone(),
                partition.clone(),
                Quantity::from_decimal(new_unit.meters, Unit::meter()),
            );
            units_total = units_total + unit.quantity().clone();
            unit_ids.push(unit.id().clone());
            self.unit_repo.save(&unit).await?;
        }

        // 显式米数优先，缺省取布卷之和
        let bulk_qty = cmd
            .bulk_meters
            .map(|meters| Quantity::from_decimal(meters, Unit::meter()))
            .unwrap_or(units_total);

        self.apply_production(&partition, Some(&bulk_qty), unit_ids.len() as i64, 0)
            .await?;

        Ok(ProductionRecord::bulk(
            cmd.quality_id.clone(),
            cmd.factory_id.clone(),
            bulk_qty,
            unit_ids,
        ))
    }

    /// 计件入库：每个配色组落到各自分区
    async fn record_count_production(
        &self,
        cmd: &RecordProductionCommand,
    ) -> AppResult<ProductionRecord> {
        let design_id = cmd
            .design_id
            .clone()
            .ok_or_else(|| AppError::validation("计件入库必须指定花型"))?;

        let production = ProductionRecord::count(
            cmd.quality_id.clone(),
            design_id,
            cmd.factory_id.clone(),
            cmd.sub_cut.clone(),
            cmd.piece_groups.clone(),
        );

        for (partition, pieces) in production.piece_partitions() {
            self.apply_production(&partition, None, 0, pieces).await?;
        }

        Ok(production)
    }

    /// 把入库量累加到分区记录上，首次观察到分区键时惰性建档
    async fn apply_production(
        &self,
        partition: &StockPartition,
        bulk: Option<&Quantity>,
        unit_count: i64,
        pieces: i64,
    ) -> AppResult<()> {
        match self.inventory_repo.find_by_partition(partition).await? {
            Some(mut record) => {
                record.add_production(bulk, unit_count, pieces);
                self.inventory_repo.update(&record).await
            }
            None => {
                let mut record = InventoryRecord::new(partition.clone());
                record.add_production(bulk, unit_count, pieces);
                self.inventory_repo.save(&record).await
            }
        }
    }

    // ========== 重算 ==========

    /// 全量重算库存账
    pub async fn recalculate(&self, _cmd: RecalculateStockCommand) -> AppResult<RecalculationReport> {
        let _guard = self.allocation_lock.lock().await;

        info!("Starting stock recalculation");
        let started = Instant::now();
        let report = self.rebuilder.rebuild().await?;
        metrics::record_recalculation(started.elapsed(), report.updated_records);

        self.event_store
            .append(StockEvent::StockRecalculated(StockRecalculated {
                updated_records: report.updated_records,
                pruned_records: report.pruned_records,
                units_resynced: report.units_resynced,
            }))
            .await?;

        Ok(report)
    }

    // ========== 布卷 ==========

    /// 按条件列出在库可售布卷
    pub async fn list_available_units(
        &self,
        query: ListAvailableUnitsQuery,
    ) -> AppResult<Vec<StockUnit>> {
        let filter = UnitFilter {
            quality_id: query.quality_id,
            design_id: query.design_id,
            factory_id: query.factory_id,
        };
        self.unit_repo.list_available(&filter).await
    }

    /// 显式设置布卷状态
    pub async fn set_unit_status(&self, cmd: SetUnitStatusCommand) -> AppResult<StockUnit> {
        cmd.validate()?;

        let mut unit = self
            .unit_repo
            .find_by_id(&cmd.unit_id)
            .await?
            .ok_or_else(|| AppError::not_found("布卷不存在"))?;

        unit.set_status(cmd.status, cmd.dispatch_note_id)?;
        self.unit_repo.update(&unit).await?;

        info!(unit_no = %unit.unit_no(), status = ?unit.status(), "Unit status updated");
        Ok(unit)
    }
}

/// 缺货报告的展示文本
fn shortage_message(validation: &StockValidation) -> String {
    let details: Vec<String> = validation
        .insufficient_items
        .iter()
        .map(|item| {
            let mut name = item.quality_name.clone();
            if let Some(group_name) = &item.color_group_name {
                name.push_str(&format!(" / {}", group_name));
            }
            if let Some(sub_cut) = &item.sub_cut {
                name.push_str(&format!(" / {}", sub_cut));
            }
            format!(
                "{}: 需 {:.3}，可用 {:.3}，缺 {:.3}",
                name, item.required, item.available, item.deficit
            )
        })
        .collect();
    let message = format!("库存不足: {}", details.join("; "));
    warn!("{}", message);
    message
}

// ============================================================================
// CQRS Handler 实现
// ============================================================================

#[async_trait]
impl QueryHandler<ValidateStockQuery> for ServiceHandler {
    async fn handle(&self, query: ValidateStockQuery) -> AppResult<StockValidation> {
        self.validate_stock(query).await
    }
}

#[async_trait]
impl CommandHandler<CreateDispatchNoteCommand> for ServiceHandler {
    async fn handle(&self, command: CreateDispatchNoteCommand) -> AppResult<DispatchNoteId> {
        self.create_dispatch_note(command).await
    }
}

#[async_trait]
impl CommandHandler<DeductStockCommand> for ServiceHandler {
    async fn handle(&self, command: DeductStockCommand) -> AppResult<()> {
        self.deduct(command).await
    }
}

#[async_trait]
impl CommandHandler<UpdateOrderDispatchCommand> for ServiceHandler {
    async fn handle(&self, command: UpdateOrderDispatchCommand) -> AppResult<()> {
        self.update_order_dispatch(command).await
    }
}

#[async_trait]
impl CommandHandler<ReserveOrderStockCommand> for ServiceHandler {
    async fn handle(&self, command: ReserveOrderStockCommand) -> AppResult<()> {
        self.reserve_order_stock(command).await
    }
}

#[async_trait]
impl CommandHandler<RecordProductionCommand> for ServiceHandler {
    async fn handle(&self, command: RecordProductionCommand) -> AppResult<ProductionId> {
        self.record_production(command).await
    }
}

#[async_trait]
impl CommandHandler<RecalculateStockCommand> for ServiceHandler {
    async fn handle(&self, command: RecalculateStockCommand) -> AppResult<RecalculationReport> {
        self.recalculate(command).await
    }
}

#[async_trait]
impl QueryHandler<ListAvailableUnitsQuery> for ServiceHandler {
    async fn handle(&self, query: ListAvailableUnitsQuery) -> AppResult<Vec<StockUnit>> {
        self.list_available_units(query).await
    }
}

#[async_trait]
impl CommandHandler<SetUnitStatusCommand> for ServiceHandler {
    async fn handle(&self, command: SetUnitStatusCommand) -> AppResult<StockUnit> {
        self.set_unit_status(command).await
    }
}
