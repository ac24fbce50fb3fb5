//! 库存重算器
//!
//! 从全量生产记录、出货单和未终态订单出发，幂等地重算每条库存
//! 记录的计数器，修复增量配货路径累积的漂移（重复扣减、中途崩溃、
//! 人工改库）。整个过程与配货引擎共用同一套"存量最大优先"算法，
//! 保证重算结果与增量路径一致。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use domain_core::{Quantity, Unit};
use errors::AppResult;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::entities::{DispatchLineItem, InventoryRecord, Order, OrderLineItem, StockUnit};
use crate::domain::repositories::{
    DispatchNoteRepository, InventoryRecordRepository, OrderRepository,
    ProductionRecordRepository, StockUnitRepository,
};
use crate::domain::services::allocation_engine::{plan_largest_first, proportional_unit_take};
use crate::domain::value_objects::{InventoryRecordId, StockPartition, StockUnitId};

/// 重算结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecalculationReport {
    /// 回写的记录数（重算值与库值不同才回写）
    pub updated_records: u64,
    /// 清理的孤儿记录数
    pub pruned_records: u64,
    /// 修正状态的布卷数
    pub units_resynced: u64,
    /// 找不到匹配分区而跳过的生产记录数
    pub skipped_productions: u64,
}

/// 重算中的计数器
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CalcCounters {
    produced_bulk: i64,
    produced_unit_count: i64,
    produced_piece_qty: i64,
    reserved_bulk: i64,
    reserved_piece_qty: i64,
}

/// 库存重算服务
pub struct StockRebuilder {
    inventory_repo: Arc<dyn InventoryRecordRepository>,
    unit_repo: Arc<dyn StockUnitRepository>,
    order_repo: Arc<dyn OrderRepository>,
    production_repo: Arc<dyn ProductionRecordRepository>,
    dispatch_repo: Arc<dyn DispatchNoteRepository>,
    /// 是否清理孤儿记录
    prune_orphans: bool,
}

impl StockRebuilder {
    pub fn new(
        inventory_repo: Arc<dyn InventoryRecordRepository>,
        unit_repo: Arc<dyn StockUnitRepository>,
        order_repo: Arc<dyn OrderRepository>,
        production_repo: Arc<dyn ProductionRecordRepository>,
        dispatch_repo: Arc<dyn DispatchNoteRepository>,
        prune_orphans: bool,
    ) -> Self {
        Self {
            inventory_repo,
            unit_repo,
            order_repo,
            production_repo,
            dispatch_repo,
            prune_orphans,
        }
    }

    /// 全量重算
    ///
    /// 可安全重复执行：无新事件时连续两次重算，第二次零回写
    pub async fn rebuild(&self) -> AppResult<RecalculationReport> {
        let mut report = RecalculationReport::default();

        // 1. 加载全部记录，重算计数器清零（不删记录，分区键在别处引用）
        let mut records = self.inventory_repo.list_all().await?;
        let mut calc: HashMap<InventoryRecordId, CalcCounters> = records
            .iter()
            .map(|record| (record.id().clone(), CalcCounters::default()))
            .collect();
        // 分区键 → 记录 ID 索引，首个匹配生效
        let mut partition_index: HashMap<StockPartition, InventoryRecordId> = HashMap::new();
        for record in &records {
            partition_index
                .entry(record.partition().clone())
                .or_insert_with(|| record.id().clone());
        }
        // 被生产记录引用过的记录不参与孤儿清理
        let mut produced_record_ids: HashSet<InventoryRecordId> = HashSet::new();

        // 2. 回放生产：找不到分区的事件跳过，不自动建档
        let productions = self.production_repo.list_all().await?;
        for production in &productions {
            if let (Some(partition), Some(bulk_qty)) =
                (production.bulk_partition(), production.bulk_qty())
            {
                match partition_index.get(&partition) {
                    Some(record_id) => {
                        if let Some(counters) = calc.get_mut(record_id) {
                            counters.produced_bulk += bulk_qty.value;
                            counters.produced_unit_count += production.unit_ids().len() as i64;
                        }
                        produced_record_ids.insert(record_id.clone());
                    }
                    None => {
                        warn!(
                            production = %production.id(),
                            "Production references an unknown partition, skipping"
                        );
                        report.skipped_productions += 1;
                    }
                }
            }
            for (partition, pieces) in production.piece_partitions() {
                match partition_index.get(&partition) {
                    Some(record_id) => {
                        if let Some(counters) = calc.get_mut(record_id) {
                            counters.produced_piece_qty += pieces;
                        }
                        produced_record_ids.insert(record_id.clone());
                    }
                    None => {
                        warn!(
                            production = %production.id(),
                            "Production references an unknown partition, skipping"
                        );
                        report.skipped_productions += 1;
                    }
                }
            }
        }

        // 3. 回放出货：对重算计数器重演同一套存量最大优先的扣减，
        //    重建当初没有落库的分工厂归属
        let units_by_id: HashMap<StockUnitId, StockUnit> = self
            .unit_repo
            .list_all()
            .await?
            .into_iter()
            .map(|unit| (unit.id().clone(), unit))
            .collect();
        let notes = self.dispatch_repo.list_all().await?;
        for note in &notes {
            for line in note.line_items() {
                self.replay_dispatch_line(line, &records, &mut calc, &units_by_id);
            }
        }

        // 4. 未终态订单的待出货量计入预留，落在当前余量最大的记录上
        let open_orders = self.order_repo.list_open().await?;
        for order in &open_orders {
            self.replay_reservations(order, &records, &mut calc);
        }

        // 5/6. 截断负值并回写有变化的记录
        for record in &mut records {
            let counters = calc
                .get(record.id())
                .cloned()
                .unwrap_or_default();

            let changed = record.overwrite_counters(
                Quantity::from_raw(counters.produced_bulk.max(0), Unit::meter()),
                counters.produced_unit_count.max(0),
                counters.produced_piece_qty.max(0),
                Quantity::from_raw(counters.reserved_bulk.max(0), Unit::meter()),
                // 预留布卷数定义为可推导值，从不独立落库
                0,
                counters.reserved_piece_qty.max(0),
            );

            if self.prune_orphans
                && record.is_orphan()
                && !produced_record_ids.contains(record.id())
            {
                self.inventory_repo.delete(record.id()).await?;
                report.pruned_records += 1;
                continue;
            }

            if changed {
                self.inventory_repo.update(record).await?;
                report.updated_records += 1;
            }
        }

        // 7. 布卷状态与出货单关联重新对齐
        for mut unit in units_by_id.into_values() {
            if unit.resync_status() {
                self.unit_repo.update(&unit).await?;
                report.units_resynced += 1;
            }
        }

        info!(
            updated = report.updated_records,
            pruned = report.pruned_records,
            units_resynced = report.units_resynced,
            skipped_productions = report.skipped_productions,
            "Stock recalculation finished"
        );

        Ok(report)
    }

    /// 对重算计数器重演一条出货行
    fn replay_dispatch_line(
        &self,
        line: &DispatchLineItem,
        records: &[InventoryRecord],
        calc: &mut HashMap<InventoryRecordId, CalcCounters>,
        units_by_id: &HashMap<StockUnitId, StockUnit>,
    ) {
        match line {
            DispatchLineItem::Bulk(line) => {
                let required: i64 = if line.unit_ids.is_empty() {
                    line.bulk_qty.as_ref().map(|qty| qty.value).unwrap_or(0)
                } else {
                    line.unit_ids
                        .iter()
                        .filter_map(|id| units_by_id.get(id))
                        .map(|unit| unit.quantity().value)
                        .sum()
                };
                if required <= 0 {
                    return;
                }

                let available: Vec<(InventoryRecordId, i64)> = records
                    .iter()
                    .filter(|record| record.partition().matches_bulk_quality(&line.quality_id))
                    .map(|record| {
                        let produced = calc
                            .get(record.id())
                            .map(|counters| counters.produced_bulk)
                            .unwrap_or(0);
                        (record.id().clone(), produced)
                    })
                    .collect();
                let plan = plan_largest_first(&available, required);

                let total_units = line.unit_ids.len() as i64;
                let mut unit_budget = total_units;
                for (record_id, take) in plan {
                    let unit_take =
                        proportional_unit_take(take, required, total_units).min(unit_budget);
                    unit_budget -= unit_take;
                    if let Some(counters) = calc.get_mut(&record_id) {
                        counters.produced_bulk -= take;
                        counters.produced_unit_count -= unit_take;
                    }
                }
            }
            DispatchLineItem::Count(line) => {
                for group in &line.groups {
                    if group.pieces <= 0 {
                        continue;
                    }
                    let available: Vec<(InventoryRecordId, i64)> = records
                        .iter()
                        .filter(|record| {
                            record.partition().matches_count_partition(
                                &line.quality_id,
                                &line.design_id,
                                &group.color_group_id,
                                line.sub_cut.as_ref(),
                            )
                        })
                        .map(|record| {
                            let produced = calc
                                .get(record.id())
                                .map(|counters| counters.produced_piece_qty)
                                .unwrap_or(0);
                            (record.id().clone(), produced)
                        })
                        .collect();
                    for (record_id, take) in plan_largest_first(&available, group.pieces) {
                        if let Some(counters) = calc.get_mut(&record_id) {
                            counters.produced_piece_qty -= take;
                        }
                    }
                }
            }
        }
    }

    /// 把一张未终态订单的待出货量计入预留
    ///
    /// 与出货回放不同，预留选择当前 (produced − reserved) 余量
    /// 最大的单条记录：预留应当落在最宽裕的工厂
    fn replay_reservations(
        &self,
        order: &Order,
        records: &[InventoryRecord],
        calc: &mut HashMap<InventoryRecordId, CalcCounters>,
    ) {
        for line in order.line_items() {
            match line {
                OrderLineItem::Bulk(line) => {
                    let pending = (line.quantity.value - line.dispatched.value).max(0);
                    if pending == 0 {
                        continue;
                    }
                    let best = records
                        .iter()
                        .filter(|record| {
                            record.partition().matches_bulk_quality(&line.quality_id)
                        })
                        .max_by_key(|record| {
                            calc.get(record.id())
                                .map(|counters| counters.produced_bulk - counters.reserved_bulk)
                                .unwrap_or(0)
                        });
                    match best {
                        Some(record) => {
                            if let Some(counters) = calc.get_mut(record.id()) {
                                counters.reserved_bulk += pending;
                            }
                        }
                        None => {
                            debug!(
                                order_no = %order.order_no(),
                                quality = %line.quality_id,
                                "No inventory record for pending bulk reservation"
                            );
                        }
                    }
                }
                OrderLineItem::Count(line) => {
                    for group in &line.groups {
                        let pending = (group.quantity - group.dispatched).max(0);
                        if pending == 0 {
                            continue;
                        }
                        let best = records
                            .iter()
                            .filter(|record| {
                                record.partition().matches_count_partition(
                                    &line.quality_id,
                                    &line.design_id,
                                    &group.color_group_id,
                                    line.sub_cut.as_ref(),
                                )
                            })
                            .max_by_key(|record| {
                                calc.get(record.id())
                                    .map(|counters| {
                                        counters.produced_piece_qty - counters.reserved_piece_qty
                                    })
                                    .unwrap_or(0)
                            });
                        match best {
                            Some(record) => {
                                if let Some(counters) = calc.get_mut(record.id()) {
                                    counters.reserved_piece_qty += pending;
                                }
                            }
                            None => {
                                debug!(
                                    order_no = %order.order_no(),
                                    quality = %line.quality_id,
                                    color_group = %group.color_group_id,
                                    "No inventory record for pending piece reservation"
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}
