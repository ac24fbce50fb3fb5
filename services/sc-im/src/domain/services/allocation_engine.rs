//! 配货引擎
//!
//! 出货扣减的多工厂贪心算法：每个需求按"存量最大的工厂优先"
//! 排序后逐个扣减，优先清空存量最多的工厂，保持库存集中、减少碎片。

use std::collections::HashMap;
use std::sync::Arc;

use domain_core::{Quantity, Unit};
use errors::{AppError, AppResult};
use tracing::{debug, warn};

use crate::domain::entities::{
    BulkDispatchLine, CountDispatchLine, DispatchLineItem, InventoryRecord,
};
use crate::domain::repositories::{InventoryRecordRepository, StockUnitRepository};
use crate::domain::value_objects::{DispatchNoteId, InventoryRecordId};
use crate::infrastructure::observability::metrics;

/// 存量最大优先的扣减计划
///
/// 入参为各记录的可扣量（缩放整数），按可扣量降序逐个取
/// `min(可扣量, 剩余需求)`，直到需求满足。可扣量不足以满足
/// 全部需求时只规划到零为止，余量由调用方按截断语义处理。
pub fn plan_largest_first(
    available: &[(InventoryRecordId, i64)],
    required: i64,
) -> Vec<(InventoryRecordId, i64)> {
    let mut sorted: Vec<_> = available
        .iter()
        .filter(|(_, amount)| *amount > 0)
        .cloned()
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    let mut plan = Vec::new();
    let mut remaining = required;
    for (record_id, amount) in sorted {
        if remaining <= 0 {
            break;
        }
        let take = amount.min(remaining);
        if take > 0 {
            plan.push((record_id, take));
            remaining -= take;
        }
    }
    plan
}

/// 比例布卷数：ceil(take / required × total_units)
///
/// 调用方的布卷清单并不按工厂归属，聚合计数只能按比例近似，
/// 精确归属在布卷行上（见布卷实体的售出标记）
pub(crate) fn proportional_unit_take(take: i64, required: i64, total_units: i64) -> i64 {
    if required <= 0 || total_units <= 0 {
        return 0;
    }
    let numerator = take as i128 * total_units as i128;
    let required = required as i128;
    ((numerator + required - 1) / required) as i64
}

/// 配货引擎
pub struct AllocationEngine {
    inventory_repo: Arc<dyn InventoryRecordRepository>,
    unit_repo: Arc<dyn StockUnitRepository>,
}

impl AllocationEngine {
    pub fn new(
        inventory_repo: Arc<dyn InventoryRecordRepository>,
        unit_repo: Arc<dyn StockUnitRepository>,
    ) -> Self {
        Self {
            inventory_repo,
            unit_repo,
        }
    }

    /// 对已通过校验的出货行执行扣减
    ///
    /// 逐行更新库存记录并标记预选布卷售出。中途失败不回滚已
    /// 完成的扣减（尽力而为语义），调用方以重算修复漂移。
    pub async fn deduct(
        &self,
        line_items: &[DispatchLineItem],
        dispatch_note_id: &DispatchNoteId,
    ) -> AppResult<()> {
        for line in line_items {
            match line {
                DispatchLineItem::Bulk(line) => {
                    self.deduct_bulk_line(line, dispatch_note_id).await?;
                }
                DispatchLineItem::Count(line) => {
                    self.deduct_count_line(line).await?;
                }
            }
        }
        Ok(())
    }

    /// 匹布行扣减
    async fn deduct_bulk_line(
        &self,
        line: &BulkDispatchLine,
        dispatch_note_id: &DispatchNoteId,
    ) -> AppResult<()> {
        // 1. 所需米数
        let selected_units = if line.unit_ids.is_empty() {
            Vec::new()
        } else {
            let units = self.unit_repo.find_by_ids(&line.unit_ids).await?;
            if units.len() != line.unit_ids.len() {
                return Err(AppError::not_found(format!(
                    "出货行引用的布卷不存在（{}/{} 可查到）",
                    units.len(),
                    line.unit_ids.len()
                )));
            }
            units
        };
        let required: i64 = if selected_units.is_empty() {
            line.bulk_qty.as_ref().map(|qty| qty.value).unwrap_or(0)
        } else {
            selected_units
                .iter()
                .map(|unit| unit.quantity().value)
                .sum()
        };
        if required <= 0 {
            // 零需求行直接跳过
            return Ok(());
        }

        // 2. 加载全部工厂的记录并按存量降序规划
        let records = self
            .inventory_repo
            .find_bulk_by_quality(&line.quality_id)
            .await?;
        let mut by_id: HashMap<InventoryRecordId, InventoryRecord> = records
            .into_iter()
            .map(|record| (record.id().clone(), record))
            .collect();
        let available: Vec<(InventoryRecordId, i64)> = by_id
            .values()
            .map(|record| (record.id().clone(), record.produced_bulk().value))
            .collect();
        let plan = plan_largest_first(&available, required);

        // 3. 逐记录扣减，布卷数按比例近似
        let total_units = line.unit_ids.len() as i64;
        let mut unit_budget = total_units;
        let mut satisfied: i64 = 0;
        for (record_id, take_value) in &plan {
            let record = by_id.get_mut(record_id).ok_or_else(|| {
                AppError::internal("扣减计划引用了未加载的库存记录")
            })?;
            let unit_take =
                proportional_unit_take(*take_value, required, total_units).min(unit_budget);
            let take = Quantity::from_raw(*take_value, Unit::meter());
            record.deduct_bulk(&take, unit_take);
            self.inventory_repo.update(record).await?;
            unit_budget -= unit_take;
            satisfied += take_value;
        }

        if satisfied < required {
            // 校验后发生漂移才会走到这里：扣到零为止，余量按截断丢弃
            warn!(
                quality = %line.quality_id,
                required,
                satisfied,
                "Insufficient stock during deduction, remainder dropped"
            );
            metrics::record_clamped_deduction("bulk");
        }

        // 4. 精确标记预选布卷售出
        for mut unit in selected_units {
            unit.mark_sold(dispatch_note_id.clone())?;
            self.unit_repo.update(&unit).await?;
        }

        debug!(
            quality = %line.quality_id,
            required,
            records = plan.len(),
            "Bulk dispatch line deducted"
        );

        Ok(())
    }

    /// 计件行扣减：按配色组逐一走同样的贪心，匹配含裁切规格
    async fn deduct_count_line(&self, line: &CountDispatchLine) -> AppResult<()> {
        for group in &line.groups {
            if group.pieces <= 0 {
                continue;
            }

            let records = self
                .inventory_repo
                .find_count_by_group(&line.quality_id, &line.design_id, &group.color_group_id)
                .await?;
            let mut by_id: HashMap<InventoryRecordId, InventoryRecord> = records
                .into_iter()
                .filter(|record| record.partition().sub_cut.as_ref() == line.sub_cut.as_ref())
                .map(|record| (record.id().clone(), record))
                .collect();
            let available: Vec<(InventoryRecordId, i64)> = by_id
                .values()
                .map(|record| (record.id().clone(), record.produced_piece_qty()))
                .collect();
            let plan = plan_largest_first(&available, group.pieces);

            let mut satisfied: i64 = 0;
            for (record_id, take) in &plan {
                let record = by_id.get_mut(record_id).ok_or_else(|| {
                    AppError::internal("扣减计划引用了未加载的库存记录")
                })?;
                record.deduct_pieces(*take);
                self.inventory_repo.update(record).await?;
                satisfied += take;
            }

            if satisfied < group.pieces {
                warn!(
                    quality = %line.quality_id,
                    color_group = %group.color_group_id,
                    required = group.pieces,
                    satisfied,
                    "Insufficient stock during deduction, remainder dropped"
                );
                metrics::record_clamped_deduction("count");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_ids(n: usize) -> Vec<InventoryRecordId> {
        (0..n).map(|_| InventoryRecordId::new()).collect()
    }

    #[test]
    fn test_plan_prefers_largest_record() {
        let ids = record_ids(3);
        let available = vec![
            (ids[0].clone(), 50_000),
            (ids[1].clone(), 30_000),
            (ids[2].clone(), 10_000),
        ];

        let plan = plan_largest_first(&available, 40_000);

        // 单个工厂足量时绝不拆单
        assert_eq!(plan, vec![(ids[0].clone(), 40_000)]);
    }

    #[test]
    fn test_plan_spills_to_next_largest() {
        let ids = record_ids(2);
        let available = vec![(ids[0].clone(), 100_000), (ids[1].clone(), 40_000)];

        let plan = plan_largest_first(&available, 120_000);

        assert_eq!(
            plan,
            vec![(ids[0].clone(), 100_000), (ids[1].clone(), 20_000)]
        );
    }

    #[test]
    fn test_plan_stops_at_zero_when_insufficient() {
        let ids = record_ids(2);
        let available = vec![(ids[0].clone(), 30_000), (ids[1].clone(), 10_000)];

        let plan = plan_largest_first(&available, 100_000);

        let total: i64 = plan.iter().map(|(_, take)| take).sum();
        assert_eq!(total, 40_000);
    }

    #[test]
    fn test_plan_skips_empty_records() {
        let ids = record_ids(2);
        let available = vec![(ids[0].clone(), 0), (ids[1].clone(), 5_000)];

        let plan = plan_largest_first(&available, 3_000);

        assert_eq!(plan, vec![(ids[1].clone(), 3_000)]);
    }

    #[test]
    fn test_proportional_unit_take_rounds_up() {
        // 取 60/100，共 3 卷 → ceil(1.8) = 2
        assert_eq!(proportional_unit_take(60, 100, 3), 2);
        // 全量 → 全部布卷
        assert_eq!(proportional_unit_take(100, 100, 3), 3);
        // 无布卷清单时不近似
        assert_eq!(proportional_unit_take(60, 100, 0), 0);
    }
}
