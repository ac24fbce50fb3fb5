//! 库存充足性校验

use std::sync::Arc;

use domain_core::Quantity;
use errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::entities::{BulkDispatchLine, CountDispatchLine, DispatchLineItem};
use crate::domain::enums::ItemClass;
use crate::domain::repositories::{
    InventoryRecordRepository, MasterDataLookup, StockUnitRepository,
};
use crate::domain::value_objects::{ColorGroupId, QualityId, SubCut};

/// 缺货明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortageItem {
    pub item_class: ItemClass,
    pub quality_id: QualityId,
    pub quality_name: String,
    pub color_group_id: Option<ColorGroupId>,
    pub color_group_name: Option<String>,
    pub sub_cut: Option<SubCut>,
    /// 所需数量（匹布为米，计件为件）
    pub required: f64,
    /// 跨工厂合计可用数量
    pub available: f64,
    /// 缺口
    pub deficit: f64,
}

/// 校验结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockValidation {
    pub valid: bool,
    pub insufficient_items: Vec<ShortageItem>,
}

/// 库存充足性校验服务
///
/// 纯读路径：汇总各工厂在库量与需求比对，不做任何变更。
/// 与配货引擎的原子性由应用层的配货互斥锁保证。
pub struct StockValidator {
    inventory_repo: Arc<dyn InventoryRecordRepository>,
    unit_repo: Arc<dyn StockUnitRepository>,
    master_data: Arc<dyn MasterDataLookup>,
}

impl StockValidator {
    pub fn new(
        inventory_repo: Arc<dyn InventoryRecordRepository>,
        unit_repo: Arc<dyn StockUnitRepository>,
        master_data: Arc<dyn MasterDataLookup>,
    ) -> Self {
        Self {
            inventory_repo,
            unit_repo,
            master_data,
        }
    }

    /// 校验一组出货行的库存是否充足
    pub async fn validate(&self, line_items: &[DispatchLineItem]) -> AppResult<StockValidation> {
        let mut insufficient_items = Vec::new();

        for line in line_items {
            match line {
                DispatchLineItem::Bulk(line) => {
                    self.validate_bulk_line(line, &mut insufficient_items)
                        .await?;
                }
                DispatchLineItem::Count(line) => {
                    self.validate_count_line(line, &mut insufficient_items)
                        .await?;
                }
            }
        }

        debug!(
            shortages = insufficient_items.len(),
            "Stock validation finished"
        );

        Ok(StockValidation {
            valid: insufficient_items.is_empty(),
            insufficient_items,
        })
    }

    /// 匹布行：跨工厂按品质汇总在库米数
    async fn validate_bulk_line(
        &self,
        line: &BulkDispatchLine,
        insufficient_items: &mut Vec<ShortageItem>,
    ) -> AppResult<()> {
        // 1. 所需米数：预选布卷的携带米数之和，否则取显式米数
        let required = self.resolve_required_bulk(line).await?;
        if required <= 0 {
            return Ok(());
        }

        // 2. 跨工厂汇总在库量（刻意不限工厂，扣减可从任意工厂取货）
        let records = self
            .inventory_repo
            .find_bulk_by_quality(&line.quality_id)
            .await?;
        let available: i64 = records
            .iter()
            .map(|record| record.produced_bulk().value)
            .sum();

        if available < required {
            let quality_name = self.display_quality_name(&line.quality_id).await?;
            insufficient_items.push(ShortageItem {
                item_class: ItemClass::Bulk,
                quality_id: line.quality_id.clone(),
                quality_name,
                color_group_id: None,
                color_group_name: None,
                sub_cut: None,
                required: scaled_to_decimal(required),
                available: scaled_to_decimal(available),
                deficit: scaled_to_decimal(required - available),
            });
        }

        Ok(())
    }

    /// 计件行：按配色组逐一汇总，匹配不含裁切规格
    async fn validate_count_line(
        &self,
        line: &CountDispatchLine,
        insufficient_items: &mut Vec<ShortageItem>,
    ) -> AppResult<()> {
        for group in &line.groups {
            if group.pieces <= 0 {
                continue;
            }

            let records = self
                .inventory_repo
                .find_count_by_group(&line.quality_id, &line.design_id, &group.color_group_id)
                .await?;
            let available: i64 = records
                .iter()
                .map(|record| record.produced_piece_qty())
                .sum();

            if available < group.pieces {
                let quality_name = self.display_quality_name(&line.quality_id).await?;
                let color_group_name = self
                    .master_data
                    .color_group_name(&group.color_group_id)
                    .await?;
                insufficient_items.push(ShortageItem {
                    item_class: ItemClass::Count,
                    quality_id: line.quality_id.clone(),
                    quality_name,
                    color_group_id: Some(group.color_group_id.clone()),
                    color_group_name,
                    sub_cut: line.sub_cut.clone(),
                    required: group.pieces as f64,
                    available: available as f64,
                    deficit: (group.pieces - available) as f64,
                });
            }
        }

        Ok(())
    }

    /// 所需米数：预选布卷之和，否则显式米数
    async fn resolve_required_bulk(&self, line: &BulkDispatchLine) -> AppResult<i64> {
        if line.unit_ids.is_empty() {
            return Ok(line.bulk_qty.as_ref().map(|qty| qty.value).unwrap_or(0));
        }

        let units = self.unit_repo.find_by_ids(&line.unit_ids).await?;
        if units.len() != line.unit_ids.len() {
            return Err(AppError::not_found(format!(
                "出货行引用的布卷不存在（{}/{} 可查到）",
                units.len(),
                line.unit_ids.len()
            )));
        }

        Ok(units.iter().map(|unit| unit.quantity().value).sum())
    }

    /// 展示用布种名称，主数据缺失时退回 ID
    async fn display_quality_name(&self, quality_id: &QualityId) -> AppResult<String> {
        Ok(self
            .master_data
            .quality_name(quality_id)
            .await?
            .unwrap_or_else(|| quality_id.to_string()))
    }
}

fn scaled_to_decimal(value: i64) -> f64 {
    Quantity::from_raw(value, domain_core::Unit::meter()).to_decimal()
}
