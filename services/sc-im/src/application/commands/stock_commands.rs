//! 库存命令

use cqrs_core::Command;
use domain_core::Quantity;
use errors::{AppError, AppResult};

use crate::domain::entities::{DispatchLineItem, ProducedPieceGroup};
use crate::domain::enums::ItemClass;
use crate::domain::services::RecalculationReport;
use crate::domain::value_objects::{
    DesignId, DispatchNoteId, FactoryId, OrderId, ProductionId, QualityId, SubCut,
};

/// 校验出货行集合的公共规则
fn validate_line_items(line_items: &[DispatchLineItem]) -> AppResult<()> {
    if line_items.is_empty() {
        return Err(AppError::validation("出货行不能为空"));
    }
    for line in line_items {
        match line {
            DispatchLineItem::Bulk(line) => {
                if line.unit_ids.is_empty()
                    && !line.bulk_qty.as_ref().map(Quantity::is_positive).unwrap_or(false)
                {
                    return Err(AppError::validation(
                        "匹布出货行必须预选布卷或给出正的出货米数",
                    ));
                }
            }
            DispatchLineItem::Count(line) => {
                if line.groups.is_empty() {
                    return Err(AppError::validation("计件出货行必须至少包含一个配色组"));
                }
                if line.groups.iter().any(|group| group.pieces < 0) {
                    return Err(AppError::validation("配色组件数不能为负"));
                }
            }
        }
    }
    Ok(())
}

/// 出货扣减命令（§6 Deduct：出货单已在别处建立）
#[derive(Debug, Clone)]
pub struct DeductStockCommand {
    pub line_items: Vec<DispatchLineItem>,
    pub dispatch_note_id: DispatchNoteId,
}

impl DeductStockCommand {
    pub fn validate(&self) -> AppResult<()> {
        validate_line_items(&self.line_items)
    }
}

impl Command for DeductStockCommand {
    type Result = ();
}

/// 建立出货单命令：校验 → 建单 → 扣减 → 回写订单，全程持配货锁
#[derive(Debug, Clone)]
pub struct CreateDispatchNoteCommand {
    pub challan_no: String,
    pub order_id: OrderId,
    pub line_items: Vec<DispatchLineItem>,
}

impl CreateDispatchNoteCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.challan_no.is_empty() {
            return Err(AppError::validation("出货单号不能为空"));
        }
        validate_line_items(&self.line_items)
    }
}

impl Command for CreateDispatchNoteCommand {
    type Result = DispatchNoteId;
}

/// 回写订单出货计数命令
#[derive(Debug, Clone)]
pub struct UpdateOrderDispatchCommand {
    pub order_id: OrderId,
    pub line_items: Vec<DispatchLineItem>,
}

impl Command for UpdateOrderDispatchCommand {
    type Result = ();
}

/// 库存重算命令
#[derive(Debug, Clone, Default)]
pub struct RecalculateStockCommand;

impl Command for RecalculateStockCommand {
    type Result = RecalculationReport;
}

/// 订单库存预留命令
#[derive(Debug, Clone)]
pub struct ReserveOrderStockCommand {
    pub order_id: OrderId,
}

impl Command for ReserveOrderStockCommand {
    type Result = ();
}

/// 生产入库的新建布卷
#[derive(Debug, Clone)]
pub struct NewStockUnit {
    pub unit_no: String,
    /// 携带米数
    pub meters: f64,
}

/// 生产入库命令
#[derive(Debug, Clone)]
pub struct RecordProductionCommand {
    pub item_class: ItemClass,
    pub quality_id: QualityId,
    pub design_id: Option<DesignId>,
    pub factory_id: FactoryId,
    pub sub_cut: Option<SubCut>,
    /// 入库米数（匹布，缺省时取布卷携带米数之和）
    pub bulk_meters: Option<f64>,
    /// 当批新建布卷（匹布）
    pub units: Vec<NewStockUnit>,
    /// 按配色组拆分的件数（计件）
    pub piece_groups: Vec<ProducedPieceGroup>,
}

impl RecordProductionCommand {
    pub fn validate(&self) -> AppResult<()> {
        match self.item_class {
            ItemClass::Bulk => {
                if self.units.is_empty()
                    && !self.bulk_meters.map(|meters| meters > 0.0).unwrap_or(false)
                {
                    return Err(AppError::validation(
                        "匹布入库必须登记布卷或给出正的入库米数",
                    ));
                }
                if self.units.iter().any(|unit| unit.meters <= 0.0) {
                    return Err(AppError::validation("布卷携带米数必须为正"));
                }
                if self.units.iter().any(|unit| unit.unit_no.is_empty()) {
                    return Err(AppError::validation("布卷卷号不能为空"));
                }
            }
            ItemClass::Count => {
                if self.design_id.is_none() {
                    return Err(AppError::validation("计件入库必须指定花型"));
                }
                if self.piece_groups.is_empty() {
                    return Err(AppError::validation("计件入库必须至少包含一个配色组"));
                }
                if self.piece_groups.iter().any(|group| group.pieces <= 0) {
                    return Err(AppError::validation("配色组件数必须为正"));
                }
            }
        }
        Ok(())
    }
}

impl Command for RecordProductionCommand {
    type Result = ProductionId;
}
