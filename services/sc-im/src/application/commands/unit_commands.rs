//! 布卷命令

use cqrs_core::Command;
use errors::{AppError, AppResult};

use crate::domain::entities::StockUnit;
use crate::domain::enums::UnitStatus;
use crate::domain::value_objects::{DispatchNoteId, StockUnitId};

/// 显式设置布卷状态命令
#[derive(Debug, Clone)]
pub struct SetUnitStatusCommand {
    pub unit_id: StockUnitId,
    pub status: UnitStatus,
    pub dispatch_note_id: Option<DispatchNoteId>,
}

impl SetUnitStatusCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.status.is_sold() && self.dispatch_note_id.is_none() {
            return Err(AppError::validation("置为已售必须关联出货单"));
        }
        Ok(())
    }
}

impl Command for SetUnitStatusCommand {
    type Result = StockUnit;
}
