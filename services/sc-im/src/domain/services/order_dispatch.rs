//! 订单出货跟踪

use std::sync::Arc;

use domain_core::{Quantity, Unit};
use errors::{AppError, AppResult};
use tracing::info;

use crate::domain::entities::{BulkDispatchLine, DispatchLineItem};
use crate::domain::repositories::{OrderRepository, StockUnitRepository};
use crate::domain::value_objects::OrderId;

/// 订单出货跟踪服务
///
/// 把刚出货的行量累加到来源订单的行计数上并推进出货状态。
/// 后续步骤失败没有回滚路径，订单级状态可能与真实出货量漂移，
/// 由重算修复。
pub struct OrderDispatchTracker {
    order_repo: Arc<dyn OrderRepository>,
    unit_repo: Arc<dyn StockUnitRepository>,
}

impl OrderDispatchTracker {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        unit_repo: Arc<dyn StockUnitRepository>,
    ) -> Self {
        Self {
            order_repo,
            unit_repo,
        }
    }

    /// 把出货行累加到订单上
    ///
    /// 匹布行按行号对应订单行，计件行在同号订单行内按配色组对应
    pub async fn apply(
        &self,
        order_id: &OrderId,
        line_items: &[DispatchLineItem],
    ) -> AppResult<()> {
        let mut order = self
            .order_repo
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("订单不存在"))?;

        for (line_index, line) in line_items.iter().enumerate() {
            match line {
                DispatchLineItem::Bulk(line) => {
                    let dispatched = self.resolve_dispatched_bulk(line).await?;
                    if dispatched.is_positive() {
                        order.add_dispatched_bulk(line_index, &dispatched);
                    }
                }
                DispatchLineItem::Count(line) => {
                    for group in &line.groups {
                        if group.pieces > 0 {
                            order.add_dispatched_pieces(
                                line_index,
                                &group.color_group_id,
                                group.pieces,
                            );
                        }
                    }
                }
            }
        }

        order.refresh_dispatch_status();
        self.order_repo.update(&order).await?;

        info!(
            order_no = %order.order_no(),
            dispatch_status = ?order.dispatch_status(),
            "Order dispatch counters updated"
        );

        Ok(())
    }

    /// 实际出货米数：预选布卷之和，否则显式米数
    async fn resolve_dispatched_bulk(&self, line: &BulkDispatchLine) -> AppResult<Quantity> {
        if line.unit_ids.is_empty() {
            return Ok(line
                .bulk_qty
                .clone()
                .unwrap_or_else(|| Quantity::zero(Unit::meter())));
        }

        let units = self.unit_repo.find_by_ids(&line.unit_ids).await?;
        let total: i64 = units.iter().map(|unit| unit.quantity().value).sum();
        Ok(Quantity::from_raw(total, Unit::meter()))
    }
}
