//! 订单库存预留

use std::sync::Arc;

use domain_core::Quantity;
use errors::AppResult;
use tracing::{debug, info};

use crate::domain::entities::{InventoryRecord, Order, OrderLineItem};
use crate::domain::repositories::InventoryRecordRepository;

/// 订单库存预留服务
///
/// 重算器第 4 步的增量对应物：订单登记时把各行待出货量计入
/// 当前 (produced − reserved) 余量最大的那条记录——预留应当
/// 落在最宽裕的工厂。出货扣减时同量核销（见库存记录实体）。
pub struct StockReservation {
    inventory_repo: Arc<dyn InventoryRecordRepository>,
}

impl StockReservation {
    pub fn new(inventory_repo: Arc<dyn InventoryRecordRepository>) -> Self {
        Self {
            inventory_repo,
        }
    }

    /// 把订单各行的待出货量计入预留
    pub async fn reserve_for_order(&self, order: &Order) -> AppResult<()> {
        for line in order.line_items() {
            match line {
                OrderLineItem::Bulk(line) => {
                    let pending = (line.quantity.value - line.dispatched.value).max(0);
                    if pending == 0 {
                        continue;
                    }
                    let records = self
                        .inventory_repo
                        .find_bulk_by_quality(&line.quality_id)
                        .await?;
                    match pick_best_bulk(records) {
                        Some(mut record) => {
                            let pending =
                                Quantity::from_raw(pending, line.quantity.unit.clone());
                            record.add_reservation(Some(&pending), 0);
                            self.inventory_repo.update(&record).await?;
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
                        let records = self
                            .inventory_repo
                            .find_count_by_group(
                                &line.quality_id,
                                &line.design_id,
                                &group.color_group_id,
                            )
                            .await?
                            .into_iter()
                            .filter(|record| {
                                record.partition().sub_cut.as_ref() == line.sub_cut.as_ref()
                            })
                            .collect();
                        match pick_best_count(records) {
                            Some(mut record) => {
                                record.add_reservation(None, pending);
                                self.inventory_repo.update(&record).await?;
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

        info!(order_no = %order.order_no(), "Order stock reserved");
        Ok(())
    }
}

/// 余量最大的匹布记录
fn pick_best_bulk(records: Vec<InventoryRecord>) -> Option<InventoryRecord> {
    records
        .into_iter()
        .max_by_key(|record| record.bulk_slack())
}

/// 余量最大的计件记录
fn pick_best_count(records: Vec<InventoryRecord>) -> Option<InventoryRecord> {
    records
        .into_iter()
        .max_by_key(|record| record.piece_slack())
}
