//! 出货主流程集成测试
//!
//! 覆盖校验 → 建单 → 扣减 → 订单回写的完整链路

use std::sync::Arc;

use domain_core::{Quantity, Unit};
use errors::AppError;

use sc_im::application::ServiceHandler;
use sc_im::application::commands::{
    CreateDispatchNoteCommand, NewStockUnit, RecordProductionCommand,
};
use sc_im::application::queries::ValidateStockQuery;
use sc_im::domain::entities::{
    BulkDispatchLine, BulkOrderLine, DispatchLineItem, InventoryRecord, Order, OrderLineItem,
};
use sc_im::domain::enums::{DispatchStatus, ItemClass, UnitStatus};
use sc_im::domain::repositories::{InventoryRecordRepository, OrderRepository, StockUnitRepository};
use sc_im::domain::value_objects::{FactoryId, QualityId};
use sc_im::infrastructure::persistence::{
    InMemoryDispatchNoteRepository, InMemoryInventoryRecordRepository, InMemoryMasterData,
    InMemoryOrderRepository, InMemoryProductionRecordRepository, InMemoryStockEventStore,
    InMemoryStockUnitRepository,
};

struct TestContext {
    handler: ServiceHandler,
    inventory_repo: Arc<InMemoryInventoryRecordRepository>,
    unit_repo: Arc<InMemoryStockUnitRepository>,
    order_repo: Arc<InMemoryOrderRepository>,
}

fn setup() -> TestContext {
    let inventory_repo = Arc::new(InMemoryInventoryRecordRepository::new());
    let unit_repo = Arc::new(InMemoryStockUnitRepository::new());
    let order_repo = Arc::new(InMemoryOrderRepository::new());
    let production_repo = Arc::new(InMemoryProductionRecordRepository::new());
    let dispatch_repo = Arc::new(InMemoryDispatchNoteRepository::new());
    let master_data = Arc::new(InMemoryMasterData::new());
    let event_store = Arc::new(InMemoryStockEventStore::new());

    let handler = ServiceHandler::new(
        inventory_repo.clone(),
        unit_repo.clone(),
        order_repo.clone(),
        production_repo,
        dispatch_repo,
        master_data,
        event_store,
        false,
    );

    TestContext {
        handler,
        inventory_repo,
        unit_repo,
        order_repo,
    }
}

fn meters(value: f64) -> Quantity {
    Quantity::from_decimal(value, Unit::meter())
}

/// 无布卷登记的匹布入库
async fn seed_bulk(ctx: &TestContext, quality: &QualityId, factory: &FactoryId, qty: f64) {
    ctx.handler
        .record_production(RecordProductionCommand {
            item_class: ItemClass::Bulk,
            quality_id: quality.clone(),
            design_id: None,
            factory_id: factory.clone(),
            sub_cut: None,
            bulk_meters: Some(qty),
            units: Vec::new(),
            piece_groups: Vec::new(),
        })
        .await
        .expect("seed production");
}

async fn records_by_factory(ctx: &TestContext, factory: &FactoryId) -> Vec<InventoryRecord> {
    ctx.inventory_repo
        .list_all()
        .await
        .expect("list records")
        .into_iter()
        .filter(|record| &record.partition().factory_id == factory)
        .collect()
}

fn bulk_request(quality: &QualityId, qty: f64) -> Vec<DispatchLineItem> {
    vec![DispatchLineItem::Bulk(BulkDispatchLine {
        quality_id: quality.clone(),
        bulk_qty: Some(meters(qty)),
        unit_ids: Vec::new(),
    })]
}

async fn seed_order(ctx: &TestContext, quality: &QualityId, qty: f64) -> Order {
    let order = Order::new(
        "SO-9001",
        vec![OrderLineItem::Bulk(BulkOrderLine::new(
            quality.clone(),
            meters(qty),
        ))],
    );
    ctx.order_repo.save(&order).await.expect("seed order");
    order
}

#[tokio::test]
async fn test_validator_accepts_cross_factory_total() {
    let ctx = setup();
    let quality = QualityId::new();
    seed_bulk(&ctx, &quality, &FactoryId::new(), 100.0).await;
    seed_bulk(&ctx, &quality, &FactoryId::new(), 40.0).await;

    let validation = ctx
        .handler
        .validate_stock(ValidateStockQuery {
            line_items: bulk_request(&quality, 120.0),
        })
        .await
        .expect("validate");

    assert!(validation.valid);
    assert!(validation.insufficient_items.is_empty());
}

#[tokio::test]
async fn test_validator_reports_shortage_with_deficit() {
    let ctx = setup();
    let quality = QualityId::new();
    seed_bulk(&ctx, &quality, &FactoryId::new(), 100.0).await;
    seed_bulk(&ctx, &quality, &FactoryId::new(), 40.0).await;

    let validation = ctx
        .handler
        .validate_stock(ValidateStockQuery {
            line_items: bulk_request(&quality, 150.0),
        })
        .await
        .expect("validate");

    assert!(!validation.valid);
    assert_eq!(validation.insufficient_items.len(), 1);
    let shortage = &validation.insufficient_items[0];
    assert_eq!(shortage.required, 150.0);
    assert_eq!(shortage.available, 140.0);
    assert_eq!(shortage.deficit, 10.0);
}

#[tokio::test]
async fn test_dispatch_drains_largest_factory_first() {
    let ctx = setup();
    let quality = QualityId::new();
    let factory_a = FactoryId::new();
    let factory_b = FactoryId::new();
    seed_bulk(&ctx, &quality, &factory_a, 100.0).await;
    seed_bulk(&ctx, &quality, &factory_b, 40.0).await;
    let order = seed_order(&ctx, &quality, 120.0).await;

    ctx.handler
        .create_dispatch_note(CreateDispatchNoteCommand {
            challan_no: "CH-0001".to_string(),
            order_id: order.id().clone(),
            line_items: bulk_request(&quality, 120.0),
        })
        .await
        .expect("dispatch");

    let records_a = records_by_factory(&ctx, &factory_a).await;
    let records_b = records_by_factory(&ctx, &factory_b).await;
    assert!(records_a[0].produced_bulk().is_zero());
    assert_eq!(records_b[0].produced_bulk(), &meters(20.0));
}

#[tokio::test]
async fn test_single_factory_suffices_no_split() {
    let ctx = setup();
    let quality = QualityId::new();
    let factories: Vec<FactoryId> = (0..3).map(|_| FactoryId::new()).collect();
    seed_bulk(&ctx, &quality, &factories[0], 50.0).await;
    seed_bulk(&ctx, &quality, &factories[1], 30.0).await;
    seed_bulk(&ctx, &quality, &factories[2], 10.0).await;
    let order = seed_order(&ctx, &quality, 40.0).await;

    ctx.handler
        .create_dispatch_note(CreateDispatchNoteCommand {
            challan_no: "CH-0002".to_string(),
            order_id: order.id().clone(),
            line_items: bulk_request(&quality, 40.0),
        })
        .await
        .expect("dispatch");

    // 40 全部出自 50 的工厂，其余工厂不动
    assert_eq!(
        records_by_factory(&ctx, &factories[0]).await[0].produced_bulk(),
        &meters(10.0)
    );
    assert_eq!(
        records_by_factory(&ctx, &factories[1]).await[0].produced_bulk(),
        &meters(30.0)
    );
    assert_eq!(
        records_by_factory(&ctx, &factories[2]).await[0].produced_bulk(),
        &meters(10.0)
    );
}

#[tokio::test]
async fn test_insufficient_stock_aborts_before_mutation() {
    let ctx = setup();
    let quality = QualityId::new();
    let factory = FactoryId::new();
    seed_bulk(&ctx, &quality, &factory, 100.0).await;
    let order = seed_order(&ctx, &quality, 150.0).await;

    let result = ctx
        .handler
        .create_dispatch_note(CreateDispatchNoteCommand {
            challan_no: "CH-0003".to_string(),
            order_id: order.id().clone(),
            line_items: bulk_request(&quality, 150.0),
        })
        .await;

    assert!(matches!(result, Err(AppError::FailedPrecondition(_))));
    // 没有任何扣减发生
    assert_eq!(
        records_by_factory(&ctx, &factory).await[0].produced_bulk(),
        &meters(100.0)
    );
    let order = ctx
        .order_repo
        .find_by_id(order.id())
        .await
        .expect("find order")
        .expect("order exists");
    assert_eq!(order.dispatch_status(), DispatchStatus::Pending);
}

#[tokio::test]
async fn test_selected_units_marked_sold_exactly() {
    let ctx = setup();
    let quality = QualityId::new();
    let factory = FactoryId::new();
    ctx.handler
        .record_production(RecordProductionCommand {
            item_class: ItemClass::Bulk,
            quality_id: quality.clone(),
            design_id: None,
            factory_id: factory.clone(),
            sub_cut: None,
            bulk_meters: None,
            units: vec![
                NewStockUnit {
                    unit_no: "TH-001".to_string(),
                    meters: 60.0,
                },
                NewStockUnit {
                    unit_no: "TH-002".to_string(),
                    meters: 50.0,
                },
                NewStockUnit {
                    unit_no: "TH-003".to_string(),
                    meters: 40.0,
                },
            ],
            piece_groups: Vec::new(),
        })
        .await
        .expect("seed production");
    let order = seed_order(&ctx, &quality, 110.0).await;

    let units = ctx.unit_repo.list_all().await.expect("units");
    let selected: Vec<_> = units
        .iter()
        .filter(|unit| unit.unit_no() != "TH-003")
        .map(|unit| unit.id().clone())
        .collect();

    let note_id = ctx
        .handler
        .create_dispatch_note(CreateDispatchNoteCommand {
            challan_no: "CH-0004".to_string(),
            order_id: order.id().clone(),
            line_items: vec![DispatchLineItem::Bulk(BulkDispatchLine {
                quality_id: quality.clone(),
                bulk_qty: None,
                unit_ids: selected.clone(),
            })],
        })
        .await
        .expect("dispatch");

    for unit in ctx.unit_repo.list_all().await.expect("units") {
        if selected.contains(unit.id()) {
            assert_eq!(unit.status(), UnitStatus::Sold);
            assert_eq!(unit.dispatch_note_id(), Some(&note_id));
        } else {
            assert_eq!(unit.status(), UnitStatus::Available);
            assert!(unit.dispatch_note_id().is_none());
        }
    }

    // 预选布卷之和 110 米全部扣掉，剩 40 米、1 卷
    let record = &records_by_factory(&ctx, &factory).await[0];
    assert_eq!(record.produced_bulk(), &meters(40.0));
    assert_eq!(record.produced_unit_count(), 1);
}

#[tokio::test]
async fn test_order_dispatch_status_progresses_monotonically() {
    let ctx = setup();
    let quality = QualityId::new();
    let factory = FactoryId::new();
    seed_bulk(&ctx, &quality, &factory, 200.0).await;
    let order = seed_order(&ctx, &quality, 100.0).await;

    ctx.handler
        .create_dispatch_note(CreateDispatchNoteCommand {
            challan_no: "CH-0005".to_string(),
            order_id: order.id().clone(),
            line_items: bulk_request(&quality, 40.0),
        })
        .await
        .expect("first dispatch");
    let loaded = ctx
        .order_repo
        .find_by_id(order.id())
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(loaded.dispatch_status(), DispatchStatus::Partial);

    ctx.handler
        .create_dispatch_note(CreateDispatchNoteCommand {
            challan_no: "CH-0006".to_string(),
            order_id: order.id().clone(),
            line_items: bulk_request(&quality, 60.0),
        })
        .await
        .expect("second dispatch");
    let loaded = ctx
        .order_repo
        .find_by_id(order.id())
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(loaded.dispatch_status(), DispatchStatus::Completed);

    // 继续出货也不会退回 partial
    ctx.handler
        .create_dispatch_note(CreateDispatchNoteCommand {
            challan_no: "CH-0007".to_string(),
            order_id: order.id().clone(),
            line_items: bulk_request(&quality, 50.0),
        })
        .await
        .expect("third dispatch");
    let loaded = ctx
        .order_repo
        .find_by_id(order.id())
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(loaded.dispatch_status(), DispatchStatus::Completed);
}

#[tokio::test]
async fn test_conservation_over_operation_sequence() {
    let ctx = setup();
    let quality = QualityId::new();
    let factory = FactoryId::new();
    seed_bulk(&ctx, &quality, &factory, 100.0).await;
    let order = seed_order(&ctx, &quality, 40.0).await;

    ctx.handler
        .create_dispatch_note(CreateDispatchNoteCommand {
            challan_no: "CH-0008".to_string(),
            order_id: order.id().clone(),
            line_items: bulk_request(&quality, 30.0),
        })
        .await
        .expect("dispatch");
    seed_bulk(&ctx, &quality, &factory, 20.0).await;
    ctx.handler
        .create_dispatch_note(CreateDispatchNoteCommand {
            challan_no: "CH-0009".to_string(),
            order_id: order.id().clone(),
            line_items: bulk_request(&quality, 10.0),
        })
        .await
        .expect("dispatch");

    // 100 − 30 + 20 − 10 = 80
    let record = &records_by_factory(&ctx, &factory).await[0];
    assert_eq!(record.produced_bulk(), &meters(80.0));
}

#[tokio::test]
async fn test_counters_never_negative_after_clamped_deduction() {
    let ctx = setup();
    let quality = QualityId::new();
    let factory = FactoryId::new();
    seed_bulk(&ctx, &quality, &factory, 50.0).await;

    // 绕过校验直接扣减，模拟校验后发生漂移的竞态
    ctx.handler
        .deduct(sc_im::application::commands::DeductStockCommand {
            line_items: bulk_request(&quality, 80.0),
            dispatch_note_id: sc_im::domain::value_objects::DispatchNoteId::new(),
        })
        .await
        .expect("deduct");

    let record = &records_by_factory(&ctx, &factory).await[0];
    assert!(record.produced_bulk().is_zero());
    assert!(record.reserved_bulk().value >= 0);
    assert!(record.produced_unit_count() >= 0);
}
