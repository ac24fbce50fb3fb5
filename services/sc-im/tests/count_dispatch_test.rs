//! 计件出货集成测试
//!
//! 计件成品按配色组/裁切规格分区，校验忽略裁切规格而扣减精确匹配

use std::sync::Arc;

use sc_im::application::ServiceHandler;
use sc_im::application::commands::{CreateDispatchNoteCommand, RecordProductionCommand};
use sc_im::application::queries::ValidateStockQuery;
use sc_im::domain::entities::{
    ColorGroupOrderLine, ColorGroupRequest, CountDispatchLine, CountOrderLine, DispatchLineItem,
    InventoryRecord, Order, OrderLineItem, ProducedPieceGroup,
};
use sc_im::domain::enums::{DispatchStatus, ItemClass};
use sc_im::domain::repositories::{InventoryRecordRepository, OrderRepository};
use sc_im::domain::value_objects::{
    ColorGroupId, DesignId, FactoryId, QualityId, SubCut,
};
use sc_im::infrastructure::persistence::{
    InMemoryDispatchNoteRepository, InMemoryInventoryRecordRepository, InMemoryMasterData,
    InMemoryOrderRepository, InMemoryProductionRecordRepository, InMemoryStockEventStore,
    InMemoryStockUnitRepository,
};

struct TestContext {
    handler: ServiceHandler,
    inventory_repo: Arc<InMemoryInventoryRecordRepository>,
    order_repo: Arc<InMemoryOrderRepository>,
    master_data: Arc<InMemoryMasterData>,
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
        unit_repo,
        order_repo.clone(),
        production_repo,
        dispatch_repo,
        master_data.clone(),
        event_store,
        false,
    );

    TestContext {
        handler,
        inventory_repo,
        order_repo,
        master_data,
    }
}

async fn seed_pieces(
    ctx: &TestContext,
    quality: &QualityId,
    design: &DesignId,
    factory: &FactoryId,
    group: &ColorGroupId,
    sub_cut: Option<SubCut>,
    pieces: i64,
) {
    ctx.handler
        .record_production(RecordProductionCommand {
            item_class: ItemClass::Count,
            quality_id: quality.clone(),
            design_id: Some(design.clone()),
            factory_id: factory.clone(),
            sub_cut,
            bulk_meters: None,
            units: Vec::new(),
            piece_groups: vec![ProducedPieceGroup {
                color_group_id: group.clone(),
                pieces,
            }],
        })
        .await
        .expect("seed pieces");
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

#[tokio::test]
async fn test_count_deduction_is_largest_first_per_group() {
    let ctx = setup();
    let quality = QualityId::new();
    let design = DesignId::new();
    let group = ColorGroupId::new();
    let factory_a = FactoryId::new();
    let factory_b = FactoryId::new();
    seed_pieces(&ctx, &quality, &design, &factory_a, &group, None, 30).await;
    seed_pieces(&ctx, &quality, &design, &factory_b, &group, None, 20).await;

    let order = Order::new(
        "SO-2001",
        vec![OrderLineItem::Count(CountOrderLine {
            quality_id: quality.clone(),
            design_id: design.clone(),
            sub_cut: None,
            groups: vec![ColorGroupOrderLine {
                color_group_id: group.clone(),
                quantity: 40,
                dispatched: 0,
            }],
        })],
    );
    ctx.order_repo.save(&order).await.expect("seed order");

    ctx.handler
        .create_dispatch_note(CreateDispatchNoteCommand {
            challan_no: "CH-1001".to_string(),
            order_id: order.id().clone(),
            line_items: vec![DispatchLineItem::Count(CountDispatchLine {
                quality_id: quality.clone(),
                design_id: design.clone(),
                sub_cut: None,
                groups: vec![ColorGroupRequest {
                    color_group_id: group.clone(),
                    pieces: 40,
                }],
            })],
        })
        .await
        .expect("dispatch");

    // 30 的工厂清零，20 的工厂剩 10
    assert_eq!(
        records_by_factory(&ctx, &factory_a).await[0].produced_piece_qty(),
        0
    );
    assert_eq!(
        records_by_factory(&ctx, &factory_b).await[0].produced_piece_qty(),
        10
    );

    let loaded = ctx
        .order_repo
        .find_by_id(order.id())
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(loaded.dispatch_status(), DispatchStatus::Completed);
}

#[tokio::test]
async fn test_validation_ignores_sub_cut_but_deduction_matches_it() {
    let ctx = setup();
    let quality = QualityId::new();
    let design = DesignId::new();
    let group = ColorGroupId::new();
    let factory = FactoryId::new();
    // 同一配色组两种裁切规格各 15 件
    seed_pieces(
        &ctx,
        &quality,
        &design,
        &factory,
        &group,
        Some(SubCut::new("3.2m")),
        15,
    )
    .await;
    seed_pieces(
        &ctx,
        &quality,
        &design,
        &factory,
        &group,
        Some(SubCut::new("6.3m")),
        15,
    )
    .await;

    // 校验不分裁切规格：30 件都算可用
    let validation = ctx
        .handler
        .validate_stock(ValidateStockQuery {
            line_items: vec![DispatchLineItem::Count(CountDispatchLine {
                quality_id: quality.clone(),
                design_id: design.clone(),
                sub_cut: Some(SubCut::new("3.2m")),
                groups: vec![ColorGroupRequest {
                    color_group_id: group.clone(),
                    pieces: 20,
                }],
            })],
        })
        .await
        .expect("validate");
    assert!(validation.valid);

    // 扣减只碰 3.2m 分区：15 件打光后余量被截断丢弃
    let order = Order::new(
        "SO-2002",
        vec![OrderLineItem::Count(CountOrderLine {
            quality_id: quality.clone(),
            design_id: design.clone(),
            sub_cut: Some(SubCut::new("3.2m")),
            groups: vec![ColorGroupOrderLine {
                color_group_id: group.clone(),
                quantity: 20,
                dispatched: 0,
            }],
        })],
    );
    ctx.order_repo.save(&order).await.expect("seed order");
    ctx.handler
        .create_dispatch_note(CreateDispatchNoteCommand {
            challan_no: "CH-1002".to_string(),
            order_id: order.id().clone(),
            line_items: vec![DispatchLineItem::Count(CountDispatchLine {
                quality_id: quality.clone(),
                design_id: design.clone(),
                sub_cut: Some(SubCut::new("3.2m")),
                groups: vec![ColorGroupRequest {
                    color_group_id: group.clone(),
                    pieces: 20,
                }],
            })],
        })
        .await
        .expect("dispatch");

    let records = records_by_factory(&ctx, &factory).await;
    let cut_32 = records
        .iter()
        .find(|record| record.partition().sub_cut == Some(SubCut::new("3.2m")))
        .expect("3.2m record");
    let cut_63 = records
        .iter()
        .find(|record| record.partition().sub_cut == Some(SubCut::new("6.3m")))
        .expect("6.3m record");
    assert_eq!(cut_32.produced_piece_qty(), 0);
    assert_eq!(cut_63.produced_piece_qty(), 15);
}

#[tokio::test]
async fn test_shortage_report_names_color_group() {
    let ctx = setup();
    let quality = QualityId::new();
    let design = DesignId::new();
    let group = ColorGroupId::new();
    ctx.master_data.put_quality(quality.clone(), "60x60 Voile");
    ctx.master_data.put_color_group(group.clone(), "Indigo Set");
    seed_pieces(&ctx, &quality, &design, &FactoryId::new(), &group, None, 5).await;

    let validation = ctx
        .handler
        .validate_stock(ValidateStockQuery {
            line_items: vec![DispatchLineItem::Count(CountDispatchLine {
                quality_id: quality.clone(),
                design_id: design.clone(),
                sub_cut: None,
                groups: vec![ColorGroupRequest {
                    color_group_id: group.clone(),
                    pieces: 12,
                }],
            })],
        })
        .await
        .expect("validate");

    assert!(!validation.valid);
    let shortage = &validation.insufficient_items[0];
    assert_eq!(shortage.quality_name, "60x60 Voile");
    assert_eq!(shortage.color_group_name.as_deref(), Some("Indigo Set"));
    assert_eq!(shortage.required, 12.0);
    assert_eq!(shortage.available, 5.0);
    assert_eq!(shortage.deficit, 7.0);
}
