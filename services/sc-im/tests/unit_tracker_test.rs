//! 布卷操作集成测试

use std::sync::Arc;

use sc_im::application::ServiceHandler;
use sc_im::application::commands::{
    NewStockUnit, RecordProductionCommand, SetUnitStatusCommand,
};
use sc_im::application::queries::ListAvailableUnitsQuery;
use sc_im::domain::enums::{ItemClass, UnitStatus};
use sc_im::domain::repositories::StockUnitRepository;
use sc_im::domain::value_objects::{DispatchNoteId, FactoryId, QualityId, StockUnitId};
use sc_im::infrastructure::persistence::{
    InMemoryDispatchNoteRepository, InMemoryInventoryRecordRepository, InMemoryMasterData,
    InMemoryOrderRepository, InMemoryProductionRecordRepository, InMemoryStockEventStore,
    InMemoryStockUnitRepository,
};

use errors::AppError;

struct TestContext {
    handler: ServiceHandler,
    unit_repo: Arc<InMemoryStockUnitRepository>,
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
        inventory_repo,
        unit_repo.clone(),
        order_repo,
        production_repo,
        dispatch_repo,
        master_data,
        event_store,
        false,
    );

    TestContext { handler, unit_repo }
}

async fn seed_units(ctx: &TestContext, quality: &QualityId, factory: &FactoryId, count: usize) {
    let units = (0..count)
        .map(|index| NewStockUnit {
            unit_no: format!("TH-{:03}", index),
            meters: 100.0,
        })
        .collect();
    ctx.handler
        .record_production(RecordProductionCommand {
            item_class: ItemClass::Bulk,
            quality_id: quality.clone(),
            design_id: None,
            factory_id: factory.clone(),
            sub_cut: None,
            bulk_meters: None,
            units,
            piece_groups: Vec::new(),
        })
        .await
        .expect("seed production");
}

#[tokio::test]
async fn test_list_available_filters_by_quality_and_factory() {
    let ctx = setup();
    let quality_a = QualityId::new();
    let quality_b = QualityId::new();
    let factory_a = FactoryId::new();
    let factory_b = FactoryId::new();
    seed_units(&ctx, &quality_a, &factory_a, 2).await;
    seed_units(&ctx, &quality_a, &factory_b, 3).await;
    seed_units(&ctx, &quality_b, &factory_a, 1).await;

    let all = ctx
        .handler
        .list_available_units(ListAvailableUnitsQuery::default())
        .await
        .expect("list");
    assert_eq!(all.len(), 6);

    let by_quality = ctx
        .handler
        .list_available_units(ListAvailableUnitsQuery {
            quality_id: Some(quality_a.clone()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(by_quality.len(), 5);

    let by_both = ctx
        .handler
        .list_available_units(ListAvailableUnitsQuery {
            quality_id: Some(quality_a.clone()),
            factory_id: Some(factory_b.clone()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(by_both.len(), 3);
}

#[tokio::test]
async fn test_set_unit_status_round_trip() {
    let ctx = setup();
    let quality = QualityId::new();
    seed_units(&ctx, &quality, &FactoryId::new(), 1).await;
    let unit = ctx
        .unit_repo
        .list_all()
        .await
        .expect("units")
        .pop()
        .expect("unit");
    let note = DispatchNoteId::new();

    let sold = ctx
        .handler
        .set_unit_status(SetUnitStatusCommand {
            unit_id: unit.id().clone(),
            status: UnitStatus::Sold,
            dispatch_note_id: Some(note.clone()),
        })
        .await
        .expect("sell");
    assert!(sold.status().is_sold());
    assert_eq!(sold.dispatch_note_id(), Some(&note));

    // 已售布卷不再出现在可售清单里
    let available = ctx
        .handler
        .list_available_units(ListAvailableUnitsQuery::default())
        .await
        .expect("list");
    assert!(available.is_empty());

    let released = ctx
        .handler
        .set_unit_status(SetUnitStatusCommand {
            unit_id: unit.id().clone(),
            status: UnitStatus::Available,
            dispatch_note_id: None,
        })
        .await
        .expect("release");
    assert!(!released.status().is_sold());
    assert!(released.dispatch_note_id().is_none());
}

#[tokio::test]
async fn test_set_sold_without_note_is_rejected() {
    let ctx = setup();
    let quality = QualityId::new();
    seed_units(&ctx, &quality, &FactoryId::new(), 1).await;
    let unit = ctx
        .unit_repo
        .list_all()
        .await
        .expect("units")
        .pop()
        .expect("unit");

    let result = ctx
        .handler
        .set_unit_status(SetUnitStatusCommand {
            unit_id: unit.id().clone(),
            status: UnitStatus::Sold,
            dispatch_note_id: None,
        })
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_set_status_on_missing_unit_is_not_found() {
    let ctx = setup();

    let result = ctx
        .handler
        .set_unit_status(SetUnitStatusCommand {
            unit_id: StockUnitId::new(),
            status: UnitStatus::Available,
            dispatch_note_id: None,
        })
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
