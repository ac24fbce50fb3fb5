//! 事件存储实现

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use errors::{AppError, AppResult};
use event_core::{DomainEvent, EventEnvelope, EventMetadata};
use sqlx::PgPool;

use crate::domain::events::StockEvent;

/// 库存事件存储接口
#[async_trait]
pub trait StockEventStore: Send + Sync {
    /// 追加事件（内部补全信封与版本号）
    async fn append(&self, event: StockEvent) -> AppResult<()>;

    /// 按聚合 ID 读取事件
    async fn list_by_aggregate(
        &self,
        aggregate_id: &str,
    ) -> AppResult<Vec<EventEnvelope<StockEvent>>>;
}

/// 内存事件存储（测试用）
#[derive(Default)]
pub struct InMemoryStockEventStore {
    events: RwLock<Vec<EventEnvelope<StockEvent>>>,
    versions: RwLock<HashMap<String, u64>>,
}

impl InMemoryStockEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockEventStore for InMemoryStockEventStore {
    async fn append(&self, event: StockEvent) -> AppResult<()> {
        let aggregate_id = event.aggregate_id();
        let mut versions = self
            .versions
            .write()
            .map_err(|_| AppError::internal("事件存储锁中毒"))?;
        let version = versions.entry(aggregate_id).or_insert(0);
        *version += 1;
        let envelope = EventEnvelope::new(event, *version, EventMetadata::new());
        let mut events = self
            .events
            .write()
            .map_err(|_| AppError::internal("事件存储锁中毒"))?;
        events.push(envelope);
        Ok(())
    }

    async fn list_by_aggregate(
        &self,
        aggregate_id: &str,
    ) -> AppResult<Vec<EventEnvelope<StockEvent>>> {
        let events = self
            .events
            .read()
            .map_err(|_| AppError::internal("事件存储锁中毒"))?;
        Ok(events
            .iter()
            .filter(|envelope| envelope.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }
}

/// PostgreSQL 事件存储实现
pub struct PostgresStockEventStore {
    pool: PgPool,
}

impl PostgresStockEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StockEventStore for PostgresStockEventStore {
    async fn append(&self, event: StockEvent) -> AppResult<()> {
        let envelope = EventEnvelope::new(event, 0, EventMetadata::new());
        let payload = serde_json::to_value(&envelope.data)
            .map_err(|e| AppError::internal(format!("序列化事件失败: {}", e)))?;
        let metadata = serde_json::to_value(&envelope.metadata)
            .map_err(|e| AppError::internal(format!("序列化事件元数据失败: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO stock_events (
                event_id, aggregate_type, aggregate_id, event_type,
                payload, metadata, occurred_at, aggregate_version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7,
                (SELECT COALESCE(MAX(aggregate_version), 0) + 1
                 FROM stock_events
                 WHERE aggregate_id = $3))
            "#,
        )
        .bind(envelope.id)
        .bind(&envelope.aggregate_type)
        .bind(&envelope.aggregate_id)
        .bind(&envelope.event_type)
        .bind(payload)
        .bind(metadata)
        .bind(envelope.occurred_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("保存事件失败: {}", e)))?;

        Ok(())
    }

    async fn list_by_aggregate(
        &self,
        aggregate_id: &str,
    ) -> AppResult<Vec<EventEnvelope<StockEvent>>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT event_id, aggregate_type, aggregate_id, event_type,
                   payload, metadata, occurred_at, aggregate_version
            FROM stock_events
            WHERE aggregate_id = $1
            ORDER BY aggregate_version ASC
            "#,
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("查询事件失败: {}", e)))?;

        rows.into_iter().map(envelope_from_row).collect()
    }
}

/// 事件行结构
#[derive(sqlx::FromRow)]
struct EventRow {
    event_id: uuid::Uuid,
    aggregate_type: String,
    aggregate_id: String,
    event_type: String,
    payload: serde_json::Value,
    metadata: serde_json::Value,
    occurred_at: chrono::DateTime<chrono::Utc>,
    aggregate_version: i64,
}

fn envelope_from_row(row: EventRow) -> AppResult<EventEnvelope<StockEvent>> {
    let data: StockEvent = serde_json::from_value(row.payload)
        .map_err(|e| AppError::internal(format!("反序列化事件失败: {}", e)))?;
    let metadata: EventMetadata = serde_json::from_value(row.metadata)
        .map_err(|e| AppError::internal(format!("反序列化事件元数据失败: {}", e)))?;

    Ok(EventEnvelope {
        id: row.event_id,
        event_type: row.event_type,
        aggregate_type: row.aggregate_type,
        aggregate_id: row.aggregate_id,
        version: row.aggregate_version as u64,
        data,
        metadata,
        occurred_at: row.occurred_at,
    })
}
