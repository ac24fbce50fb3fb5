//! 持久化层

pub mod converters;
pub mod event_store;
pub mod memory;
pub mod postgres;
pub mod rows;

pub use event_store::{InMemoryStockEventStore, PostgresStockEventStore, StockEventStore};
pub use memory::*;
pub use postgres::*;
