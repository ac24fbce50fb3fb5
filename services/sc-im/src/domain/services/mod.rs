//! 领域服务

pub mod allocation_engine;
mod order_dispatch;
mod stock_rebuilder;
mod stock_reservation;
mod stock_validator;

pub use allocation_engine::{AllocationEngine, plan_largest_first};
pub use order_dispatch::*;
pub use stock_rebuilder::*;
pub use stock_reservation::*;
pub use stock_validator::*;
