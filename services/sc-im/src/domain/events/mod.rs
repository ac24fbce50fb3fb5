//! 领域事件

mod stock_events;

pub use stock_events::*;
