//! event-core - 领域事件核心库

mod domain_event;

pub use domain_event::*;
