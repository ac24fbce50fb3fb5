//! 应用命令

mod stock_commands;
mod unit_commands;

pub use stock_commands::*;
pub use unit_commands::*;
