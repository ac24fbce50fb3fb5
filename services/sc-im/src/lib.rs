//! sc-im Service - Supply Chain Inventory Management
//!
//! 面料库存账与配货服务：库存校验、贪心配货扣减、订单出货
//! 状态机与全量重算对账

pub mod application;
pub mod domain;
pub mod infrastructure;
