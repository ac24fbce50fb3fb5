//! 值对象

mod ids;
mod partition;

pub use ids::*;
pub use partition::*;
