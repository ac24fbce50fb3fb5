//! 主数据查询接口
//!
//! 主数据归 mdm 服务，此处只读名称用于缺货报告的展示文本

use async_trait::async_trait;
use errors::AppResult;

use crate::domain::value_objects::{ColorGroupId, DesignId, FactoryId, QualityId};

/// 主数据查询接口
#[async_trait]
pub trait MasterDataLookup: Send + Sync {
    /// 布种名称
    async fn quality_name(&self, id: &QualityId) -> AppResult<Option<String>>;

    /// 花型名称
    async fn design_name(&self, id: &DesignId) -> AppResult<Option<String>>;

    /// 配色组名称
    async fn color_group_name(&self, id: &ColorGroupId) -> AppResult<Option<String>>;

    /// 工厂名称
    async fn factory_name(&self, id: &FactoryId) -> AppResult<Option<String>>;
}
