//! 知识存储接口 - 基础设施层
//!
//! 外部存储只通过这个 trait 暴露读取能力，只有数据源策略会调用它

use futures::future::BoxFuture;

use crate::error::StoreError;
use crate::models::{AccuracyStatistics, MistakeRecord, StudyItem};

/// 存储返回值
pub type StoreResult<T> = Result<T, StoreError>;

/// 知识存储
///
/// 职责：
/// - 提供知识点、错题、整体统计的只读访问
/// - 不认识生成配置
/// - 不参与过滤/排序/限制
///
/// 方法返回 `BoxFuture`，以便同步内存实现和异步数据库实现共用一个对象安全的接口
pub trait KnowledgeStore: Send + Sync {
    fn get_all_items(&self) -> BoxFuture<'_, StoreResult<Vec<StudyItem>>>;

    /// 只应返回 `knowledge_base_id == base_id` 的知识点，调用方仍会再次校验
    fn get_items_by_knowledge_base<'a>(
        &'a self,
        base_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<StudyItem>>>;

    fn get_items_by_area<'a>(&'a self, area_id: &'a str)
        -> BoxFuture<'a, StoreResult<Vec<StudyItem>>>;

    fn get_item_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<StudyItem>>>;

    /// 未解决的错题记录
    fn get_unresolved_mistakes(&self) -> BoxFuture<'_, StoreResult<Vec<MistakeRecord>>>;

    fn get_overall_accuracy_statistics(&self) -> BoxFuture<'_, StoreResult<AccuracyStatistics>>;
}
