//! 内存知识存储
//!
//! 持有一份知识点快照，用于测试和嵌入式调用

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::StoreError;
use crate::infrastructure::knowledge_store::{KnowledgeStore, StoreResult};
use crate::models::{AccuracyStatistics, MistakeRecord, StudyItem};

/// 内存知识存储
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Vec<StudyItem>,
    mistakes: Vec<MistakeRecord>,
    statistics: Option<AccuracyStatistics>,
}

impl MemoryStore {
    pub fn new(items: Vec<StudyItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    pub fn with_mistakes(mut self, mistakes: Vec<MistakeRecord>) -> Self {
        self.mistakes = mistakes;
        self
    }

    /// 指定整体统计；不指定时按知识点的复习记录汇总
    pub fn with_statistics(mut self, statistics: AccuracyStatistics) -> Self {
        self.statistics = Some(statistics);
        self
    }

    pub fn items(&self) -> &[StudyItem] {
        &self.items
    }

    fn select(&self, pred: impl Fn(&StudyItem) -> bool) -> Vec<StudyItem> {
        self.items.iter().filter(|item| pred(item)).cloned().collect()
    }

    fn aggregate_statistics(&self) -> AccuracyStatistics {
        let (total, correct) = self.items.iter().fold((0u64, 0u64), |(t, c), item| {
            (t + u64::from(item.review_count), c + u64::from(item.correct_count))
        });
        AccuracyStatistics::new(total, correct)
    }
}

fn ready<'a, T: Send + 'a>(value: T) -> BoxFuture<'a, StoreResult<T>> {
    future::ready(Ok::<T, StoreError>(value)).boxed()
}

impl KnowledgeStore for MemoryStore {
    fn get_all_items(&self) -> BoxFuture<'_, StoreResult<Vec<StudyItem>>> {
        ready(self.items.clone())
    }

    fn get_items_by_knowledge_base<'a>(
        &'a self,
        base_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<StudyItem>>> {
        ready(self.select(|item| item.knowledge_base_id == base_id))
    }

    fn get_items_by_area<'a>(
        &'a self,
        area_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<StudyItem>>> {
        ready(self.select(|item| item.area_id == area_id))
    }

    fn get_item_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<StudyItem>>> {
        ready(self.items.iter().find(|item| item.id == id).cloned())
    }

    fn get_unresolved_mistakes(&self) -> BoxFuture<'_, StoreResult<Vec<MistakeRecord>>> {
        ready(
            self.mistakes
                .iter()
                .filter(|m| !m.is_resolved)
                .cloned()
                .collect(),
        )
    }

    fn get_overall_accuracy_statistics(&self) -> BoxFuture<'_, StoreResult<AccuracyStatistics>> {
        ready(self.statistics.unwrap_or_else(|| self.aggregate_statistics()))
    }
}
