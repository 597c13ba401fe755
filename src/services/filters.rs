//! 内置过滤器
//!
//! 每个过滤器只删除题目，不改变剩余题目的相对顺序

use chrono::{DateTime, Utc};

use crate::models::pipeline_config::{
    AccuracyRange, CategoryParams, DifficultyRange, ReviewCountRange, TagParams,
};
use crate::models::{StudyItem, TagMatchMode};

fn within<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

/// 到期复习：`next_review_at <= now`
pub fn due_for_review(items: Vec<StudyItem>, now: DateTime<Utc>) -> Vec<StudyItem> {
    items.into_iter().filter(|q| q.is_due(now)).collect()
}

pub fn by_difficulty(items: Vec<StudyItem>, range: &DifficultyRange) -> Vec<StudyItem> {
    items
        .into_iter()
        .filter(|q| within(q.difficulty, range.min_difficulty, range.max_difficulty))
        .collect()
}

/// 按正确率过滤，未复习过的正确率按 0 计算
pub fn by_accuracy(items: Vec<StudyItem>, range: &AccuracyRange) -> Vec<StudyItem> {
    items
        .into_iter()
        .filter(|q| within(q.accuracy(), range.min_accuracy, range.max_accuracy))
        .collect()
}

/// 按标签过滤；标签列表为空时不过滤
pub fn by_tags(items: Vec<StudyItem>, params: &TagParams) -> Vec<StudyItem> {
    if params.tags.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|q| {
            if q.tags.is_empty() {
                return false;
            }
            let has = |tag: &String| q.tags.contains(tag);
            match params.mode {
                TagMatchMode::All => params.tags.iter().all(has),
                TagMatchMode::Any => params.tags.iter().any(has),
            }
        })
        .collect()
}

/// 按分类过滤；分类列表为空时不过滤
pub fn by_category(items: Vec<StudyItem>, params: &CategoryParams) -> Vec<StudyItem> {
    if params.categories.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|q| params.categories.contains(&q.category))
        .collect()
}

pub fn by_review_count(items: Vec<StudyItem>, range: &ReviewCountRange) -> Vec<StudyItem> {
    items
        .into_iter()
        .filter(|q| within(q.review_count, range.min_count, range.max_count))
        .collect()
}
