//! 内置排序器
//!
//! 除 `random` 外都使用稳定排序，相同输入得到相同顺序

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::SmartSortWeights;
use crate::models::{SortOrder, StudyItem};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

fn sort_by_key_f64(mut items: Vec<StudyItem>, order: SortOrder, key: impl Fn(&StudyItem) -> f64) -> Vec<StudyItem> {
    items.sort_by(|a, b| {
        let ord = key(a).total_cmp(&key(b));
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    items
}

fn timestamp_millis(at: Option<DateTime<Utc>>) -> f64 {
    at.map_or(0.0, |t| t.timestamp_millis() as f64)
}

/// 均匀随机排列
pub fn random<R: Rng + ?Sized>(mut items: Vec<StudyItem>, rng: &mut R) -> Vec<StudyItem> {
    items.shuffle(rng);
    items
}

/// 按下次复习时间排序，没有复习时间的按纪元时间处理
pub fn by_review_time(items: Vec<StudyItem>, order: SortOrder) -> Vec<StudyItem> {
    sort_by_key_f64(items, order, |q| timestamp_millis(q.next_review_at))
}

pub fn by_difficulty(items: Vec<StudyItem>, order: SortOrder) -> Vec<StudyItem> {
    sort_by_key_f64(items, order, |q| f64::from(q.difficulty))
}

pub fn by_accuracy(items: Vec<StudyItem>, order: SortOrder) -> Vec<StudyItem> {
    sort_by_key_f64(items, order, StudyItem::accuracy)
}

pub fn by_created_time(items: Vec<StudyItem>, order: SortOrder) -> Vec<StudyItem> {
    sort_by_key_f64(items, order, |q| timestamp_millis(q.created_at))
}

/// 智能排序的综合分数，越小越优先
///
/// 逾期越久分数越低；未到期的逾期量为 0，没有复习时间的按纪元时间计算逾期。
/// 正确率越低、难度越低分数越低。
pub fn smart_score(item: &StudyItem, now: DateTime<Utc>, weights: &SmartSortWeights) -> f64 {
    let due_at = timestamp_millis(item.next_review_at);
    let overdue_days = ((now.timestamp_millis() as f64 - due_at) / MILLIS_PER_DAY).max(0.0);

    -weights.overdue_per_day * overdue_days
        + weights.accuracy * item.accuracy()
        + weights.difficulty * f64::from(item.difficulty)
}

pub fn smart(mut items: Vec<StudyItem>, now: DateTime<Utc>, weights: &SmartSortWeights) -> Vec<StudyItem> {
    items.sort_by(|a, b| smart_score(a, now, weights).total_cmp(&smart_score(b, now, weights)));
    items
}
