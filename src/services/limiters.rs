//! 内置限制器
//!
//! 只截取已排序列表的前缀

use crate::models::pipeline_config::AdaptiveCountParams;
use crate::models::StudyItem;

fn take_prefix(mut items: Vec<StudyItem>, count: usize) -> Vec<StudyItem> {
    items.truncate(count);
    items
}

/// 前 N 道；未指定时不限制，不大于 0 时为空
pub fn fixed_count(items: Vec<StudyItem>, count: Option<i64>) -> Vec<StudyItem> {
    match count {
        Some(n) => take_prefix(items, usize::try_from(n).unwrap_or(0)),
        None => items,
    }
}

/// 按百分比向上取整；不在 (0, 100] 内时不限制
pub fn percentage(items: Vec<StudyItem>, percentage: Option<f64>) -> Vec<StudyItem> {
    match percentage {
        Some(p) if p > 0.0 && p <= 100.0 => {
            let count = (items.len() as f64 * p / 100.0).ceil() as usize;
            take_prefix(items, count)
        }
        _ => items,
    }
}

/// 按时间预算估算题量：分钟数 × 60 / 每题秒数，向下取整
pub fn time_budget(items: Vec<StudyItem>, minutes: Option<f64>, seconds_per_item: u32) -> Vec<StudyItem> {
    match minutes {
        Some(m) if m > 0.0 => {
            let count = (m * 60.0 / f64::from(seconds_per_item.max(1))).floor() as usize;
            take_prefix(items, count)
        }
        _ => items,
    }
}

/// 根据整体正确率调整题量：正确率越低题量越多，结果限制在 `[min_count, max_count]`
pub fn adaptive_count_for(accuracy: f64, params: &AdaptiveCountParams) -> usize {
    let accuracy = accuracy.clamp(0.0, 1.0);
    let adjusted = (params.base_count as f64 * (1.0 + (1.0 - accuracy) * 0.5)).round() as usize;
    let max = params.max_count.max(params.min_count);
    adjusted.clamp(params.min_count, max)
}

pub fn adaptive_count(items: Vec<StudyItem>, accuracy: f64, params: &AdaptiveCountParams) -> Vec<StudyItem> {
    let count = adaptive_count_for(accuracy, params);
    take_prefix(items, count)
}
