//! 阶段上下文
//!
//! 封装"这一次生成"的共享信息，所有过滤器/排序器/限制器读取同一份

use std::fmt::Display;

use chrono::{DateTime, Utc};

use crate::models::AccuracyStatistics;

/// 阶段上下文
#[derive(Debug, Clone)]
pub struct StageCtx {
    /// 本次生成的时间基准
    pub now: DateTime<Utc>,

    /// 数据源类型名
    pub source_type: String,

    /// 用户整体答题统计，仅在配置了限制器时获取
    pub statistics: Option<AccuracyStatistics>,
}

impl StageCtx {
    pub fn new(now: DateTime<Utc>, source_type: impl Into<String>) -> Self {
        Self {
            now,
            source_type: source_type.into(),
            statistics: None,
        }
    }

    pub fn with_statistics(mut self, statistics: AccuracyStatistics) -> Self {
        self.statistics = Some(statistics);
        self
    }

    /// 整体正确率，没有统计或没有复习记录时使用 `fallback`
    pub fn overall_accuracy(&self, fallback: f64) -> f64 {
        self.statistics
            .and_then(|s| s.accuracy())
            .unwrap_or(fallback)
    }
}

impl Display for StageCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[数据源 {} @ {}]",
            self.source_type,
            self.now.format("%Y-%m-%d %H:%M:%S")
        )
    }
}
