//! 阶段注册表
//!
//! 按名称保存数据源、过滤器、排序器、限制器的处理函数。
//! 注册表是显式构造的对象，由调用方交给生成器；同名注册以最后一次为准，
//! 因此可以覆盖内置实现，也可以并存多个配置不同的生成器。

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{SourceError, StageError, StageKind};
use crate::infrastructure::KnowledgeStore;
use crate::models::pipeline_config::{
    parse_params, stage_names::*, AccuracyRange, AdaptiveCountParams, CategoryParams,
    DifficultyRange, FixedCountParams, OrderParams, PercentageParams, ReviewCountRange, TagParams,
    TimeBudgetParams,
};
use crate::models::{SortOrder, StudyItem};
use crate::services::{filters, limiters, sorters, sources};
use crate::workflow::stage_ctx::StageCtx;

/// 数据源返回的 future
pub type SourceFuture = BoxFuture<'static, Result<Vec<StudyItem>, SourceError>>;

/// 数据源处理函数
pub type SourceFn = Arc<dyn Fn(Arc<dyn KnowledgeStore>, Value) -> SourceFuture + Send + Sync>;

/// 过滤器/排序器/限制器处理函数：接收上一阶段的输出和本阶段参数，返回新的序列
pub type StageFn =
    Arc<dyn Fn(Vec<StudyItem>, &Value, &StageCtx) -> Result<Vec<StudyItem>, StageError> + Send + Sync>;

/// 阶段注册表
#[derive(Clone, Default)]
pub struct StageRegistry {
    sources: HashMap<String, SourceFn>,
    filters: HashMap<String, StageFn>,
    sorters: HashMap<String, StageFn>,
    limiters: HashMap<String, StageFn>,
}

impl StageRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带全部内置阶段的注册表
    pub fn with_defaults(config: &Config) -> Self {
        let mut registry = Self::new();
        registry.register_default_sources();
        registry.register_default_filters();
        registry.register_default_sorters(config);
        registry.register_default_limiters(config);
        registry
    }

    /// 注册数据源策略
    pub fn register_source<F, Fut>(&mut self, name: impl Into<String>, source: F) -> &mut Self
    where
        F: Fn(Arc<dyn KnowledgeStore>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<StudyItem>, SourceError>> + Send + 'static,
    {
        let name = name.into();
        let handler: SourceFn = Arc::new(move |store, params| source(store, params).boxed());
        if self.sources.insert(name.clone(), handler).is_some() {
            debug!("覆盖已注册的数据源策略: {}", name);
        }
        self
    }

    /// 注册过滤器
    pub fn register_filter<F>(&mut self, name: impl Into<String>, filter: F) -> &mut Self
    where
        F: Fn(Vec<StudyItem>, &Value, &StageCtx) -> Result<Vec<StudyItem>, StageError> + Send + Sync + 'static,
    {
        self.insert(StageKind::Filter, name.into(), Arc::new(filter));
        self
    }

    /// 注册排序器
    pub fn register_sorter<F>(&mut self, name: impl Into<String>, sorter: F) -> &mut Self
    where
        F: Fn(Vec<StudyItem>, &Value, &StageCtx) -> Result<Vec<StudyItem>, StageError> + Send + Sync + 'static,
    {
        self.insert(StageKind::Sorter, name.into(), Arc::new(sorter));
        self
    }

    /// 注册限制器
    pub fn register_limiter<F>(&mut self, name: impl Into<String>, limiter: F) -> &mut Self
    where
        F: Fn(Vec<StudyItem>, &Value, &StageCtx) -> Result<Vec<StudyItem>, StageError> + Send + Sync + 'static,
    {
        self.insert(StageKind::Limiter, name.into(), Arc::new(limiter));
        self
    }

    fn table_mut(&mut self, kind: StageKind) -> Option<&mut HashMap<String, StageFn>> {
        match kind {
            StageKind::Source => None,
            StageKind::Filter => Some(&mut self.filters),
            StageKind::Sorter => Some(&mut self.sorters),
            StageKind::Limiter => Some(&mut self.limiters),
        }
    }

    fn insert(&mut self, kind: StageKind, name: String, handler: StageFn) {
        if let Some(table) = self.table_mut(kind) {
            if table.insert(name.clone(), handler).is_some() {
                debug!("覆盖已注册的{}: {}", kind, name);
            }
        }
    }

    pub fn source(&self, name: &str) -> Option<SourceFn> {
        self.sources.get(name).cloned()
    }

    /// 查找过滤器/排序器/限制器
    pub fn stage(&self, kind: StageKind, name: &str) -> Option<StageFn> {
        let table = match kind {
            StageKind::Source => return None,
            StageKind::Filter => &self.filters,
            StageKind::Sorter => &self.sorters,
            StageKind::Limiter => &self.limiters,
        };
        table.get(name).cloned()
    }

    /// 已注册的名称（排序后）
    pub fn names(&self, kind: StageKind) -> Vec<&str> {
        let mut names: Vec<&str> = match kind {
            StageKind::Source => self.sources.keys().map(String::as_str).collect(),
            StageKind::Filter => self.filters.keys().map(String::as_str).collect(),
            StageKind::Sorter => self.sorters.keys().map(String::as_str).collect(),
            StageKind::Limiter => self.limiters.keys().map(String::as_str).collect(),
        };
        names.sort_unstable();
        names
    }

    // ======================== 内置阶段 ========================

    fn register_default_sources(&mut self) {
        self.register_source(ALL_ITEMS, sources::all_items)
            .register_source(ALL_KNOWLEDGE, sources::all_items)
            .register_source(KNOWLEDGE_BASE, sources::knowledge_base)
            .register_source(KNOWLEDGE_AREA, sources::knowledge_area)
            .register_source(ALL_MISTAKES, sources::all_mistakes)
            .register_source(MISTAKES_BY_BASE, sources::mistakes_by_base)
            .register_source(MISTAKES_BY_AREA, sources::mistakes_by_area)
            .register_source(CUSTOM_LIST, sources::custom_list);
    }

    fn register_default_filters(&mut self) {
        self.register_filter(DUE_FOR_REVIEW, |items, _params, ctx| {
            Ok(filters::due_for_review(items, ctx.now))
        })
        .register_filter(BY_DIFFICULTY, |items, params, _ctx| {
            let range: DifficultyRange = parse_params(BY_DIFFICULTY, params)?;
            Ok(filters::by_difficulty(items, &range))
        })
        .register_filter(BY_ACCURACY, |items, params, _ctx| {
            let range: AccuracyRange = parse_params(BY_ACCURACY, params)?;
            Ok(filters::by_accuracy(items, &range))
        })
        .register_filter(BY_TAGS, |items, params, _ctx| {
            let tags: TagParams = parse_params(BY_TAGS, params)?;
            Ok(filters::by_tags(items, &tags))
        })
        .register_filter(BY_CATEGORY, |items, params, _ctx| {
            let categories: CategoryParams = parse_params(BY_CATEGORY, params)?;
            Ok(filters::by_category(items, &categories))
        })
        .register_filter(BY_REVIEW_COUNT, |items, params, _ctx| {
            let range: ReviewCountRange = parse_params(BY_REVIEW_COUNT, params)?;
            Ok(filters::by_review_count(items, &range))
        });
    }

    fn register_default_sorters(&mut self, config: &Config) {
        let weights = config.smart_weights;
        self.register_sorter(RANDOM, |items, _params, _ctx| {
            Ok(sorters::random(items, &mut rand::rng()))
        })
        .register_sorter(BY_REVIEW_TIME, ordered(BY_REVIEW_TIME, sorters::by_review_time))
        .register_sorter(BY_DIFFICULTY, ordered(BY_DIFFICULTY, sorters::by_difficulty))
        .register_sorter(BY_ACCURACY, ordered(BY_ACCURACY, sorters::by_accuracy))
        .register_sorter(BY_CREATED_TIME, ordered(BY_CREATED_TIME, sorters::by_created_time))
        .register_sorter(SMART, move |items, _params, ctx| {
            Ok(sorters::smart(items, ctx.now, &weights))
        });
    }

    fn register_default_limiters(&mut self, config: &Config) {
        let seconds_per_item = config.seconds_per_item;
        let default_accuracy = config.default_accuracy;

        let time_budget = move |items: Vec<StudyItem>, params: &Value, _ctx: &StageCtx| -> Result<Vec<StudyItem>, StageError> {
            let budget: TimeBudgetParams = parse_params(TIME_BUDGET, params)?;
            Ok(limiters::time_budget(items, budget.minutes, seconds_per_item))
        };
        let adaptive_count = move |items: Vec<StudyItem>, params: &Value, ctx: &StageCtx| -> Result<Vec<StudyItem>, StageError> {
            let bounds: AdaptiveCountParams = parse_params(ADAPTIVE_COUNT, params)?;
            let accuracy = ctx.overall_accuracy(default_accuracy);
            Ok(limiters::adaptive_count(items, accuracy, &bounds))
        };

        self.register_limiter(FIXED_COUNT, |items, params, _ctx| {
            let fixed: FixedCountParams = parse_params(FIXED_COUNT, params)?;
            Ok(limiters::fixed_count(items, fixed.count))
        })
        .register_limiter(PERCENTAGE, |items, params, _ctx| {
            let pct: PercentageParams = parse_params(PERCENTAGE, params)?;
            Ok(limiters::percentage(items, pct.percentage))
        })
        .register_limiter(TIME_BUDGET, time_budget)
        .register_limiter(TIME_LIMIT, time_budget)
        .register_limiter(ADAPTIVE_COUNT, adaptive_count)
        .register_limiter(SMART_LIMIT, adaptive_count);
    }
}

/// 带 `{order}` 参数的排序器
fn ordered(
    name: &'static str,
    sort: fn(Vec<StudyItem>, SortOrder) -> Vec<StudyItem>,
) -> impl Fn(Vec<StudyItem>, &Value, &StageCtx) -> Result<Vec<StudyItem>, StageError> + Send + Sync + 'static {
    move |items: Vec<StudyItem>, params: &Value, _ctx: &StageCtx| -> Result<Vec<StudyItem>, StageError> {
        let order: OrderParams = parse_params(name, params)?;
        Ok(sort(items, order.order))
    }
}

impl fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageRegistry")
            .field("sources", &self.names(StageKind::Source))
            .field("filters", &self.names(StageKind::Filter))
            .field("sorters", &self.names(StageKind::Sorter))
            .field("limiters", &self.names(StageKind::Limiter))
            .finish()
    }
}
