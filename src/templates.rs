//! 预设生成配置
//!
//! 常用复习场景对应的 `PipelineConfig`，可以直接交给生成器，也可以在此基础上继续调整

use serde_json::json;

use crate::models::pipeline_config::stage_names::ADAPTIVE_COUNT;
use crate::models::{
    FilterSpec, LimiterSpec, PipelineConfig, SortOrder, SorterSpec, SourceSpec, StageSpec,
    TagMatchMode,
};

/// 普通复习选项
#[derive(Debug, Clone, Default)]
pub struct ReviewOptions {
    /// 只保留到期的知识点
    pub only_due: bool,
    /// 随机顺序
    pub random: bool,
    /// 题量上限
    pub limit: Option<usize>,
}

/// 智能复习选项
#[derive(Debug, Clone)]
pub struct SmartReviewOptions {
    /// 为空时从全部知识点中选取
    pub base_id: Option<String>,
    /// 基础题量，最多出两倍
    pub count: usize,
    pub min_difficulty: Option<u8>,
    pub max_difficulty: Option<u8>,
    /// 命中任一标签即保留
    pub tags: Option<Vec<String>>,
    pub only_due: bool,
}

impl Default for SmartReviewOptions {
    fn default() -> Self {
        Self {
            base_id: None,
            count: 20,
            min_difficulty: None,
            max_difficulty: None,
            tags: None,
            only_due: true,
        }
    }
}

fn base_or_all(base_id: Option<&str>) -> SourceSpec {
    match base_id {
        Some(base_id) => SourceSpec::KnowledgeBase {
            base_id: base_id.to_string(),
        },
        None => SourceSpec::AllItems,
    }
}

fn apply_review_options(mut pipeline: PipelineConfig, options: &ReviewOptions, ordered: SorterSpec) -> PipelineConfig {
    if options.only_due {
        pipeline = pipeline.filter(FilterSpec::DueForReview);
    }
    pipeline = pipeline.sorter(if options.random { SorterSpec::Random } else { ordered });
    if let Some(limit) = options.limit {
        pipeline = pipeline.limiter(LimiterSpec::FixedCount(limit));
    }
    pipeline
}

/// 知识库复习：默认智能排序
pub fn knowledge_base_review(base_id: &str, options: &ReviewOptions) -> PipelineConfig {
    let source = SourceSpec::KnowledgeBase {
        base_id: base_id.to_string(),
    };
    apply_review_options(PipelineConfig::new(source), options, SorterSpec::Smart)
}

/// 知识区复习：默认按下次复习时间排序
pub fn knowledge_area_review(area_id: &str, options: &ReviewOptions) -> PipelineConfig {
    let source = SourceSpec::KnowledgeArea {
        area_id: area_id.to_string(),
    };
    apply_review_options(
        PipelineConfig::new(source),
        options,
        SorterSpec::ByReviewTime(SortOrder::Asc),
    )
}

/// 智能复习
///
/// 到期过滤（默认开启）+ 可选难度/标签过滤 + 智能排序 + 按正确率自适应题量
pub fn smart_review(options: &SmartReviewOptions) -> PipelineConfig {
    let mut pipeline = PipelineConfig::new(base_or_all(options.base_id.as_deref()));

    if options.only_due {
        pipeline = pipeline.filter(FilterSpec::DueForReview);
    }
    if options.min_difficulty.is_some() || options.max_difficulty.is_some() {
        pipeline = pipeline.filter(FilterSpec::ByDifficulty {
            min: options.min_difficulty,
            max: options.max_difficulty,
        });
    }
    if let Some(tags) = &options.tags {
        pipeline = pipeline.filter(FilterSpec::ByTags {
            tags: tags.clone(),
            mode: TagMatchMode::Any,
        });
    }

    // 最少题量沿用限制器默认值
    pipeline.sorter(SorterSpec::Smart).limiter(StageSpec::with_params(
        ADAPTIVE_COUNT,
        json!({ "baseCount": options.count, "maxCount": options.count.saturating_mul(2) }),
    ))
}

fn mistake_review(source: SourceSpec, options: &ReviewOptions) -> PipelineConfig {
    let mut pipeline = PipelineConfig::new(source).sorter(if options.random {
        SorterSpec::Random
    } else {
        SorterSpec::ByAccuracy(SortOrder::Asc)
    });
    if let Some(limit) = options.limit {
        pipeline = pipeline.limiter(LimiterSpec::FixedCount(limit));
    }
    pipeline
}

/// 错题复习（知识库）：默认正确率从低到高，`only_due` 不生效
pub fn mistake_review_by_base(base_id: &str, options: &ReviewOptions) -> PipelineConfig {
    mistake_review(
        SourceSpec::MistakesByBase {
            base_id: base_id.to_string(),
        },
        options,
    )
}

/// 错题复习（知识区）
pub fn mistake_review_by_area(area_id: &str, options: &ReviewOptions) -> PipelineConfig {
    mistake_review(
        SourceSpec::MistakesByArea {
            area_id: area_id.to_string(),
        },
        options,
    )
}

pub fn all_mistakes_review(options: &ReviewOptions) -> PipelineConfig {
    mistake_review(SourceSpec::AllMistakes, options)
}

/// 弱项强化：复习过至少 2 次且正确率不高于 70% 的知识点，正确率从低到高
pub fn weakness_review(base_id: Option<&str>, count: Option<usize>) -> PipelineConfig {
    PipelineConfig::new(base_or_all(base_id))
        .filter(FilterSpec::ByAccuracy {
            min: None,
            max: Some(0.7),
        })
        .filter(FilterSpec::ByReviewCount {
            min: Some(2),
            max: None,
        })
        .sorter(SorterSpec::ByAccuracy(SortOrder::Asc))
        .limiter(LimiterSpec::FixedCount(count.unwrap_or(15)))
}
