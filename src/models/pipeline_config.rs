//! 题目列表生成配置
//!
//! 配置是纯数据：每个阶段用 `{type, params}` 描述，由生成器在注册表中按名称解析。
//! 内置阶段另外提供强类型的构造枚举（`SourceSpec` / `FilterSpec` / `SorterSpec` / `LimiterSpec`），
//! 它们最终都转换为 `StageSpec`，因此调用方可以用同名注册覆盖内置实现。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{ConfigError, StageError};

/// 内置阶段名称
pub mod stage_names {
    // 数据源
    pub const ALL_ITEMS: &str = "all-items";
    pub const ALL_KNOWLEDGE: &str = "all-knowledge";
    pub const KNOWLEDGE_BASE: &str = "knowledge-base";
    pub const KNOWLEDGE_AREA: &str = "knowledge-area";
    pub const ALL_MISTAKES: &str = "all-mistakes";
    pub const MISTAKES_BY_BASE: &str = "mistakes-by-base";
    pub const MISTAKES_BY_AREA: &str = "mistakes-by-area";
    pub const CUSTOM_LIST: &str = "custom-list";

    // 过滤器
    pub const DUE_FOR_REVIEW: &str = "due-for-review";
    pub const BY_DIFFICULTY: &str = "by-difficulty";
    pub const BY_ACCURACY: &str = "by-accuracy";
    pub const BY_TAGS: &str = "by-tags";
    pub const BY_CATEGORY: &str = "by-category";
    pub const BY_REVIEW_COUNT: &str = "by-review-count";

    // 排序器（by-difficulty / by-accuracy 与过滤器同名，分属不同注册表）
    pub const RANDOM: &str = "random";
    pub const BY_REVIEW_TIME: &str = "by-review-time";
    pub const BY_CREATED_TIME: &str = "by-created-time";
    pub const SMART: &str = "smart";

    // 限制器
    pub const FIXED_COUNT: &str = "fixed-count";
    pub const PERCENTAGE: &str = "percentage";
    pub const TIME_BUDGET: &str = "time-budget";
    pub const TIME_LIMIT: &str = "time-limit";
    pub const ADAPTIVE_COUNT: &str = "adaptive-count";
    pub const SMART_LIMIT: &str = "smart-limit";
}

/// 单个阶段的描述 `{type, params}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl StageSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: Value::Null,
        }
    }

    pub fn with_params(kind: impl Into<String>, params: Value) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }

    /// 将参数解析为强类型记录，缺省参数按空对象处理
    pub fn parse_params<T: DeserializeOwned>(&self) -> Result<T, StageError> {
        parse_params(&self.kind, &self.params)
    }
}

/// 把 JSON 参数解析为阶段自己的参数类型
pub fn parse_params<T: DeserializeOwned>(stage: &str, params: &Value) -> Result<T, StageError> {
    let value = if params.is_null() {
        Value::Object(Map::new())
    } else {
        params.clone()
    };
    serde_json::from_value(value).map_err(|e| StageError::InvalidParams {
        stage: stage.to_string(),
        reason: e.to_string(),
    })
}

/// 题目列表生成配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    #[serde(default)]
    pub source: StageSpec,
    #[serde(default)]
    pub filters: Vec<StageSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorter: Option<StageSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limiter: Option<StageSpec>,
    /// 覆盖全局的选项打乱开关
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle_options: Option<bool>,
}

impl PipelineConfig {
    pub fn new(source: impl Into<StageSpec>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn filter(mut self, filter: impl Into<StageSpec>) -> Self {
        self.filters.push(filter.into());
        self
    }

    pub fn sorter(mut self, sorter: impl Into<StageSpec>) -> Self {
        self.sorter = Some(sorter.into());
        self
    }

    pub fn limiter(mut self, limiter: impl Into<StageSpec>) -> Self {
        self.limiter = Some(limiter.into());
        self
    }

    pub fn shuffle(mut self, enabled: bool) -> Self {
        self.shuffle_options = Some(enabled);
        self
    }

    /// 校验配置结构
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.kind.trim().is_empty() {
            return Err(ConfigError::MissingSourceType);
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

// ========== 参数记录 ==========

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMatchMode {
    #[default]
    Any,
    All,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaseParams {
    pub base_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AreaParams {
    pub area_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomListParams {
    #[serde(alias = "knowledgeIds")]
    pub item_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DifficultyRange {
    pub min_difficulty: Option<u8>,
    pub max_difficulty: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccuracyRange {
    pub min_accuracy: Option<f64>,
    pub max_accuracy: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagParams {
    pub tags: Vec<String>,
    pub mode: TagMatchMode,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryParams {
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewCountRange {
    pub min_count: Option<u32>,
    pub max_count: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderParams {
    pub order: SortOrder,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixedCountParams {
    pub count: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PercentageParams {
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeBudgetParams {
    /// 时间预算（分钟）
    #[serde(alias = "timeLimit")]
    pub minutes: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdaptiveCountParams {
    pub base_count: usize,
    pub min_count: usize,
    pub max_count: usize,
}

impl Default for AdaptiveCountParams {
    fn default() -> Self {
        Self {
            base_count: 20,
            min_count: 10,
            max_count: 50,
        }
    }
}

// ========== 强类型构造 ==========

/// 内置数据源
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    AllItems,
    KnowledgeBase { base_id: String },
    KnowledgeArea { area_id: String },
    AllMistakes,
    MistakesByBase { base_id: String },
    MistakesByArea { area_id: String },
    CustomList { item_ids: Vec<String> },
}

impl From<SourceSpec> for StageSpec {
    fn from(spec: SourceSpec) -> Self {
        use stage_names::*;
        match spec {
            SourceSpec::AllItems => StageSpec::new(ALL_ITEMS),
            SourceSpec::KnowledgeBase { base_id } => {
                StageSpec::with_params(KNOWLEDGE_BASE, json!({ "baseId": base_id }))
            }
            SourceSpec::KnowledgeArea { area_id } => {
                StageSpec::with_params(KNOWLEDGE_AREA, json!({ "areaId": area_id }))
            }
            SourceSpec::AllMistakes => StageSpec::new(ALL_MISTAKES),
            SourceSpec::MistakesByBase { base_id } => {
                StageSpec::with_params(MISTAKES_BY_BASE, json!({ "baseId": base_id }))
            }
            SourceSpec::MistakesByArea { area_id } => {
                StageSpec::with_params(MISTAKES_BY_AREA, json!({ "areaId": area_id }))
            }
            SourceSpec::CustomList { item_ids } => {
                StageSpec::with_params(CUSTOM_LIST, json!({ "itemIds": item_ids }))
            }
        }
    }
}

/// 内置过滤器
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    DueForReview,
    ByDifficulty { min: Option<u8>, max: Option<u8> },
    ByAccuracy { min: Option<f64>, max: Option<f64> },
    ByTags { tags: Vec<String>, mode: TagMatchMode },
    ByCategory { categories: Vec<String> },
    ByReviewCount { min: Option<u32>, max: Option<u32> },
}

impl From<FilterSpec> for StageSpec {
    fn from(spec: FilterSpec) -> Self {
        use stage_names::*;
        match spec {
            FilterSpec::DueForReview => StageSpec::new(DUE_FOR_REVIEW),
            FilterSpec::ByDifficulty { min, max } => StageSpec::with_params(
                BY_DIFFICULTY,
                json!({ "minDifficulty": min, "maxDifficulty": max }),
            ),
            FilterSpec::ByAccuracy { min, max } => StageSpec::with_params(
                BY_ACCURACY,
                json!({ "minAccuracy": min, "maxAccuracy": max }),
            ),
            FilterSpec::ByTags { tags, mode } => {
                StageSpec::with_params(BY_TAGS, json!({ "tags": tags, "mode": mode }))
            }
            FilterSpec::ByCategory { categories } => {
                StageSpec::with_params(BY_CATEGORY, json!({ "categories": categories }))
            }
            FilterSpec::ByReviewCount { min, max } => StageSpec::with_params(
                BY_REVIEW_COUNT,
                json!({ "minCount": min, "maxCount": max }),
            ),
        }
    }
}

/// 内置排序器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SorterSpec {
    Random,
    ByReviewTime(SortOrder),
    ByDifficulty(SortOrder),
    ByAccuracy(SortOrder),
    ByCreatedTime(SortOrder),
    Smart,
}

impl From<SorterSpec> for StageSpec {
    fn from(spec: SorterSpec) -> Self {
        use stage_names::*;
        let ordered = |name: &str, order: SortOrder| {
            StageSpec::with_params(name, json!({ "order": order }))
        };
        match spec {
            SorterSpec::Random => StageSpec::new(RANDOM),
            SorterSpec::ByReviewTime(order) => ordered(BY_REVIEW_TIME, order),
            SorterSpec::ByDifficulty(order) => ordered(BY_DIFFICULTY, order),
            SorterSpec::ByAccuracy(order) => ordered(BY_ACCURACY, order),
            SorterSpec::ByCreatedTime(order) => ordered(BY_CREATED_TIME, order),
            SorterSpec::Smart => StageSpec::new(SMART),
        }
    }
}

/// 内置限制器
#[derive(Debug, Clone, PartialEq)]
pub enum LimiterSpec {
    FixedCount(usize),
    Percentage(f64),
    TimeBudget { minutes: f64 },
    AdaptiveCount { base: usize, min: usize, max: usize },
}

impl From<LimiterSpec> for StageSpec {
    fn from(spec: LimiterSpec) -> Self {
        use stage_names::*;
        match spec {
            LimiterSpec::FixedCount(count) => {
                StageSpec::with_params(FIXED_COUNT, json!({ "count": count }))
            }
            LimiterSpec::Percentage(percentage) => {
                StageSpec::with_params(PERCENTAGE, json!({ "percentage": percentage }))
            }
            LimiterSpec::TimeBudget { minutes } => {
                StageSpec::with_params(TIME_BUDGET, json!({ "minutes": minutes }))
            }
            LimiterSpec::AdaptiveCount { base, min, max } => StageSpec::with_params(
                ADAPTIVE_COUNT,
                json!({ "baseCount": base, "minCount": min, "maxCount": max }),
            ),
        }
    }
}
