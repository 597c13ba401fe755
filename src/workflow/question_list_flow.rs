//! 题目列表生成流程 - 流程层
//!
//! 核心职责：定义"一次生成"的完整流程
//!
//! 流程顺序：
//! 1. 校验配置，解析数据源
//! 2. 数据源取数（唯一访问存储的步骤；配置了限制器时同时获取整体统计）
//! 3. 按顺序执行过滤器 → 排序器 → 限制器
//! 4. 写入序号等元信息，按需打乱选择题选项

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ConfigError, Diagnostic, GeneratorError, GeneratorResult, StageKind};
use crate::infrastructure::KnowledgeStore;
use crate::models::{PipelineConfig, PipelineMeta, StageSpec, StudyItem};
use crate::services::{BatchShuffleOptions, ChoiceProcessor, ShuffleSummary};
use crate::utils::logging;
use crate::workflow::registry::StageRegistry;
use crate::workflow::stage_ctx::StageCtx;

/// 一次生成的完整结果
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// 最终题目列表
    pub items: Vec<StudyItem>,
    /// 非致命诊断（被跳过的阶段、打乱回退等）
    pub diagnostics: Vec<Diagnostic>,
    /// 打乱汇总，未打乱或关闭汇总时为 None
    pub shuffle_summary: Option<ShuffleSummary>,
}

/// 题目列表生成器
///
/// - 持有知识存储和阶段注册表
/// - 每次生成互不影响，可以并发调用
/// - 只在数据源步骤访问存储
pub struct QuestionListGenerator {
    store: Arc<dyn KnowledgeStore>,
    registry: StageRegistry,
    choice_processor: ChoiceProcessor,
    config: Config,
}

impl QuestionListGenerator {
    /// 使用内置阶段创建生成器
    pub fn new(store: Arc<dyn KnowledgeStore>, config: Config) -> Self {
        let registry = StageRegistry::with_defaults(&config);
        Self::with_registry(store, registry, config)
    }

    /// 使用自定义注册表创建生成器
    pub fn with_registry(store: Arc<dyn KnowledgeStore>, registry: StageRegistry, config: Config) -> Self {
        Self {
            store,
            registry,
            choice_processor: ChoiceProcessor::new(config.verbose_logging),
            config,
        }
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// 可变注册表，用于注册或覆盖阶段
    pub fn registry_mut(&mut self) -> &mut StageRegistry {
        &mut self.registry
    }

    pub fn choice_processor(&self) -> &ChoiceProcessor {
        &self.choice_processor
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 生成题目列表
    ///
    /// # 参数
    /// - `pipeline`: 生成配置
    ///
    /// # 返回
    /// 返回最终题目列表；诊断信息只写入日志
    pub async fn generate_question_list(&self, pipeline: &PipelineConfig) -> GeneratorResult<Vec<StudyItem>> {
        Ok(self.generate_with_report(pipeline).await?.items)
    }

    /// 生成题目列表，同时返回诊断信息
    pub async fn generate_with_report(&self, pipeline: &PipelineConfig) -> GeneratorResult<GenerationReport> {
        self.generate_with_report_at(pipeline, Utc::now()).await
    }

    /// 以指定时间为基准生成题目列表
    pub async fn generate_with_report_at(
        &self,
        pipeline: &PipelineConfig,
        now: DateTime<Utc>,
    ) -> GeneratorResult<GenerationReport> {
        // ========== 1. 校验配置 ==========
        pipeline.validate()?;
        let source_type = pipeline.source.kind.as_str();
        let source = self
            .registry
            .source(source_type)
            .ok_or_else(|| ConfigError::UnknownSourceType(source_type.to_string()))?;

        logging::log_generation_start(pipeline);
        let mut diagnostics = Vec::new();

        // ========== 2. 数据源 ==========
        let mut items = source(self.store.clone(), pipeline.source.params.clone())
            .await
            .map_err(|error| GeneratorError::Source {
                source_type: source_type.to_string(),
                error,
            })?;
        info!("📥 数据源 {} 获取到 {} 个知识点", source_type, items.len());

        let mut ctx = StageCtx::new(now, source_type);
        if pipeline.limiter.is_some() {
            match self.store.get_overall_accuracy_statistics().await {
                Ok(statistics) => ctx = ctx.with_statistics(statistics),
                Err(e) => {
                    warn!("⚠️ 无法获取整体统计，使用默认正确率: {}", e);
                    diagnostics.push(Diagnostic::StatisticsUnavailable {
                        reason: e.to_string(),
                    });
                }
            }
        }

        // ========== 3. 过滤 → 排序 → 限制 ==========
        for filter in &pipeline.filters {
            items = self.apply_stage(StageKind::Filter, filter, items, &ctx, &mut diagnostics);
        }
        if let Some(sorter) = &pipeline.sorter {
            items = self.apply_stage(StageKind::Sorter, sorter, items, &ctx, &mut diagnostics);
        }
        if let Some(limiter) = &pipeline.limiter {
            items = self.apply_stage(StageKind::Limiter, limiter, items, &ctx, &mut diagnostics);
        }

        // ========== 4. 元信息与选项打乱 ==========
        let total_count = items.len();
        for (index, item) in items.iter_mut().enumerate() {
            item.meta = Some(PipelineMeta {
                sequence_index: index,
                generated_at: now,
                source_type: source_type.to_string(),
                total_count,
            });
        }

        let (items, shuffle_summary) = self.shuffle_choices(pipeline, items, &mut diagnostics);

        for diagnostic in &diagnostics {
            debug!("{} {}", ctx, diagnostic);
        }
        logging::log_generation_complete(items.len(), diagnostics.len());

        Ok(GenerationReport {
            items,
            diagnostics,
            shuffle_summary,
        })
    }

    /// 执行单个过滤器/排序器/限制器
    ///
    /// 未注册、执行失败或输出违反约定时跳过该阶段，返回输入本身
    fn apply_stage(
        &self,
        kind: StageKind,
        spec: &StageSpec,
        items: Vec<StudyItem>,
        ctx: &StageCtx,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<StudyItem> {
        let name = spec.kind.as_str();
        let Some(stage) = self.registry.stage(kind, name) else {
            warn!("⚠️ 未找到{}: {}，已跳过", kind, name);
            diagnostics.push(Diagnostic::UnknownStage {
                stage: kind,
                name: name.to_string(),
            });
            return items;
        };

        // 阶段会消耗输入，回退需要保留一份完整副本
        let before = items.len();
        let output = match stage(items.clone(), &spec.params, ctx) {
            Ok(output) => output,
            Err(e) => {
                warn!("⚠️ {} {} 执行失败，已跳过: {}", kind, name, e);
                diagnostics.push(Diagnostic::StageFailed {
                    stage: kind,
                    name: name.to_string(),
                    reason: e.to_string(),
                });
                return items;
            }
        };

        let after = output.len();
        let violated = match kind {
            StageKind::Sorter => after != before,
            _ => after > before,
        };
        if violated {
            warn!("⚠️ {} {} 输出数量异常 ({} → {})，已忽略", kind, name, before, after);
            diagnostics.push(Diagnostic::StageContractViolation {
                stage: kind,
                name: name.to_string(),
                before,
                after,
            });
            return items;
        }

        logging::log_stage_result(kind, name, before, after);
        output
    }

    fn shuffle_choices(
        &self,
        pipeline: &PipelineConfig,
        items: Vec<StudyItem>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (Vec<StudyItem>, Option<ShuffleSummary>) {
        let options = BatchShuffleOptions {
            enabled: pipeline.shuffle_options.unwrap_or(self.config.shuffle_enabled),
            log_summary: self.config.shuffle_log_summary,
        };
        if !options.enabled {
            return (items, None);
        }

        if self.config.verbose_logging {
            info!("[选择题打乱] 处理前: {}", self.choice_processor.get_statistics(&items));
        }

        let outcome = self.choice_processor.batch_shuffle(items, &options);
        diagnostics.extend(outcome.fallbacks.into_iter().map(|f| Diagnostic::ShuffleFallback {
            item_id: f.item_id,
            reason: f.reason,
        }));

        if self.config.verbose_logging {
            info!("[选择题打乱] 处理后: {}", self.choice_processor.get_statistics(&outcome.items));
        }

        (outcome.items, outcome.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryStore;
    use crate::models::{stage_names, FilterSpec, LimiterSpec, SorterSpec, SourceSpec};
    use serde_json::json;

    fn generator(items: Vec<StudyItem>) -> QuestionListGenerator {
        QuestionListGenerator::new(Arc::new(MemoryStore::new(items)), Config::default().without_shuffle())
    }

    fn ids(items: &[StudyItem]) -> Vec<&str> {
        items.iter().map(|q| q.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_unknown_filter_is_skipped_with_diagnostic() {
        let gen = generator(vec![StudyItem::fill("q1"), StudyItem::fill("q2")]);
        let pipeline = PipelineConfig::new(SourceSpec::AllItems).filter(StageSpec::new("by-unicorn"));

        let report = gen.generate_with_report(&pipeline).await.unwrap();
        assert_eq!(ids(&report.items), vec!["q1", "q2"]);
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::UnknownStage {
                stage: StageKind::Filter,
                name: "by-unicorn".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_invalid_params_skip_stage() {
        let gen = generator(vec![
            StudyItem::fill("easy").with_difficulty(1),
            StudyItem::fill("hard").with_difficulty(5),
        ]);
        let pipeline = PipelineConfig::new(SourceSpec::AllItems)
            .filter(StageSpec::with_params(stage_names::BY_DIFFICULTY, json!({ "minDifficulty": "x" })))
            .sorter(SorterSpec::ByDifficulty(crate::models::SortOrder::Desc));

        let report = gen.generate_with_report(&pipeline).await.unwrap();
        assert_eq!(ids(&report.items), vec!["hard", "easy"]);
        assert!(matches!(
            report.diagnostics[0],
            Diagnostic::StageFailed { stage: StageKind::Filter, .. }
        ));
    }

    #[tokio::test]
    async fn test_growing_filter_output_is_discarded() {
        let mut gen = generator(vec![StudyItem::fill("q1")]);
        gen.registry_mut().register_filter("duplicate", |items, _params, _ctx| {
            let mut out = items.clone();
            out.extend(items);
            Ok(out)
        });
        gen.registry_mut().register_sorter("drop-all", |_items, _params, _ctx| Ok(Vec::new()));

        let pipeline = PipelineConfig::new(SourceSpec::AllItems)
            .filter(StageSpec::new("duplicate"))
            .sorter(StageSpec::new("drop-all"));
        let report = gen.generate_with_report(&pipeline).await.unwrap();

        assert_eq!(ids(&report.items), vec!["q1"]);
        assert_eq!(report.diagnostics.len(), 2);
        assert!(report
            .diagnostics
            .iter()
            .all(|d| matches!(d, Diagnostic::StageContractViolation { .. })));
    }

    #[tokio::test]
    async fn test_meta_is_stamped_after_limit() {
        let gen = generator((0..5).map(|i| StudyItem::fill(format!("q{}", i))).collect());
        let pipeline = PipelineConfig::new(SourceSpec::AllItems).limiter(LimiterSpec::FixedCount(3));
        let now = Utc::now();

        let report = gen.generate_with_report_at(&pipeline, now).await.unwrap();
        assert_eq!(report.items.len(), 3);
        for (index, item) in report.items.iter().enumerate() {
            let meta = item.meta.as_ref().unwrap();
            assert_eq!(meta.sequence_index, index);
            assert_eq!(meta.total_count, 3);
            assert_eq!(meta.generated_at, now);
            assert_eq!(meta.source_type, stage_names::ALL_ITEMS);
        }
    }

    #[tokio::test]
    async fn test_filter_order_does_not_change_result() {
        let items = vec![
            StudyItem::fill("a").with_difficulty(2).with_tags(["rust"]),
            StudyItem::fill("b").with_difficulty(4).with_tags(["rust"]),
            StudyItem::fill("c").with_difficulty(4).with_tags(["go"]),
        ];
        let gen = generator(items);
        let difficulty = FilterSpec::ByDifficulty { min: Some(3), max: None };
        let tags = FilterSpec::ByTags {
            tags: vec!["rust".to_string()],
            mode: Default::default(),
        };

        let ab = PipelineConfig::new(SourceSpec::AllItems)
            .filter(difficulty.clone())
            .filter(tags.clone());
        let ba = PipelineConfig::new(SourceSpec::AllItems).filter(tags).filter(difficulty);

        let first = gen.generate_question_list(&ab).await.unwrap();
        let second = gen.generate_question_list(&ba).await.unwrap();
        assert_eq!(ids(&first), vec!["b"]);
        assert_eq!(ids(&first), ids(&second));
    }
}
