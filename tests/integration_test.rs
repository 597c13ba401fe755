use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::future::{BoxFuture, FutureExt};
use serde_json::json;

use question_list_generator::infrastructure::knowledge_store::StoreResult;
use question_list_generator::models::{
    stage_names, AccuracyStatistics, FilterSpec, LimiterSpec, MistakeRecord, SortOrder, SorterSpec,
    SourceSpec,
};
use question_list_generator::templates::{self, ReviewOptions};
use question_list_generator::utils::logging;
use question_list_generator::{
    Config, ConfigError, Diagnostic, GeneratorError, KnowledgeStore, MemoryStore, PipelineConfig,
    QuestionListGenerator, SourceError, StageSpec, StoreError, StudyItem,
};

fn generator(items: Vec<StudyItem>) -> QuestionListGenerator {
    logging::init();
    QuestionListGenerator::new(Arc::new(MemoryStore::new(items)), Config::default().without_shuffle())
}

fn ids(items: &[StudyItem]) -> Vec<&str> {
    items.iter().map(|q| q.id.as_str()).collect()
}

/// 所有查询都失败的存储
struct BrokenStore;

fn broken<'a, T: Send + 'a>() -> BoxFuture<'a, StoreResult<T>> {
    async { Err(StoreError::Unavailable("数据库已关闭".to_string())) }.boxed()
}

impl KnowledgeStore for BrokenStore {
    fn get_all_items(&self) -> BoxFuture<'_, StoreResult<Vec<StudyItem>>> {
        broken()
    }

    fn get_items_by_knowledge_base<'a>(&'a self, _base_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<StudyItem>>> {
        broken()
    }

    fn get_items_by_area<'a>(&'a self, _area_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<StudyItem>>> {
        broken()
    }

    fn get_item_by_id<'a>(&'a self, _id: &'a str) -> BoxFuture<'a, StoreResult<Option<StudyItem>>> {
        broken()
    }

    fn get_unresolved_mistakes(&self) -> BoxFuture<'_, StoreResult<Vec<MistakeRecord>>> {
        broken()
    }

    fn get_overall_accuracy_statistics(&self) -> BoxFuture<'_, StoreResult<AccuracyStatistics>> {
        broken()
    }
}

/// 取数正常，但整体统计不可用
struct NoStatisticsStore(MemoryStore);

impl KnowledgeStore for NoStatisticsStore {
    fn get_all_items(&self) -> BoxFuture<'_, StoreResult<Vec<StudyItem>>> {
        self.0.get_all_items()
    }

    fn get_items_by_knowledge_base<'a>(&'a self, base_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<StudyItem>>> {
        self.0.get_items_by_knowledge_base(base_id)
    }

    fn get_items_by_area<'a>(&'a self, area_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<StudyItem>>> {
        self.0.get_items_by_area(area_id)
    }

    fn get_item_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<StudyItem>>> {
        self.0.get_item_by_id(id)
    }

    fn get_unresolved_mistakes(&self) -> BoxFuture<'_, StoreResult<Vec<MistakeRecord>>> {
        self.0.get_unresolved_mistakes()
    }

    fn get_overall_accuracy_statistics(&self) -> BoxFuture<'_, StoreResult<AccuracyStatistics>> {
        broken()
    }
}

#[tokio::test]
async fn test_sort_then_limit_by_difficulty() {
    let gen = generator(vec![
        StudyItem::fill("q1").with_difficulty(2),
        StudyItem::fill("q2").with_difficulty(4),
        StudyItem::fill("q3").with_difficulty(1),
    ]);
    let pipeline = PipelineConfig::new(SourceSpec::AllItems)
        .sorter(SorterSpec::ByDifficulty(SortOrder::Asc))
        .limiter(LimiterSpec::FixedCount(2));

    let items = gen.generate_question_list(&pipeline).await.unwrap();
    assert_eq!(ids(&items), vec!["q3", "q1"]);
}

#[tokio::test]
async fn test_shuffled_correct_keys_follow_texts() {
    logging::init();
    let original = StudyItem::choice("c1", ["X", "Y", "Z", "W"], "A,C").with_question("选出 X 和 Z");
    let gen = QuestionListGenerator::new(Arc::new(MemoryStore::new(vec![original.clone()])), Config::default());

    for _ in 0..20 {
        let report = gen
            .generate_with_report(&PipelineConfig::new(SourceSpec::AllItems))
            .await
            .unwrap();
        let shuffled = &report.items[0];

        let expected: Vec<String> = shuffled
            .options
            .iter()
            .filter(|opt| opt.text == "X" || opt.text == "Z")
            .map(|opt| opt.key.clone())
            .collect();
        assert_eq!(shuffled.correct_keys(), expected);
        assert!(gen.choice_processor().validate_shuffle_result(&original, shuffled));

        let info = shuffled.shuffle_info.as_ref().unwrap();
        assert_eq!(info.original_correct_keys, vec!["A", "C"]);
        assert_eq!(info.correct_texts, vec!["X", "Z"]);
        assert_eq!(report.shuffle_summary.unwrap().shuffled_items, 1);
    }
}

#[tokio::test]
async fn test_malformed_choice_falls_back_to_original() {
    logging::init();
    let bad = StudyItem::choice("bad", ["X", "Y", "Z"], "A,E");
    let gen = QuestionListGenerator::new(Arc::new(MemoryStore::new(vec![bad.clone()])), Config::default());

    let report = gen
        .generate_with_report(&PipelineConfig::new(SourceSpec::AllItems))
        .await
        .unwrap();
    let item = &report.items[0];
    assert_eq!(item.options, bad.options);
    assert_eq!(item.correct_answer, bad.correct_answer);
    assert!(item.shuffle_info.is_none());
    assert!(report
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::ShuffleFallback { item_id, .. } if item_id == "bad")));
}

#[tokio::test]
async fn test_unknown_filter_does_not_affect_result() {
    let gen = generator(vec![StudyItem::fill("q1"), StudyItem::fill("q2")]);
    let pipeline = PipelineConfig::new(SourceSpec::AllItems).filter(StageSpec::new("by-unicorn"));

    let report = gen.generate_with_report(&pipeline).await.unwrap();
    assert_eq!(ids(&report.items), vec!["q1", "q2"]);
    assert_eq!(report.diagnostics.len(), 1);
}

#[tokio::test]
async fn test_empty_source_flows_through_every_stage() {
    let gen = generator(Vec::new());
    let pipeline = PipelineConfig::new(SourceSpec::AllItems)
        .filter(FilterSpec::DueForReview)
        .filter(FilterSpec::ByDifficulty { min: Some(1), max: Some(3) })
        .sorter(SorterSpec::Smart)
        .limiter(LimiterSpec::AdaptiveCount { base: 20, min: 10, max: 50 });

    let report = gen.generate_with_report(&pipeline).await.unwrap();
    assert!(report.items.is_empty());
    assert!(report.diagnostics.is_empty());
}

#[tokio::test]
async fn test_filter_application_order_keeps_membership() {
    let now = Utc::now();
    let items = vec![
        StudyItem::fill("due-hard").with_difficulty(5).with_next_review_at(now - Duration::days(1)),
        StudyItem::fill("due-easy").with_difficulty(1).with_next_review_at(now - Duration::days(2)),
        StudyItem::fill("later-hard").with_difficulty(4).with_next_review_at(now + Duration::days(3)),
        StudyItem::fill("never").with_difficulty(4),
    ];
    let gen = generator(items);
    let due = FilterSpec::DueForReview;
    let hard = FilterSpec::ByDifficulty { min: Some(4), max: None };

    let first = PipelineConfig::new(SourceSpec::AllItems).filter(due.clone()).filter(hard.clone());
    let second = PipelineConfig::new(SourceSpec::AllItems).filter(hard).filter(due);

    let a = gen.generate_with_report_at(&first, now).await.unwrap().items;
    let b = gen.generate_with_report_at(&second, now).await.unwrap().items;
    let a: HashSet<&str> = a.iter().map(|q| q.id.as_str()).collect();
    let b: HashSet<&str> = b.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(a, b);
    assert_eq!(a, HashSet::from(["due-hard"]));
}

#[tokio::test]
async fn test_fixed_count_is_prefix_of_sorted_input() {
    let items: Vec<StudyItem> = (0..6)
        .map(|i| StudyItem::fill(format!("q{}", i)).with_difficulty((i % 5 + 1) as u8))
        .collect();
    let gen = generator(items);
    let sorted = PipelineConfig::new(SourceSpec::AllItems).sorter(SorterSpec::ByDifficulty(SortOrder::Desc));
    let full = gen.generate_question_list(&sorted).await.unwrap();

    for n in [1usize, 3, 6, 10] {
        let limited = gen
            .generate_question_list(&sorted.clone().limiter(LimiterSpec::FixedCount(n)))
            .await
            .unwrap();
        assert_eq!(limited.len(), n.min(full.len()));
        assert_eq!(ids(&limited), ids(&full[..limited.len()]));
    }
}

#[tokio::test]
async fn test_fixed_count_zero_yields_empty_list() {
    let gen = generator((0..5).map(|i| StudyItem::fill(format!("q{}", i))).collect());
    let pipeline = PipelineConfig::new(SourceSpec::AllItems).limiter(LimiterSpec::FixedCount(0));

    let report = gen.generate_with_report(&pipeline).await.unwrap();
    assert!(report.items.is_empty());
    assert!(report.diagnostics.is_empty());

    let negative = PipelineConfig::new(SourceSpec::AllItems)
        .limiter(StageSpec::with_params(stage_names::FIXED_COUNT, json!({ "count": -2 })));
    assert!(gen.generate_question_list(&negative).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_random_sorters_are_deterministic() {
    let now = Utc::now();
    let items: Vec<StudyItem> = (0..8)
        .map(|i| {
            StudyItem::fill(format!("q{}", i))
                .with_difficulty((i % 3 + 1) as u8)
                .with_reviews(4, (i % 4) as u32)
                .with_next_review_at(now - Duration::days(i % 3))
        })
        .collect();
    let gen = generator(items);

    for sorter in [
        SorterSpec::Smart,
        SorterSpec::ByAccuracy(SortOrder::Asc),
        SorterSpec::ByReviewTime(SortOrder::Desc),
    ] {
        let pipeline = PipelineConfig::new(SourceSpec::AllItems).sorter(sorter);
        let first = gen.generate_with_report_at(&pipeline, now).await.unwrap().items;
        let second = gen.generate_with_report_at(&pipeline, now).await.unwrap().items;
        assert_eq!(ids(&first), ids(&second));
    }
}

#[tokio::test]
async fn test_registering_same_name_overrides_builtin() {
    let mut gen = generator((0..5).map(|i| StudyItem::fill(format!("q{}", i))).collect());
    gen.registry_mut()
        .register_limiter(stage_names::FIXED_COUNT, |mut items, _params, _ctx| {
            items.truncate(1);
            Ok(items)
        })
        .register_source(stage_names::ALL_ITEMS, |_store, _params| async {
            Ok::<_, SourceError>(vec![StudyItem::fill("custom"), StudyItem::fill("other")])
        });

    let pipeline = PipelineConfig::new(SourceSpec::AllItems).limiter(LimiterSpec::FixedCount(4));
    let items = gen.generate_question_list(&pipeline).await.unwrap();
    assert_eq!(ids(&items), vec!["custom"]);
}

#[tokio::test]
async fn test_store_failure_aborts_with_source_error() {
    logging::init();
    let gen = QuestionListGenerator::new(Arc::new(BrokenStore), Config::default());
    let err = gen
        .generate_question_list(&PipelineConfig::new(SourceSpec::AllItems))
        .await
        .unwrap_err();

    match err {
        GeneratorError::Source { source_type, error } => {
            assert_eq!(source_type, stage_names::ALL_ITEMS);
            assert!(matches!(error, SourceError::Store(StoreError::Unavailable(_))));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_unregistered_source_is_config_error() {
    let gen = generator(vec![StudyItem::fill("q1")]);
    let err = gen
        .generate_question_list(&PipelineConfig::new(StageSpec::new("everything-ever")))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GeneratorError::Config(ConfigError::UnknownSourceType(ref name)) if name == "everything-ever"
    ));

    let err = gen.generate_question_list(&PipelineConfig::default()).await.unwrap_err();
    assert!(matches!(err, GeneratorError::Config(ConfigError::MissingSourceType)));
}

#[tokio::test]
async fn test_missing_source_param_is_source_error() {
    let gen = generator(vec![StudyItem::fill("q1")]);
    let pipeline = PipelineConfig::new(StageSpec::with_params(stage_names::KNOWLEDGE_BASE, json!({})));
    let err = gen.generate_question_list(&pipeline).await.unwrap_err();
    assert!(matches!(
        err,
        GeneratorError::Source {
            error: SourceError::MissingParam { param: "baseId", .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_missing_statistics_use_default_accuracy() {
    logging::init();
    let items: Vec<StudyItem> = (0..100).map(|i| StudyItem::fill(format!("q{}", i))).collect();
    let store = NoStatisticsStore(MemoryStore::new(items));
    let gen = QuestionListGenerator::new(Arc::new(store), Config::default().without_shuffle());
    let pipeline = PipelineConfig::new(SourceSpec::AllItems)
        .limiter(LimiterSpec::AdaptiveCount { base: 20, min: 10, max: 50 });

    let report = gen.generate_with_report(&pipeline).await.unwrap();
    // 默认正确率 0.5 → 20 × 1.25 = 25
    assert_eq!(report.items.len(), 25);
    assert!(matches!(report.diagnostics[..], [Diagnostic::StatisticsUnavailable { .. }]));
}

#[tokio::test]
async fn test_adaptive_count_follows_store_statistics() {
    logging::init();
    let items: Vec<StudyItem> = (0..100).map(|i| StudyItem::fill(format!("q{}", i))).collect();
    let pipeline = PipelineConfig::new(SourceSpec::AllItems)
        .limiter(LimiterSpec::AdaptiveCount { base: 20, min: 10, max: 50 });

    let mut counts = Vec::new();
    for correct in [100, 50, 0] {
        let store = MemoryStore::new(items.clone()).with_statistics(AccuracyStatistics::new(100, correct));
        let gen = QuestionListGenerator::new(Arc::new(store), Config::default().without_shuffle());
        counts.push(gen.generate_question_list(&pipeline).await.unwrap().len());
    }
    assert_eq!(counts, vec![20, 25, 30]);
}

#[tokio::test]
async fn test_toml_pipeline_runs_end_to_end() {
    let now = Utc::now();
    let gen = generator(vec![
        StudyItem::fill("r1").in_base("b1").with_tags(["rust"]).with_difficulty(2).with_next_review_at(now),
        StudyItem::fill("r2").in_base("b1").with_tags(["rust"]).with_difficulty(5).with_next_review_at(now),
        StudyItem::fill("g1").in_base("b1").with_tags(["go"]).with_difficulty(4).with_next_review_at(now),
        StudyItem::fill("r3").in_base("b2").with_tags(["rust"]).with_difficulty(3).with_next_review_at(now),
    ]);
    let pipeline = PipelineConfig::from_toml_str(
        r#"
        [source]
        type = "knowledge-base"
        params = { baseId = "b1" }

        [[filters]]
        type = "due-for-review"

        [[filters]]
        type = "by-tags"
        params = { tags = ["rust"] }

        [sorter]
        type = "by-difficulty"
        params = { order = "desc" }

        [limiter]
        type = "time-limit"
        params = { timeLimit = 2 }
        "#,
    )
    .unwrap();

    let report = gen.generate_with_report_at(&pipeline, now).await.unwrap();
    assert_eq!(ids(&report.items), vec!["r2"]);
    assert!(report.diagnostics.is_empty());
}

#[tokio::test]
async fn test_mistake_template_runs() {
    logging::init();
    let store = MemoryStore::new(vec![
        StudyItem::fill("q1").in_base("b1").with_reviews(10, 9),
        StudyItem::fill("q2").in_base("b1").with_reviews(10, 2),
        StudyItem::fill("q3").in_base("b2").with_reviews(10, 1),
    ])
    .with_mistakes(vec![
        MistakeRecord::new("m1", "q1"),
        MistakeRecord::new("m2", "q2"),
        MistakeRecord::new("m3", "q3"),
    ]);
    let gen = QuestionListGenerator::new(Arc::new(store), Config::default().without_shuffle());

    let by_base = templates::mistake_review_by_base("b1", &ReviewOptions::default());
    let items = gen.generate_question_list(&by_base).await.unwrap();
    assert_eq!(ids(&items), vec!["q2", "q1"]);

    let limited = ReviewOptions {
        limit: Some(1),
        ..Default::default()
    };
    let items = gen
        .generate_question_list(&templates::all_mistakes_review(&limited))
        .await
        .unwrap();
    assert_eq!(ids(&items), vec!["q3"]);
}

#[tokio::test]
async fn test_weakness_template_runs() {
    let gen = generator(vec![
        StudyItem::fill("strong").with_reviews(10, 9),
        StudyItem::fill("weak").with_reviews(10, 2),
        StudyItem::fill("shaky").with_reviews(4, 2),
        StudyItem::fill("new"),
        StudyItem::fill("once").with_reviews(1, 0),
    ]);
    let items = gen
        .generate_question_list(&templates::weakness_review(None, None))
        .await
        .unwrap();
    assert_eq!(ids(&items), vec!["weak", "shaky"]);
}

#[tokio::test]
async fn test_generations_run_concurrently() {
    let gen = Arc::new(generator((0..30).map(|i| StudyItem::fill(format!("q{}", i))).collect()));
    let handles: Vec<_> = (1..=4usize)
        .map(|n| {
            let gen = gen.clone();
            tokio::spawn(async move {
                let pipeline = PipelineConfig::new(SourceSpec::AllItems)
                    .sorter(SorterSpec::Random)
                    .limiter(LimiterSpec::FixedCount(n * 5));
                gen.generate_question_list(&pipeline).await.map(|items| items.len())
            })
        })
        .collect();

    let lengths: Vec<usize> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();
    assert_eq!(lengths, vec![5, 10, 15, 20]);
}

#[test]
fn test_choice_processor_self_check() {
    let gen = QuestionListGenerator::new(Arc::new(MemoryStore::default()), Config::default());
    assert!(gen.choice_processor().self_check());
}
