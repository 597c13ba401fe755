pub mod loaders;
pub mod pipeline_config;
pub mod review;
pub mod study_item;

pub use loaders::{load_all_pipeline_configs, load_pipeline_config};
pub use pipeline_config::{
    stage_names, FilterSpec, LimiterSpec, PipelineConfig, SortOrder, SorterSpec, SourceSpec,
    StageSpec, TagMatchMode,
};
pub use review::{AccuracyStatistics, MistakeRecord};
pub use study_item::{
    ChoiceArity, ChoiceOption, ItemKind, PipelineMeta, ShuffleInfo, StudyItem, OPTION_KEYS,
};
