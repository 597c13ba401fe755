pub mod choice_processor;
pub mod filters;
pub mod limiters;
pub mod sorters;
pub mod sources;

pub use choice_processor::{
    BatchShuffleOptions, BatchShuffleOutcome, ChoiceProcessor, ChoiceStatistics, ShuffleFallback,
    ShuffleSummary,
};
