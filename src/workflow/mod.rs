pub mod question_list_flow;
pub mod registry;
pub mod stage_ctx;

pub use question_list_flow::{GenerationReport, QuestionListGenerator};
pub use registry::{SourceFn, StageFn, StageRegistry};
pub use stage_ctx::StageCtx;
