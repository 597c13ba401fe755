//! # Question List Generator
//!
//! 按配置从知识存储中生成复习题目列表，并在保证答案正确的前提下打乱选择题选项
//!
//! ## 架构设计
//!
//! 本库采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 外部知识存储的抽象，只暴露查询能力
//! - `KnowledgeStore` - 存储接口，唯一的异步边界
//! - `MemoryStore` - 内存快照实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个函数只处理一份序列
//! - `sources` / `filters` / `sorters` / `limiters` - 内置阶段
//! - `ChoiceProcessor` - 选择题选项打乱与校验
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次生成"的完整流程
//! - `StageRegistry` - 按名称注册阶段，可覆盖内置实现
//! - `StageCtx` - 上下文封装（时间基准 + 整体统计）
//! - `QuestionListGenerator` - 流程编排（source → filters → sorter → limiter → shuffle）
//!
//! ### ④ 配置（Models / Templates）
//! - `models/` - 题目模型与 `{type, params}` 形式的生成配置
//! - `templates` - 常用复习场景的预设配置
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod templates;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, SmartSortWeights};
pub use error::{
    ConfigError, Diagnostic, GeneratorError, GeneratorResult, SourceError, StageError, StageKind,
    StoreError,
};
pub use infrastructure::{KnowledgeStore, MemoryStore};
pub use models::{PipelineConfig, StageSpec, StudyItem};
pub use services::ChoiceProcessor;
pub use workflow::{GenerationReport, QuestionListGenerator, StageCtx, StageRegistry};
