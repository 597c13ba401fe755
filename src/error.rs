//! 错误类型
//!
//! 致命错误（配置、数据源）通过 `GeneratorError` 返回给调用方；
//! 阶段解析失败、打乱回退等非致命情况记录为 `Diagnostic`，不改变调用结果。

use std::fmt;

use thiserror::Error;

/// 题目列表生成错误（致命）
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// 配置错误，在访问存储之前就会返回
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 数据源策略执行失败
    #[error("数据源 {source_type} 获取失败: {error}")]
    Source {
        source_type: String,
        #[source]
        error: SourceError,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("必须指定数据源类型")]
    MissingSourceType,

    #[error("未找到数据源策略: {0}")]
    UnknownSourceType(String),

    #[error("TOML解析失败: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 数据源策略错误
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("存储访问失败: {0}")]
    Store(#[from] StoreError),

    #[error("{strategy} 策略需要 {param} 参数")]
    MissingParam {
        strategy: &'static str,
        param: &'static str,
    },

    #[error("{strategy} 策略参数无效: {reason}")]
    InvalidParams { strategy: String, reason: String },
}

/// 外部知识存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("存储不可用: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// 过滤器/排序器/限制器执行错误（非致命，阶段会被跳过）
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    #[error("阶段 {stage} 参数无效: {reason}")]
    InvalidParams { stage: String, reason: String },
}

impl From<StageError> for SourceError {
    fn from(err: StageError) -> Self {
        match err {
            StageError::InvalidParams { stage, reason } => SourceError::InvalidParams {
                strategy: stage,
                reason,
            },
        }
    }
}

/// 阶段类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Source,
    Filter,
    Sorter,
    Limiter,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::Source => "数据源",
            StageKind::Filter => "过滤器",
            StageKind::Sorter => "排序器",
            StageKind::Limiter => "限制器",
        };
        write!(f, "{}", name)
    }
}

/// 非致命诊断信息
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// 未注册的阶段名称，该阶段被跳过
    UnknownStage { stage: StageKind, name: String },
    /// 阶段执行失败（通常是参数无效），该阶段被跳过
    StageFailed {
        stage: StageKind,
        name: String,
        reason: String,
    },
    /// 阶段输出违反约定（过滤/限制后变长，排序改变数量），输出被丢弃
    StageContractViolation {
        stage: StageKind,
        name: String,
        before: usize,
        after: usize,
    },
    /// 单题打乱无法保证正确答案映射，已回退为原题
    ShuffleFallback { item_id: String, reason: String },
    /// 整体统计获取失败，自适应限制器使用默认正确率
    StatisticsUnavailable { reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownStage { stage, name } => {
                write!(f, "未找到{}: {}", stage, name)
            }
            Diagnostic::StageFailed {
                stage,
                name,
                reason,
            } => write!(f, "{} {} 执行失败: {}", stage, name, reason),
            Diagnostic::StageContractViolation {
                stage,
                name,
                before,
                after,
            } => write!(
                f,
                "{} {} 输出数量异常 ({} → {})，已忽略该阶段",
                stage, name, before, after
            ),
            Diagnostic::ShuffleFallback { item_id, reason } => {
                write!(f, "题目 {} 打乱失败，使用原始数据: {}", item_id, reason)
            }
            Diagnostic::StatisticsUnavailable { reason } => {
                write!(f, "无法获取整体统计: {}", reason)
            }
        }
    }
}

/// 生成结果类型
pub type GeneratorResult<T> = Result<T, GeneratorError>;
