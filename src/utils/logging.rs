/// 日志工具模块
///
/// 提供日志初始化和生成流程的输出辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::PipelineConfig;

/// 初始化 tracing 日志
///
/// 默认级别 info，可通过 `RUST_LOG` 覆盖；重复调用是安全的
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录生成开始
pub fn log_generation_start(config: &PipelineConfig) {
    let filters: Vec<&str> = config.filters.iter().map(|f| f.kind.as_str()).collect();
    info!("{}", "=".repeat(60));
    info!("🚀 开始生成题目列表 - 数据源: {}", config.source.kind);
    info!(
        "📋 过滤器: {:?} | 排序器: {} | 限制器: {}",
        filters,
        config.sorter.as_ref().map_or("无", |s| s.kind.as_str()),
        config.limiter.as_ref().map_or("无", |l| l.kind.as_str())
    );
}

/// 记录单个阶段前后的数量
pub fn log_stage_result(stage: impl std::fmt::Display, name: &str, before: usize, after: usize) {
    info!("  {} {}: {} → {}", stage, name, before, after);
}

/// 记录生成完成
///
/// # 参数
/// - `total`: 最终题目数量
/// - `warnings`: 非致命诊断数量
pub fn log_generation_complete(total: usize, warnings: usize) {
    info!("{}", "─".repeat(60));
    info!("✅ 生成题目列表完成: {} 道题目", total);
    if warnings > 0 {
        info!("⚠️ 诊断信息: {} 条", warnings);
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
