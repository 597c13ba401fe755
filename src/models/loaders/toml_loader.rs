use crate::models::pipeline_config::PipelineConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载题目列表生成配置
pub async fn load_pipeline_config(toml_file_path: &Path) -> Result<PipelineConfig> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let config = PipelineConfig::from_toml_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    Ok(config)
}

/// 加载文件夹中所有 TOML 配置，返回 (文件名, 配置) 列表
///
/// 单个文件解析失败只记录警告，不影响其余文件
pub async fn load_all_pipeline_configs(folder_path: &str) -> Result<Vec<(String, PipelineConfig)>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut configs = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("toml") {
            continue;
        }

        let name = path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        tracing::info!("正在加载配置: {}", name);

        match load_pipeline_config(&path).await {
            Ok(config) => configs.push((name, config)),
            Err(e) => {
                tracing::warn!("加载配置失败 {}: {:#}", path.display(), e);
            }
        }
    }

    configs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(configs)
}
