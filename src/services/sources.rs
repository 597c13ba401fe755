//! 内置数据源策略
//!
//! 数据源是唯一允许访问知识存储的阶段

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::SourceError;
use crate::infrastructure::KnowledgeStore;
use crate::models::pipeline_config::{parse_params, stage_names, AreaParams, BaseParams, CustomListParams};
use crate::models::StudyItem;

fn require(value: Option<String>, strategy: &'static str, param: &'static str) -> Result<String, SourceError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(SourceError::MissingParam { strategy, param })
}

/// 丢弃归属不符的知识点，不完全信任存储的返回
fn retain_owned(
    items: Vec<StudyItem>,
    scope: &str,
    expected: &str,
    owner: impl Fn(&StudyItem) -> &str,
) -> Vec<StudyItem> {
    let before = items.len();
    let valid: Vec<StudyItem> = items
        .into_iter()
        .filter(|item| {
            let actual = owner(item);
            if actual != expected {
                warn!(
                    "知识点 {} 的 {} ({}) 与目标 ({}) 不匹配",
                    item.id, scope, actual, expected
                );
                return false;
            }
            true
        })
        .collect();

    if valid.len() != before {
        warn!("过滤后保留 {}/{} 个有效知识点", valid.len(), before);
    }
    valid
}

/// 把未解决的错题解析为知识点：跳过不存在的ID，同一知识点只保留一次
async fn unresolved_mistake_items(store: &dyn KnowledgeStore) -> Result<Vec<StudyItem>, SourceError> {
    let mistakes = store.get_unresolved_mistakes().await?;
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for mistake in mistakes.iter().filter(|m| !m.is_resolved) {
        if !seen.insert(mistake.item_id.as_str()) {
            continue;
        }
        match store.get_item_by_id(&mistake.item_id).await? {
            Some(item) => items.push(item),
            None => warn!("错题 {} 对应的知识点 {} 不存在", mistake.id, mistake.item_id),
        }
    }

    Ok(items)
}

pub async fn all_items(store: Arc<dyn KnowledgeStore>, _params: Value) -> Result<Vec<StudyItem>, SourceError> {
    Ok(store.get_all_items().await?)
}

pub async fn knowledge_base(store: Arc<dyn KnowledgeStore>, params: Value) -> Result<Vec<StudyItem>, SourceError> {
    let params: BaseParams = parse_params(stage_names::KNOWLEDGE_BASE, &params)?;
    let base_id = require(params.base_id, stage_names::KNOWLEDGE_BASE, "baseId")?;

    let items = store.get_items_by_knowledge_base(&base_id).await?;
    info!("知识库 {} 获取到 {} 个知识点", base_id, items.len());

    Ok(retain_owned(items, "knowledgeBaseId", &base_id, |item| {
        item.knowledge_base_id.as_str()
    }))
}

pub async fn knowledge_area(store: Arc<dyn KnowledgeStore>, params: Value) -> Result<Vec<StudyItem>, SourceError> {
    let params: AreaParams = parse_params(stage_names::KNOWLEDGE_AREA, &params)?;
    let area_id = require(params.area_id, stage_names::KNOWLEDGE_AREA, "areaId")?;

    let items = store.get_items_by_area(&area_id).await?;
    Ok(retain_owned(items, "areaId", &area_id, |item| item.area_id.as_str()))
}

pub async fn all_mistakes(store: Arc<dyn KnowledgeStore>, _params: Value) -> Result<Vec<StudyItem>, SourceError> {
    unresolved_mistake_items(store.as_ref()).await
}

pub async fn mistakes_by_base(store: Arc<dyn KnowledgeStore>, params: Value) -> Result<Vec<StudyItem>, SourceError> {
    let params: BaseParams = parse_params(stage_names::MISTAKES_BY_BASE, &params)?;
    let base_id = require(params.base_id, stage_names::MISTAKES_BY_BASE, "baseId")?;

    let items = unresolved_mistake_items(store.as_ref()).await?;
    Ok(items
        .into_iter()
        .filter(|item| item.knowledge_base_id == base_id)
        .collect())
}

pub async fn mistakes_by_area(store: Arc<dyn KnowledgeStore>, params: Value) -> Result<Vec<StudyItem>, SourceError> {
    let params: AreaParams = parse_params(stage_names::MISTAKES_BY_AREA, &params)?;
    let area_id = require(params.area_id, stage_names::MISTAKES_BY_AREA, "areaId")?;

    let items = unresolved_mistake_items(store.as_ref()).await?;
    Ok(items.into_iter().filter(|item| item.area_id == area_id).collect())
}

/// 按给定ID顺序取知识点，不存在的ID被跳过
pub async fn custom_list(store: Arc<dyn KnowledgeStore>, params: Value) -> Result<Vec<StudyItem>, SourceError> {
    let params: CustomListParams = parse_params(stage_names::CUSTOM_LIST, &params)?;
    let ids = params.item_ids.ok_or(SourceError::MissingParam {
        strategy: stage_names::CUSTOM_LIST,
        param: "itemIds",
    })?;

    let mut items = Vec::with_capacity(ids.len());
    for id in &ids {
        if let Some(item) = store.get_item_by_id(id).await? {
            items.push(item);
        }
    }
    Ok(items)
}
