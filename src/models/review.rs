use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 错题记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MistakeRecord {
    #[serde(default)]
    pub id: String,
    /// 对应的知识点ID
    pub item_id: String,
    #[serde(default)]
    pub is_resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl MistakeRecord {
    pub fn new(id: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item_id: item_id.into(),
            is_resolved: false,
            created_at: None,
        }
    }

    pub fn resolved(mut self) -> Self {
        self.is_resolved = true;
        self
    }
}

/// 用户整体答题统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyStatistics {
    pub total_reviews: u64,
    pub correct_answers: u64,
}

impl AccuracyStatistics {
    pub fn new(total_reviews: u64, correct_answers: u64) -> Self {
        Self {
            total_reviews,
            correct_answers: correct_answers.min(total_reviews),
        }
    }

    /// 整体正确率，无复习记录时返回 None
    pub fn accuracy(&self) -> Option<f64> {
        if self.total_reviews > 0 {
            Some(self.correct_answers as f64 / self.total_reviews as f64)
        } else {
            None
        }
    }
}
