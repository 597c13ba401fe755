use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 选项固定字母表，打乱后按顺序重新分配
pub const OPTION_KEYS: [&str; 10] = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"];

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// 填空/问答题
    Fill,
    /// 选择题
    Choice,
}

impl Default for ItemKind {
    fn default() -> Self {
        Self::Fill
    }
}

/// 选择题单选/多选
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceArity {
    Single,
    Multiple,
}

/// 选择题选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub key: String,
    pub text: String,
}

impl ChoiceOption {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// 生成流程附加的元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineMeta {
    /// 在本次列表中的位置（从0开始）
    pub sequence_index: usize,
    pub generated_at: DateTime<Utc>,
    /// 数据源类型名
    pub source_type: String,
    pub total_count: usize,
}

/// 打乱溯源信息
///
/// 只做附加，不替换题目本身的可见字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShuffleInfo {
    pub original_correct_keys: Vec<String>,
    pub correct_texts: Vec<String>,
    pub new_correct_keys: Vec<String>,
    pub shuffled_at: DateTime<Utc>,
}

/// 知识点（学习题目）
///
/// 复习统计字段由外部存储维护，本 crate 只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyItem {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub knowledge_base_id: String,
    #[serde(default)]
    pub area_id: String,

    // --- 选择题字段 ---
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
    /// 逗号分隔的正确选项，如 "A,C"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_arity: Option<ChoiceArity>,

    // --- 不可见的附加信息 ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PipelineMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle_info: Option<ShuffleInfo>,
}

fn default_difficulty() -> u8 {
    3
}

impl StudyItem {
    /// 创建填空题
    pub fn fill(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Fill,
            question: String::new(),
            answer: String::new(),
            tags: Vec::new(),
            category: String::new(),
            difficulty: default_difficulty(),
            review_count: 0,
            correct_count: 0,
            next_review_at: None,
            created_at: None,
            knowledge_base_id: String::new(),
            area_id: String::new(),
            options: Vec::new(),
            correct_answer: String::new(),
            choice_arity: None,
            meta: None,
            shuffle_info: None,
        }
    }

    /// 创建选择题
    ///
    /// `options` 按字母表顺序分配 key，`correct_answer` 形如 "A,C"
    pub fn choice<S: Into<String>>(
        id: impl Into<String>,
        options: impl IntoIterator<Item = S>,
        correct_answer: impl Into<String>,
    ) -> Self {
        let options: Vec<ChoiceOption> = options
            .into_iter()
            .zip(OPTION_KEYS.iter())
            .map(|(text, key)| ChoiceOption::new(*key, text))
            .collect();
        let mut item = Self::fill(id);
        item.kind = ItemKind::Choice;
        item.options = options;
        item.correct_answer = correct_answer.into();
        item.choice_arity = Some(if item.correct_keys().len() > 1 {
            ChoiceArity::Multiple
        } else {
            ChoiceArity::Single
        });
        item
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = question.into();
        self
    }

    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_reviews(mut self, review_count: u32, correct_count: u32) -> Self {
        self.review_count = review_count;
        self.correct_count = correct_count.min(review_count);
        self
    }

    pub fn with_next_review_at(mut self, at: DateTime<Utc>) -> Self {
        self.next_review_at = Some(at);
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn in_base(mut self, knowledge_base_id: impl Into<String>) -> Self {
        self.knowledge_base_id = knowledge_base_id.into();
        self
    }

    pub fn in_area(mut self, area_id: impl Into<String>) -> Self {
        self.area_id = area_id.into();
        self
    }

    pub fn is_choice(&self) -> bool {
        self.kind == ItemKind::Choice
    }

    /// 解析正确答案中的 key 列表
    pub fn correct_keys(&self) -> Vec<String> {
        self.correct_answer
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// 按 key 查找选项文本
    pub fn option_text(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|opt| opt.key == key)
            .map(|opt| opt.text.as_str())
    }

    /// 正确率，未复习过视为 0
    pub fn accuracy(&self) -> f64 {
        if self.review_count > 0 {
            f64::from(self.correct_count) / f64::from(self.review_count)
        } else {
            0.0
        }
    }

    /// 是否到期（无下次复习时间的视为未到期）
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at.map_or(false, |at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_builder_assigns_alphabet_keys() {
        let item = StudyItem::choice("q1", ["X", "Y", "Z"], "A, C");
        let keys: Vec<&str> = item.options.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
        assert_eq!(item.correct_keys(), vec!["A", "C"]);
        assert_eq!(item.choice_arity, Some(ChoiceArity::Multiple));
        assert_eq!(item.option_text("C"), Some("Z"));
    }

    #[test]
    fn test_accuracy_without_reviews_is_zero() {
        let item = StudyItem::fill("q1");
        assert_eq!(item.accuracy(), 0.0);
        let item = item.with_reviews(4, 3);
        assert!((item.accuracy() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let item: StudyItem = serde_json::from_value(serde_json::json!({
            "id": "k1",
            "type": "choice",
            "options": [{"key": "A", "text": "是"}, {"key": "B", "text": "否"}],
            "correctAnswer": "B",
            "knowledgeBaseId": "base-1"
        }))
        .unwrap();
        assert_eq!(item.kind, ItemKind::Choice);
        assert_eq!(item.difficulty, 3);
        assert_eq!(item.knowledge_base_id, "base-1");
        assert!(item.meta.is_none());
    }
}
