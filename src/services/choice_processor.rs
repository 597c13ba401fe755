//! 选择题选项处理 - 业务能力层
//!
//! 打乱选项显示顺序，同时保证正确答案仍然指向同一段选项文本。
//!
//! 选项的 key 只是位置标签，打乱后会被重新分配，所以正确答案先锚定到文本，
//! 打乱后再按文本反查新的 key，并校验数量一致；任何不一致都回退为原题。

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use crate::models::{ChoiceOption, ShuffleInfo, StudyItem, OPTION_KEYS};
use crate::utils::logging::truncate_text;

/// 批量打乱选项
#[derive(Debug, Clone, Copy)]
pub struct BatchShuffleOptions {
    pub enabled: bool,
    pub log_summary: bool,
}

impl Default for BatchShuffleOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            log_summary: true,
        }
    }
}

/// 单次批量打乱的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShuffleSummary {
    pub total_items: usize,
    pub choice_items: usize,
    pub shuffled_items: usize,
}

/// 打乱回退记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffleFallback {
    pub item_id: String,
    pub reason: String,
}

/// 批量打乱结果
#[derive(Debug, Clone, Default)]
pub struct BatchShuffleOutcome {
    pub items: Vec<StudyItem>,
    /// 仅在 `log_summary` 时返回
    pub summary: Option<ShuffleSummary>,
    pub fallbacks: Vec<ShuffleFallback>,
}

/// 选择题统计
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceStatistics {
    pub total_questions: usize,
    pub choice_questions: usize,
    pub shuffled_questions: usize,
    /// 百分比，0-100
    pub shuffle_rate: f64,
}

impl fmt::Display for ChoiceStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "共 {} 道题目，选择题 {} 道，已打乱 {} 道 ({:.1}%)",
            self.total_questions, self.choice_questions, self.shuffled_questions, self.shuffle_rate
        )
    }
}

/// 单题打乱的结果
enum ShuffleOutcome {
    /// 非选择题或选项不足，原样返回
    Unchanged,
    Shuffled(StudyItem),
    Fallback(String),
}

/// 选择题选项处理器
///
/// 职责：
/// - 打乱单道选择题的选项并重算正确答案
/// - 批量处理、统计、自检
/// - 不访问存储，不关心题目来源
#[derive(Debug, Clone, Default)]
pub struct ChoiceProcessor {
    verbose: bool,
}

impl ChoiceProcessor {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// 打乱选择题选项（使用线程随机源）
    ///
    /// 非选择题或选项不超过1个时原样返回；无法保证正确答案映射时返回原题
    pub fn shuffle_options(&self, item: &StudyItem) -> StudyItem {
        self.shuffle_options_with_rng(item, &mut rand::rng())
    }

    /// 使用指定随机源打乱选项
    pub fn shuffle_options_with_rng<R: Rng + ?Sized>(&self, item: &StudyItem, rng: &mut R) -> StudyItem {
        match self.try_shuffle(item, rng) {
            ShuffleOutcome::Shuffled(shuffled) => shuffled,
            ShuffleOutcome::Unchanged | ShuffleOutcome::Fallback(_) => item.clone(),
        }
    }

    fn try_shuffle<R: Rng + ?Sized>(&self, item: &StudyItem, rng: &mut R) -> ShuffleOutcome {
        if !item.is_choice() || item.options.len() <= 1 {
            return ShuffleOutcome::Unchanged;
        }
        if item.options.len() > OPTION_KEYS.len() {
            return self.fallback(
                item,
                format!("选项数量 {} 超过可用字母 {}", item.options.len(), OPTION_KEYS.len()),
            );
        }

        // 1. 正确答案锚定到文本
        let original_keys = item.correct_keys();
        if original_keys.is_empty() {
            return self.fallback(item, "正确答案为空".to_string());
        }
        let correct_texts: Vec<String> = original_keys
            .iter()
            .filter_map(|key| match item.option_text(key) {
                Some(text) => Some(text.to_string()),
                None => {
                    warn!("[选择题打乱] 找不到key为{}的选项 (题目 {})", key, item.id);
                    None
                }
            })
            .collect();

        // 2. Fisher-Yates 打乱文本
        let mut texts: Vec<&str> = item.options.iter().map(|opt| opt.text.as_str()).collect();
        texts.shuffle(rng);

        // 3. 按字母表顺序重新分配 key
        let shuffled_options: Vec<ChoiceOption> = texts
            .into_iter()
            .zip(OPTION_KEYS.iter())
            .map(|(text, key)| ChoiceOption::new(*key, text))
            .collect();

        // 4. 按文本反查新 key；每个选项只能被认领一次，重复文本会落到不同的 key 上
        let mut claimed = vec![false; shuffled_options.len()];
        let mut new_keys: Vec<String> = Vec::with_capacity(correct_texts.len());
        for text in &correct_texts {
            let found = shuffled_options
                .iter()
                .enumerate()
                .position(|(i, opt)| !claimed[i] && opt.text == *text);
            if let Some(i) = found {
                claimed[i] = true;
                new_keys.push(shuffled_options[i].key.clone());
            }
        }

        // 5. 数量校验
        if new_keys.len() != original_keys.len() {
            return self.fallback(
                item,
                format!(
                    "打乱后只找到 {}/{} 个正确答案",
                    new_keys.len(),
                    original_keys.len()
                ),
            );
        }
        new_keys.sort_by_key(|key| OPTION_KEYS.iter().position(|k| *k == key.as_str()));

        if self.verbose {
            debug!(
                "[选择题打乱] ID:{} {}→{} [{}]",
                item.id,
                original_keys.join(","),
                new_keys.join(","),
                truncate_text(&item.question, 20)
            );
        }

        // 6. 生成新题目，附加溯源信息
        let mut shuffled = item.clone();
        shuffled.options = shuffled_options;
        shuffled.correct_answer = new_keys.join(",");
        shuffled.shuffle_info = Some(ShuffleInfo {
            original_correct_keys: original_keys,
            correct_texts,
            new_correct_keys: new_keys,
            shuffled_at: Utc::now(),
        });
        ShuffleOutcome::Shuffled(shuffled)
    }

    fn fallback(&self, item: &StudyItem, reason: String) -> ShuffleOutcome {
        warn!(
            "[选择题打乱] 题目 {} 无法安全打乱，使用原始数据: {}",
            item.id, reason
        );
        ShuffleOutcome::Fallback(reason)
    }

    /// 批量打乱，非选择题原样通过
    pub fn batch_shuffle(&self, items: Vec<StudyItem>, options: &BatchShuffleOptions) -> BatchShuffleOutcome {
        self.batch_shuffle_with_rng(items, options, &mut rand::rng())
    }

    pub fn batch_shuffle_with_rng<R: Rng + ?Sized>(
        &self,
        items: Vec<StudyItem>,
        options: &BatchShuffleOptions,
        rng: &mut R,
    ) -> BatchShuffleOutcome {
        if !options.enabled {
            debug!("[选择题打乱] 功能已禁用，跳过处理");
            return BatchShuffleOutcome {
                items,
                ..Default::default()
            };
        }

        let mut summary = ShuffleSummary {
            total_items: items.len(),
            ..Default::default()
        };
        let mut fallbacks = Vec::new();

        let processed: Vec<StudyItem> = items
            .into_iter()
            .map(|item| {
                if !item.is_choice() {
                    return item;
                }
                summary.choice_items += 1;
                match self.try_shuffle(&item, rng) {
                    ShuffleOutcome::Shuffled(shuffled) => {
                        summary.shuffled_items += 1;
                        shuffled
                    }
                    ShuffleOutcome::Unchanged => item,
                    ShuffleOutcome::Fallback(reason) => {
                        fallbacks.push(ShuffleFallback {
                            item_id: item.id.clone(),
                            reason,
                        });
                        item
                    }
                }
            })
            .collect();

        if options.log_summary && summary.choice_items > 0 {
            info!(
                "[选择题打乱] 批量处理完成: {}道选择题，{}道已打乱",
                summary.choice_items, summary.shuffled_items
            );
        }

        BatchShuffleOutcome {
            items: processed,
            summary: options.log_summary.then_some(summary),
            fallbacks,
        }
    }

    /// 校验打乱结果
    ///
    /// 选项文本的多重集合一致，且正确答案指向的文本集合一致
    pub fn validate_shuffle_result(&self, original: &StudyItem, shuffled: &StudyItem) -> bool {
        if original.options.len() != shuffled.options.len() {
            return false;
        }

        let mut original_texts: Vec<&str> = original.options.iter().map(|o| o.text.as_str()).collect();
        let mut shuffled_texts: Vec<&str> = shuffled.options.iter().map(|o| o.text.as_str()).collect();
        original_texts.sort_unstable();
        shuffled_texts.sort_unstable();
        if original_texts != shuffled_texts {
            warn!("[选择题打乱] 选项文本不一致: 题目 {}", original.id);
            return false;
        }

        let original_correct = correct_texts_sorted(original);
        let shuffled_correct = correct_texts_sorted(shuffled);
        if original_correct != shuffled_correct {
            warn!(
                "[选择题打乱] 正确答案文本映射不一致: {:?} vs {:?}",
                original_correct, shuffled_correct
            );
            return false;
        }

        true
    }

    /// 按溯源信息统计一批已处理的题目
    pub fn get_statistics(&self, items: &[StudyItem]) -> ChoiceStatistics {
        let choice_questions = items.iter().filter(|q| q.is_choice()).count();
        let shuffled_questions = items
            .iter()
            .filter(|q| q.is_choice() && q.shuffle_info.is_some())
            .count();
        let shuffle_rate = if choice_questions > 0 {
            shuffled_questions as f64 / choice_questions as f64 * 100.0
        } else {
            0.0
        };

        ChoiceStatistics {
            total_questions: items.len(),
            choice_questions,
            shuffled_questions,
            shuffle_rate,
        }
    }

    /// 部署自检：打乱内置的多选样题并校验
    pub fn self_check(&self) -> bool {
        let sample = StudyItem::choice("self_check_choice", ["JavaScript", "HTML", "Python", "CSS"], "A,C")
            .with_question("以下哪些是编程语言？");
        let shuffled = self.shuffle_options(&sample);
        let passed = shuffled.shuffle_info.is_some() && self.validate_shuffle_result(&sample, &shuffled);
        if passed {
            info!("✅ 选择题打乱自检通过");
        } else {
            warn!("❌ 选择题打乱自检失败");
        }
        passed
    }
}

fn correct_texts_sorted(item: &StudyItem) -> Vec<&str> {
    let mut texts: Vec<&str> = item
        .correct_keys()
        .iter()
        .filter_map(|key| item.option_text(key))
        .collect();
    texts.sort_unstable();
    texts
}
