/// 智能排序权重（策略参数，不是正确性约定）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmartSortWeights {
    /// 每逾期一天减少的分数
    pub overdue_per_day: f64,
    /// 正确率的权重，正确率越低越靠前
    pub accuracy: f64,
    /// 难度的权重
    pub difficulty: f64,
}

impl Default for SmartSortWeights {
    fn default() -> Self {
        Self {
            overdue_per_day: 1.0,
            accuracy: 10.0,
            difficulty: 1.0,
        }
    }
}

/// 生成器配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 是否打乱选择题选项
    pub shuffle_enabled: bool,
    /// 打乱后是否输出汇总日志
    pub shuffle_log_summary: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// time-budget 限制器预估的每题用时（秒）
    pub seconds_per_item: u32,
    /// 无复习记录时 adaptive-count 使用的正确率
    pub default_accuracy: f64,
    pub smart_weights: SmartSortWeights,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shuffle_enabled: true,
            shuffle_log_summary: true,
            verbose_logging: false,
            seconds_per_item: 120,
            default_accuracy: 0.5,
            smart_weights: SmartSortWeights::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            shuffle_enabled: env_or("SHUFFLE_ENABLED", default.shuffle_enabled),
            shuffle_log_summary: env_or("SHUFFLE_LOG_SUMMARY", default.shuffle_log_summary),
            verbose_logging: env_or("VERBOSE_LOGGING", default.verbose_logging),
            seconds_per_item: env_or("SECONDS_PER_ITEM", default.seconds_per_item).max(1),
            default_accuracy: env_or("DEFAULT_ACCURACY", default.default_accuracy).clamp(0.0, 1.0),
            smart_weights: SmartSortWeights {
                overdue_per_day: env_or("SMART_WEIGHT_OVERDUE", default.smart_weights.overdue_per_day),
                accuracy: env_or("SMART_WEIGHT_ACCURACY", default.smart_weights.accuracy),
                difficulty: env_or("SMART_WEIGHT_DIFFICULTY", default.smart_weights.difficulty),
            },
        }
    }

    /// 关闭选项打乱（用于需要稳定输出的场景）
    pub fn without_shuffle(mut self) -> Self {
        self.shuffle_enabled = false;
        self
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
