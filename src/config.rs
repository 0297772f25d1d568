use crate::services::bubble_reader::{DEFAULT_ANSWER_THRESHOLD, DEFAULT_IDENTITY_THRESHOLD};
use crate::services::DecodePolicy;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 答案卡图像
    pub key_image: String,
    /// 文本答案文件（设置后代替答案卡图像）
    pub answer_key_file: Option<String>,
    /// 学生卡图像，或存放学生卡图像的目录
    pub student_path: String,
    /// 答题卡模板（TOML），不设置则使用内置模板
    pub template_file: Option<String>,
    /// 评分报告输出文件（JSON）
    pub report_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 同时处理的答题卡数量
    pub max_concurrent_sheets: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 评分完成后删除学生卡图像
    pub remove_processed_sheets: bool,
    // --- 识别配置 ---
    pub answer_threshold: f32,
    pub identity_threshold: f32,
    pub strict_geometry: bool,
    /// 低于该灰度的像素视为涂墨
    pub ink_level: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_image: "answer_key.png".to_string(),
            answer_key_file: None,
            student_path: "sheets".to_string(),
            template_file: None,
            report_file: "grading_report.json".to_string(),
            output_log_file: "output.txt".to_string(),
            max_concurrent_sheets: 8,
            verbose_logging: false,
            remove_processed_sheets: false,
            answer_threshold: DEFAULT_ANSWER_THRESHOLD,
            identity_threshold: DEFAULT_IDENTITY_THRESHOLD,
            strict_geometry: false,
            ink_level: 128,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            key_image: std::env::var("KEY_IMAGE").unwrap_or(default.key_image),
            answer_key_file: std::env::var("ANSWER_KEY_FILE").ok().or(default.answer_key_file),
            student_path: std::env::var("STUDENT_PATH").unwrap_or(default.student_path),
            template_file: std::env::var("TEMPLATE_FILE").ok().or(default.template_file),
            report_file: std::env::var("REPORT_FILE").unwrap_or(default.report_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            max_concurrent_sheets: std::env::var("MAX_CONCURRENT_SHEETS").ok().and_then(|v| v.parse().ok()).filter(|&n: &usize| n > 0).unwrap_or(default.max_concurrent_sheets),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            remove_processed_sheets: std::env::var("REMOVE_PROCESSED_SHEETS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.remove_processed_sheets),
            answer_threshold: std::env::var("ANSWER_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.answer_threshold),
            identity_threshold: std::env::var("IDENTITY_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.identity_threshold),
            strict_geometry: std::env::var("STRICT_GEOMETRY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.strict_geometry),
            ink_level: std::env::var("INK_LEVEL").ok().and_then(|v| v.parse().ok()).unwrap_or(default.ink_level),
        }
    }

    /// 解码策略
    pub fn decode_policy(&self) -> DecodePolicy {
        DecodePolicy {
            answer_threshold: self.answer_threshold,
            identity_threshold: self.identity_threshold,
            strict_geometry: self.strict_geometry,
        }
    }
}
