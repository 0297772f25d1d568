//! 答题卡模板（TemplateLayout）
//!
//! 描述归一化答题卡上所有气泡的静态几何信息：
//! 答题区各列起点、行/选项间距、气泡尺寸、SBD 与试卷代码区的位数和选项数，
//! 以及选项序号 → 字母 / 数字的映射表。
//!
//! 模板只在启动时加载一次，之后以 `Arc<TemplateLayout>` 只读共享。

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::{AppError, AppResult};

const DEFAULT_SHEET_WIDTH: u32 = 793;
const DEFAULT_SHEET_HEIGHT: u32 = 1122;
const DEFAULT_BUBBLE_SIZE: u32 = 20;

/// 答题区布局
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerGridLayout {
    /// 每一列第一个选项的 x 坐标
    pub column_starts_x: Vec<u32>,
    /// 第一行的 y 坐标
    pub start_y: u32,
    /// 同一题相邻选项的水平间距
    pub option_spacing_x: u32,
    /// 相邻两题的垂直间距
    pub question_spacing_y: u32,
    pub num_questions: usize,
    pub options_per_question: usize,
    pub questions_per_column: usize,
    /// 选项序号 → 字母
    pub option_letters: Vec<char>,
}

impl Default for AnswerGridLayout {
    fn default() -> Self {
        Self {
            column_starts_x: vec![138, 290, 444, 598],
            start_y: 466,
            option_spacing_x: 20,
            question_spacing_y: 38,
            num_questions: 60,
            options_per_question: 4,
            questions_per_column: 15,
            option_letters: vec!['A', 'B', 'C', 'D'],
        }
    }
}

impl AnswerGridLayout {
    /// 按题目数量推算需要的列数
    pub fn required_columns(&self) -> usize {
        if self.questions_per_column == 0 {
            return 0;
        }
        self.num_questions.div_ceil(self.questions_per_column)
    }
}

/// 数字区（SBD / 试卷代码）布局
///
/// 每一位数字占一列，列内自上而下是 `num_options` 个选项。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitGridLayout {
    pub start_x: u32,
    pub start_y: u32,
    /// 相邻两位数字的水平间距
    pub digit_spacing_x: u32,
    /// 同一位内相邻选项的垂直间距
    pub option_spacing_y: u32,
    pub num_digits: usize,
    pub num_options: usize,
}

impl DigitGridLayout {
    fn identity_default() -> Self {
        Self {
            start_x: 430,
            start_y: 150,
            digit_spacing_x: 22,
            option_spacing_y: 27,
            num_digits: 6,
            num_options: 10,
        }
    }

    fn variant_default() -> Self {
        Self {
            start_x: 640,
            start_y: 150,
            digit_spacing_x: 22,
            option_spacing_y: 27,
            num_digits: 3,
            num_options: 10,
        }
    }
}

/// TOML 中只写了部分键的数字区，缺省的键取该区自己的默认值
#[derive(Debug, Deserialize)]
struct PartialDigitGrid {
    start_x: Option<u32>,
    start_y: Option<u32>,
    digit_spacing_x: Option<u32>,
    option_spacing_y: Option<u32>,
    num_digits: Option<usize>,
    num_options: Option<usize>,
}

impl PartialDigitGrid {
    fn merge_onto(self, base: DigitGridLayout) -> DigitGridLayout {
        DigitGridLayout {
            start_x: self.start_x.unwrap_or(base.start_x),
            start_y: self.start_y.unwrap_or(base.start_y),
            digit_spacing_x: self.digit_spacing_x.unwrap_or(base.digit_spacing_x),
            option_spacing_y: self.option_spacing_y.unwrap_or(base.option_spacing_y),
            num_digits: self.num_digits.unwrap_or(base.num_digits),
            num_options: self.num_options.unwrap_or(base.num_options),
        }
    }
}

fn identity_grid<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DigitGridLayout, D::Error> {
    let partial = PartialDigitGrid::deserialize(deserializer)?;
    Ok(partial.merge_onto(DigitGridLayout::identity_default()))
}

fn variant_grid<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DigitGridLayout, D::Error> {
    let partial = PartialDigitGrid::deserialize(deserializer)?;
    Ok(partial.merge_onto(DigitGridLayout::variant_default()))
}

/// 答题卡模板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateLayout {
    /// 归一化后的答题卡宽度
    pub sheet_width: u32,
    /// 归一化后的答题卡高度
    pub sheet_height: u32,
    pub bubble_width: u32,
    pub bubble_height: u32,
    pub answers: AnswerGridLayout,
    /// 考生号（SBD）区
    #[serde(
        default = "DigitGridLayout::identity_default",
        deserialize_with = "identity_grid"
    )]
    pub identity: DigitGridLayout,
    /// 试卷代码区
    #[serde(
        default = "DigitGridLayout::variant_default",
        deserialize_with = "variant_grid"
    )]
    pub variant: DigitGridLayout,
    /// 选项序号 → 数字
    pub digit_symbols: Vec<char>,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self {
            sheet_width: DEFAULT_SHEET_WIDTH,
            sheet_height: DEFAULT_SHEET_HEIGHT,
            bubble_width: DEFAULT_BUBBLE_SIZE,
            bubble_height: DEFAULT_BUBBLE_SIZE,
            answers: AnswerGridLayout::default(),
            identity: DigitGridLayout::identity_default(),
            variant: DigitGridLayout::variant_default(),
            digit_symbols: ('0'..='9').collect(),
        }
    }
}

impl TemplateLayout {
    /// 从 TOML 文本解析模板（缺省字段取默认值）并校验
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let layout: TemplateLayout = toml::from_str(content)?;
        layout.validate()?;
        Ok(layout)
    }

    /// 选项字母
    pub fn letter_for(&self, option: usize) -> Option<char> {
        self.answers.option_letters.get(option).copied()
    }

    /// 选项数字
    pub fn digit_for(&self, option: usize) -> Option<char> {
        self.digit_symbols.get(option).copied()
    }

    /// 校验模板
    ///
    /// 列数不足只记录警告：超出的题目会落在原点 (0, 0)，行为保持不变。
    pub fn validate(&self) -> AppResult<()> {
        if self.sheet_width == 0 || self.sheet_height == 0 {
            return Err(AppError::invalid_layout("答题卡尺寸不能为 0"));
        }
        if self.bubble_width == 0 || self.bubble_height == 0 {
            return Err(AppError::invalid_layout("气泡尺寸不能为 0"));
        }

        let answers = &self.answers;
        if answers.column_starts_x.is_empty() {
            return Err(AppError::invalid_layout("答题区至少需要一列"));
        }
        if answers.questions_per_column == 0 {
            return Err(AppError::invalid_layout("每列题目数不能为 0"));
        }
        if answers.option_letters.len() < answers.options_per_question {
            return Err(AppError::invalid_layout(format!(
                "选项字母表只有 {} 项，少于每题选项数 {}",
                answers.option_letters.len(),
                answers.options_per_question
            )));
        }

        for (name, grid) in [("SBD", &self.identity), ("试卷代码", &self.variant)] {
            if self.digit_symbols.len() < grid.num_options {
                return Err(AppError::invalid_layout(format!(
                    "{} 区有 {} 个选项，但数字映射表只有 {} 项",
                    name,
                    grid.num_options,
                    self.digit_symbols.len()
                )));
            }
        }

        let required = answers.required_columns();
        if required > answers.column_starts_x.len() {
            warn!(
                "⚠️ 模板只配置了 {} 列，但 {} 题需要 {} 列，超出部分将定位到原点",
                answers.column_starts_x.len(),
                answers.num_questions,
                required
            );
        }

        Ok(())
    }
}
