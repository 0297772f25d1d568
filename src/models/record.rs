//! 解码结果与评分结果的数据结构

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 无法识别时使用的占位符
pub const SENTINEL: char = 'X';

/// 多选答案的分隔符
pub const ANSWER_DELIMITER: char = '|';

/// 数字区（SBD / 试卷代码）的解码结果
///
/// 每一位要么是识别出的数字，要么是 `None`（未涂或无法判定），显示为 `X`。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedField {
    symbols: Vec<Option<char>>,
}

impl DecodedField {
    pub fn new(symbols: Vec<Option<char>>) -> Self {
        Self { symbols }
    }

    /// 全部为占位符的字段（区域解码失败时使用）
    pub fn unresolved(len: usize) -> Self {
        Self {
            symbols: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[Option<char>] {
        &self.symbols
    }

    /// 每一位都已识别（不含占位符）
    pub fn is_fully_resolved(&self) -> bool {
        self.symbols.iter().all(Option::is_some)
    }
}

impl fmt::Display for DecodedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{}", symbol.unwrap_or(SENTINEL))?;
        }
        Ok(())
    }
}

impl From<&str> for DecodedField {
    /// `X` 视为占位符，其余字符原样保留
    fn from(text: &str) -> Self {
        Self::new(
            text.chars()
                .map(|c| if c == SENTINEL { None } else { Some(c) })
                .collect(),
        )
    }
}

impl Serialize for DecodedField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DecodedField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Ok(DecodedField::from(text.as_str()))
    }
}

/// 单题答案
///
/// 文本形式：未涂为 `X`，否则为按选项顺序以 `|` 连接的字母（如 `B|D`）。
/// 评分时按字符串完全相等比较。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerToken(String);

impl AnswerToken {
    pub fn blank() -> Self {
        Self(SENTINEL.to_string())
    }

    /// 由已涂选项的字母构造；为空时得到占位符
    pub fn from_letters(letters: &[char]) -> Self {
        if letters.is_empty() {
            return Self::blank();
        }
        let joined = letters
            .iter()
            .map(char::to_string)
            .collect::<Vec<_>>()
            .join(&ANSWER_DELIMITER.to_string());
        Self(joined)
    }

    /// 由外部文本（如手工录入的答案）构造，不做规范化
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.len() == 1 && self.0.starts_with(SENTINEL)
    }
}

impl fmt::Display for AnswerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 整张答题卡的答案（题号从 0 开始连续编号）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerRecord {
    tokens: Vec<AnswerToken>,
}

impl AnswerRecord {
    pub fn new(tokens: Vec<AnswerToken>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, question: usize) -> Option<&AnswerToken> {
        self.tokens.get(question)
    }

    pub fn tokens(&self) -> &[AnswerToken] {
        &self.tokens
    }

    /// 以题号为键的映射，用于输出报告
    pub fn to_map(&self) -> BTreeMap<usize, String> {
        self.tokens
            .iter()
            .enumerate()
            .map(|(idx, token)| (idx, token.to_string()))
            .collect()
    }
}

impl From<Vec<&str>> for AnswerRecord {
    fn from(tokens: Vec<&str>) -> Self {
        Self::new(tokens.into_iter().map(AnswerToken::from_text).collect())
    }
}

/// 一张答题卡的解码结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// 试卷代码
    pub variant_code: DecodedField,
    /// 考生号（SBD）
    pub identity_number: DecodedField,
    pub answers: AnswerRecord,
    /// 来源标识（一般为文件名）
    pub source_label: String,
}

impl PaperRecord {
    pub fn new(
        variant_code: DecodedField,
        identity_number: DecodedField,
        answers: AnswerRecord,
        source_label: impl Into<String>,
    ) -> Self {
        Self {
            variant_code,
            identity_number,
            answers,
            source_label: source_label.into(),
        }
    }
}

/// 一次评分的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradingResult {
    pub total_questions: usize,
    pub total_correct: usize,
    /// 10 分制，保留两位小数
    pub score: f64,
    pub variant_mismatch: bool,
    pub student: PaperRecord,
    pub key: PaperRecord,
}

/// 答案卡信息（报告中的 `answer_key_info`）
#[derive(Debug, Clone, Serialize)]
pub struct AnswerKeyInfo {
    pub read_from_image: String,
    pub sbd: String,
    pub test_id: String,
    pub student_answers: BTreeMap<usize, String>,
}

/// 对外输出的评分报告
#[derive(Debug, Clone, Serialize)]
pub struct GradingReport {
    pub status: String,
    pub source: String,
    pub sbd: String,
    pub test_id: String,
    pub student_answers: BTreeMap<usize, String>,
    pub answer_key_info: AnswerKeyInfo,
    pub test_id_mismatch: bool,
    pub total_questions: usize,
    pub total_correct: usize,
    pub score_10: f64,
}

impl From<&GradingResult> for GradingReport {
    fn from(result: &GradingResult) -> Self {
        Self {
            status: "success".to_string(),
            source: result.student.source_label.clone(),
            sbd: result.student.identity_number.to_string(),
            test_id: result.student.variant_code.to_string(),
            student_answers: result.student.answers.to_map(),
            answer_key_info: AnswerKeyInfo {
                read_from_image: result.key.source_label.clone(),
                sbd: result.key.identity_number.to_string(),
                test_id: result.key.variant_code.to_string(),
                student_answers: result.key.answers.to_map(),
            },
            test_id_mismatch: result.variant_mismatch,
            total_questions: result.total_questions,
            total_correct: result.total_correct,
            score_10: result.score,
        }
    }
}
