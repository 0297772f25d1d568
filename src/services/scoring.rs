//! 评分 - 业务能力层
//!
//! 以答案卡为标准答案，对学生卡逐题做字符串完全相等比较。
//! 两张卡的试卷代码都完整识别且不同时，判为试卷代码不符，直接记 0 分。

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::record::{AnswerRecord, AnswerToken, GradingResult, PaperRecord};

/// 评分引擎
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine {
    /// 模板配置的题目数量，用于校验答案长度
    expected_questions: usize,
}

impl ScoringEngine {
    pub fn new(expected_questions: usize) -> Self {
        Self { expected_questions }
    }

    pub fn expected_questions(&self) -> usize {
        self.expected_questions
    }

    /// 用答案卡给学生卡评分
    pub fn grade(&self, key: &PaperRecord, student: &PaperRecord) -> AppResult<GradingResult> {
        self.grade_records(key, student, true)
    }

    fn grade_records(
        &self,
        key: &PaperRecord,
        student: &PaperRecord,
        check_variant: bool,
    ) -> AppResult<GradingResult> {
        self.validate_key_length(key.answers.len())?;

        let variant_mismatch = check_variant && is_variant_mismatch(key, student);
        let total_questions = key.answers.len();

        let total_correct = if variant_mismatch {
            warn!(
                "⚠️ 试卷代码不符: 答案卡 {} / 学生卡 {} ({})，记 0 分",
                key.variant_code, student.variant_code, student.source_label
            );
            0
        } else {
            count_correct(key.answers.tokens(), &student.answers)
        };

        let score = compute_score(total_correct, total_questions);
        info!(
            "✓ {} 评分完成: {}/{} 题正确, 得分 {:.2}",
            student.source_label, total_correct, total_questions, score
        );

        Ok(GradingResult {
            total_questions,
            total_correct,
            score,
            variant_mismatch,
            student: student.clone(),
            key: key.clone(),
        })
    }

    /// 用文本答案给学生卡评分
    ///
    /// 文本答案不含试卷代码，因此不做试卷代码比较；答案文本不做规范化。
    pub fn grade_against_key(
        &self,
        key_answers: &[AnswerToken],
        key_label: &str,
        student: &PaperRecord,
    ) -> AppResult<GradingResult> {
        let key = PaperRecord::new(
            Default::default(),
            Default::default(),
            AnswerRecord::new(key_answers.to_vec()),
            key_label,
        );
        self.grade_records(&key, student, false)
    }

    fn validate_key_length(&self, actual: usize) -> AppResult<()> {
        if actual != self.expected_questions {
            return Err(AppError::answer_key_length_mismatch(
                self.expected_questions,
                actual,
            ));
        }
        Ok(())
    }
}

/// 两张卡的试卷代码都完整识别且不相同
pub fn is_variant_mismatch(key: &PaperRecord, student: &PaperRecord) -> bool {
    key.variant_code.is_fully_resolved()
        && student.variant_code.is_fully_resolved()
        && key.variant_code != student.variant_code
}

/// 逐题比较；学生卡缺少的题号按错误计
pub fn count_correct(key: &[AnswerToken], student: &AnswerRecord) -> usize {
    key.iter()
        .enumerate()
        .filter(|(question, expected)| student.get(*question) == Some(*expected))
        .count()
}

/// 10 分制得分，保留两位小数；题目数为 0 时得 0 分
pub fn compute_score(total_correct: usize, total_questions: usize) -> f64 {
    if total_questions == 0 {
        return 0.0;
    }
    let score = total_correct as f64 / total_questions as f64 * 10.0;
    (score * 100.0).round() / 100.0
}
