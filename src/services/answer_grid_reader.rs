//! 答题区解码 - 业务能力层
//!
//! 每题收集所有被判为已涂的选项，按选项顺序以 `|` 连接。
//! 多选是合法状态，这里不做置信度仲裁。

use image::GrayImage;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::infrastructure::MarkClassifier;
use crate::models::record::{AnswerRecord, AnswerToken};
use crate::services::bubble_reader::{read_bubble, DecodePolicy};
use crate::services::coordinate_mapper::{CoordinateMapper, GridKind};

/// 答题区解码器
pub struct AnswerGridReader<'a> {
    mapper: CoordinateMapper<'a>,
    classifier: &'a dyn MarkClassifier,
    policy: &'a DecodePolicy,
}

impl<'a> AnswerGridReader<'a> {
    pub fn new(
        mapper: CoordinateMapper<'a>,
        classifier: &'a dyn MarkClassifier,
        policy: &'a DecodePolicy,
    ) -> Self {
        Self {
            mapper,
            classifier,
            policy,
        }
    }

    /// 解码全部题目
    pub fn read_all(&self, sheet: &GrayImage) -> AppResult<AnswerRecord> {
        let num_questions = self.mapper.layout().answers.num_questions;
        let tokens = (0..num_questions)
            .map(|question| self.read_question(sheet, question))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(AnswerRecord::new(tokens))
    }

    /// 解码单题
    pub fn read_question(&self, sheet: &GrayImage, question: usize) -> AppResult<AnswerToken> {
        let layout = self.mapper.layout();
        let mut letters = Vec::new();

        for option in 0..layout.answers.options_per_question {
            let Some(prediction) = read_bubble(
                sheet,
                &self.mapper,
                self.classifier,
                self.policy,
                GridKind::Answer,
                question,
                option,
            )?
            else {
                continue;
            };

            if prediction.marked {
                let letter = layout.letter_for(option).ok_or_else(|| {
                    AppError::invalid_layout(format!("选项字母表缺少第 {} 项", option))
                })?;
                letters.push(letter);
            }
        }

        let token = AnswerToken::from_letters(&letters);
        debug!("第 {} 题: {}", question + 1, token);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::template::TemplateLayout;
    use crate::test_utils::{blank_sheet, fill_bubble, DarknessClassifier};

    fn reader_parts() -> (TemplateLayout, DarknessClassifier, DecodePolicy) {
        (
            TemplateLayout::default(),
            DarknessClassifier,
            DecodePolicy::default(),
        )
    }

    #[test]
    fn test_blank_question_is_sentinel() {
        let (layout, classifier, policy) = reader_parts();
        let sheet = blank_sheet(&layout);
        let reader = AnswerGridReader::new(CoordinateMapper::new(&layout), &classifier, &policy);

        let token = reader.read_question(&sheet, 0).unwrap();
        assert!(token.is_blank());
        assert_eq!(token.as_str(), "X");
    }

    #[test]
    fn test_multi_select_is_joined_in_option_order() {
        let (layout, classifier, policy) = reader_parts();
        let mut sheet = blank_sheet(&layout);
        let mapper = CoordinateMapper::new(&layout);
        // 先画 D 再画 B，结果仍按选项顺序
        fill_bubble(&mut sheet, &mapper.answer_rect(7, 3), 0);
        fill_bubble(&mut sheet, &mapper.answer_rect(7, 1), 30);

        let reader = AnswerGridReader::new(mapper, &classifier, &policy);
        for _ in 0..3 {
            assert_eq!(reader.read_question(&sheet, 7).unwrap().as_str(), "B|D");
        }
    }

    #[test]
    fn test_answer_threshold_applies() {
        let (layout, classifier, policy) = reader_parts();
        let mut sheet = blank_sheet(&layout);
        let mapper = CoordinateMapper::new(&layout);
        // 置信度 0.4：在数字区会被判为已涂，在答题区不会
        fill_bubble(&mut sheet, &mapper.answer_rect(2, 0), 153);
        fill_bubble(&mut sheet, &mapper.answer_rect(2, 2), 0);

        let reader = AnswerGridReader::new(mapper, &classifier, &policy);
        assert_eq!(reader.read_question(&sheet, 2).unwrap().as_str(), "C");
    }

    #[test]
    fn test_read_all_covers_every_column() {
        let (layout, classifier, policy) = reader_parts();
        let mut sheet = blank_sheet(&layout);
        let mapper = CoordinateMapper::new(&layout);
        fill_bubble(&mut sheet, &mapper.answer_rect(0, 0), 0);
        fill_bubble(&mut sheet, &mapper.answer_rect(20, 1), 0);
        fill_bubble(&mut sheet, &mapper.answer_rect(44, 2), 0);
        fill_bubble(&mut sheet, &mapper.answer_rect(59, 3), 0);

        let reader = AnswerGridReader::new(mapper, &classifier, &policy);
        let record = reader.read_all(&sheet).unwrap();
        assert_eq!(record.len(), 60);
        assert_eq!(record.get(0).unwrap().as_str(), "A");
        assert_eq!(record.get(20).unwrap().as_str(), "B");
        assert_eq!(record.get(44).unwrap().as_str(), "C");
        assert_eq!(record.get(59).unwrap().as_str(), "D");
        assert_eq!(
            record.tokens().iter().filter(|t| t.is_blank()).count(),
            56
        );
    }
}
