//! 评分入口 - 编排层
//!
//! 一次评分 = 解码答案卡 + 解码学生卡 + 评分。
//! 两张卡互不依赖，按文件评分时并发解码。

use anyhow::{Context, Result};
use image::GrayImage;
use std::path::PathBuf;

use crate::error::AppResult;
use crate::models::record::{GradingResult, PaperRecord};
use crate::services::ScoringEngine;
use crate::workflow::{PaperReader, SheetCtx};

/// 对两张已归一化的答题卡评分
pub fn grade_sheets(
    reader: &PaperReader,
    engine: &ScoringEngine,
    key_sheet: &GrayImage,
    key_ctx: &SheetCtx,
    student_sheet: &GrayImage,
    student_ctx: &SheetCtx,
) -> AppResult<GradingResult> {
    let key = reader.decode(key_sheet, key_ctx);
    let student = reader.decode(student_sheet, student_ctx);
    engine.grade(&key, &student)
}

/// 在阻塞线程池中读取并解码一张答题卡
pub async fn read_sheet(reader: &PaperReader, path: PathBuf, ctx: SheetCtx) -> Result<PaperRecord> {
    let reader = reader.clone();
    let record = tokio::task::spawn_blocking(move || reader.read_file(&path, &ctx))
        .await
        .context("解码任务异常退出")??;
    Ok(record)
}

/// 对两个图像文件评分
pub async fn grade_files(
    reader: &PaperReader,
    engine: &ScoringEngine,
    key_path: PathBuf,
    student_path: PathBuf,
) -> Result<GradingResult> {
    let key_ctx = SheetCtx::key(file_label(&key_path));
    let student_ctx = SheetCtx::student(file_label(&student_path), 1);

    let (key, student) = tokio::try_join!(
        read_sheet(reader, key_path, key_ctx),
        read_sheet(reader, student_path, student_ctx),
    )
    .context("无法读取答题卡")?;

    Ok(engine.grade(&key, &student)?)
}

/// 文件名作为来源标识
pub fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::template::TemplateLayout;
    use crate::services::{CoordinateMapper, DecodePolicy};
    use crate::test_utils::{blank_sheet, fill_bubble, DarknessClassifier};
    use std::sync::Arc;

    fn reader() -> PaperReader {
        PaperReader::new(
            Arc::new(TemplateLayout::default()),
            DecodePolicy::default(),
            Arc::new(DarknessClassifier),
        )
    }

    fn sheet_with(layout: &TemplateLayout, variant: [usize; 3], answers: &[(usize, usize)]) -> GrayImage {
        let mut sheet = blank_sheet(layout);
        let mapper = CoordinateMapper::new(layout);
        for (digit, option) in variant.into_iter().enumerate() {
            fill_bubble(&mut sheet, &mapper.variant_rect(digit, option), 0);
        }
        for &(question, option) in answers {
            fill_bubble(&mut sheet, &mapper.answer_rect(question, option), 0);
        }
        sheet
    }

    #[test]
    fn test_grade_matching_variant() {
        let reader = reader();
        let engine = ScoringEngine::new(60);
        let layout = reader.layout().clone();
        let key = sheet_with(&layout, [1, 0, 1], &[(0, 0), (1, 1), (1, 2), (2, 3)]);
        let student = sheet_with(&layout, [1, 0, 1], &[(0, 0), (1, 1), (2, 2)]);

        let result = grade_sheets(
            &reader,
            &engine,
            &key,
            &SheetCtx::key("key"),
            &student,
            &SheetCtx::student("student", 1),
        )
        .unwrap();

        assert!(!result.variant_mismatch);
        assert_eq!(result.total_questions, 60);
        // 第 1 题正确，第 2、3 题错误，其余 57 题两边都是 X
        assert_eq!(result.total_correct, 58);
        assert_eq!(result.score, 9.67);
    }

    #[test]
    fn test_grade_mismatched_variant() {
        let reader = reader();
        let engine = ScoringEngine::new(60);
        let layout = reader.layout().clone();
        let key = sheet_with(&layout, [2, 0, 2], &[(0, 0)]);
        let student = sheet_with(&layout, [2, 0, 5], &[(0, 0)]);

        let result = grade_sheets(
            &reader,
            &engine,
            &key,
            &SheetCtx::key("key"),
            &student,
            &SheetCtx::student("student", 1),
        )
        .unwrap();

        assert!(result.variant_mismatch);
        assert_eq!(result.total_correct, 0);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.student.variant_code.to_string(), "205");
        assert_eq!(result.key.variant_code.to_string(), "202");
    }

    #[tokio::test]
    async fn test_grade_files_reports_unreadable_image() {
        let reader = reader();
        let engine = ScoringEngine::new(60);
        let result = grade_files(
            &reader,
            &engine,
            PathBuf::from("/no/such/key.png"),
            PathBuf::from("/no/such/student.png"),
        )
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_file_label() {
        assert_eq!(file_label(std::path::Path::new("/a/b/sheet_01.png")), "sheet_01.png");
    }
}
