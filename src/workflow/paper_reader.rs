//! 整卡解码流程 - 流程层
//!
//! 核心职责：定义"一张卡"的完整解码流程
//!
//! 流程顺序：
//! 1. 试卷代码
//! 2. 考生号（SBD）
//! 3. 全部题目答案
//!
//! 答案卡和学生卡走完全相同的流程。SBD / 试卷代码区解码失败时，
//! 该区域全部记为占位符；答题区以单题为单位，失败的题目记为 X。
//! 两种情况都输出警告，其余部分继续解码。

use image::GrayImage;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::sheet_image;
use crate::infrastructure::MarkClassifier;
use crate::models::record::{AnswerRecord, AnswerToken, DecodedField, PaperRecord};
use crate::models::template::TemplateLayout;
use crate::services::{AnswerGridReader, CoordinateMapper, DecodePolicy, GridDecoder, GridKind};
use crate::workflow::sheet_ctx::SheetCtx;

/// 整卡解码器
///
/// - 持有模板、策略和识别模型的只读句柄
/// - clone 只复制 `Arc`，可以在多个任务间共享
#[derive(Clone)]
pub struct PaperReader {
    layout: Arc<TemplateLayout>,
    policy: DecodePolicy,
    classifier: Arc<dyn MarkClassifier>,
}

impl PaperReader {
    pub fn new(
        layout: Arc<TemplateLayout>,
        policy: DecodePolicy,
        classifier: Arc<dyn MarkClassifier>,
    ) -> Self {
        Self {
            layout,
            policy,
            classifier,
        }
    }

    pub fn layout(&self) -> &TemplateLayout {
        &self.layout
    }

    pub fn policy(&self) -> &DecodePolicy {
        &self.policy
    }

    /// 读取图像文件并解码
    ///
    /// 图像无法读取或缩放时返回错误，不产生部分结果。
    pub fn read_file(&self, path: &Path, ctx: &SheetCtx) -> AppResult<PaperRecord> {
        info!("{} 📄 正在读取: {}", ctx, path.display());
        let sheet =
            sheet_image::load_normalized(path, self.layout.sheet_width, self.layout.sheet_height)?;
        Ok(self.decode(&sheet, ctx))
    }

    /// 解码一张已归一化的灰度答题卡
    pub fn decode(&self, sheet: &GrayImage, ctx: &SheetCtx) -> PaperRecord {
        let mapper = CoordinateMapper::new(&self.layout);
        let classifier = self.classifier.as_ref();
        let digits = GridDecoder::new(mapper, classifier, &self.policy);
        let answers = AnswerGridReader::new(mapper, classifier, &self.policy);

        let variant_code = self.decode_digits(&digits, sheet, GridKind::Variant, ctx);
        let identity_number = self.decode_digits(&digits, sheet, GridKind::Identity, ctx);

        let answers = self.decode_answers(&answers, sheet, ctx);

        info!(
            "{} ✓ 解码完成: 试卷代码 {}, SBD {}, 已作答 {}/{} 题",
            ctx,
            variant_code,
            identity_number,
            answers.tokens().iter().filter(|t| !t.is_blank()).count(),
            answers.len()
        );

        PaperRecord::new(variant_code, identity_number, answers, ctx.label.clone())
    }

    fn decode_answers(
        &self,
        reader: &AnswerGridReader<'_>,
        sheet: &GrayImage,
        ctx: &SheetCtx,
    ) -> AnswerRecord {
        let tokens = (0..self.layout.answers.num_questions)
            .map(|question| {
                reader.read_question(sheet, question).unwrap_or_else(|e| {
                    let field = format!("{} 第 {} 题", GridKind::Answer.label(), question + 1);
                    let e = AppError::field_decode_failed(field, e);
                    warn!("{} ⚠️ {}，该题记为 X", ctx, e);
                    AnswerToken::blank()
                })
            })
            .collect();
        AnswerRecord::new(tokens)
    }

    fn decode_digits(
        &self,
        decoder: &GridDecoder<'_>,
        sheet: &GrayImage,
        kind: GridKind,
        ctx: &SheetCtx,
    ) -> DecodedField {
        decoder.decode(sheet, kind).unwrap_or_else(|e| {
            let e = AppError::field_decode_failed(kind.label(), e);
            warn!("{} ⚠️ {}，该区域记为 X", ctx, e);
            let num_digits = match kind {
                GridKind::Variant => self.layout.variant.num_digits,
                _ => self.layout.identity.num_digits,
            };
            DecodedField::unresolved(num_digits)
        })
    }
}
