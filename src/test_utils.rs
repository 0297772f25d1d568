//! 单元测试共用的合成答题卡与识别器

use image::{GrayImage, Luma};

use crate::error::{AppError, AppResult, ClassifierError};
use crate::infrastructure::MarkClassifier;
use crate::models::template::TemplateLayout;
use crate::services::coordinate_mapper::BubbleRect;

/// 置信度 = 1 - 平均灰度 / 255
///
/// 测试里用气泡的灰度直接控制置信度。
#[derive(Debug, Clone, Copy)]
pub(crate) struct DarknessClassifier;

impl MarkClassifier for DarknessClassifier {
    fn input_size(&self) -> (u32, u32) {
        (28, 28)
    }

    fn confidence(&self, patch: &GrayImage) -> AppResult<f32> {
        let total = (patch.width() * patch.height()) as f64;
        let sum: f64 = patch.pixels().map(|p| p.0[0] as f64).sum();
        Ok((1.0 - sum / total / 255.0) as f32)
    }
}

/// 只要输入块里出现灰度 1 就推理失败
#[derive(Debug, Clone, Copy)]
pub(crate) struct PoisonClassifier;

pub(crate) const POISON_PIXEL: u8 = 1;

impl MarkClassifier for PoisonClassifier {
    fn input_size(&self) -> (u32, u32) {
        (28, 28)
    }

    fn confidence(&self, patch: &GrayImage) -> AppResult<f32> {
        if patch.pixels().any(|p| p.0[0] == POISON_PIXEL) {
            return Err(AppError::Classifier(ClassifierError::InferenceFailed {
                reason: "poisoned patch".to_string(),
            }));
        }
        DarknessClassifier.confidence(patch)
    }
}

/// 模板尺寸的白色答题卡
pub(crate) fn blank_sheet(layout: &TemplateLayout) -> GrayImage {
    GrayImage::from_pixel(layout.sheet_width, layout.sheet_height, Luma([255]))
}

/// 用给定灰度填满一个气泡
pub(crate) fn fill_bubble(sheet: &mut GrayImage, rect: &BubbleRect, value: u8) {
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            sheet.put_pixel(x, y, Luma([value]));
        }
    }
}
