//! 单个气泡的读取：定位 → 裁剪 → 缩放 → 识别
//!
//! 答题区与数字区共用，区别只在阈值。

use image::GrayImage;
use tracing::trace;

use crate::error::{AppError, AppResult, ConfigError, DecodeError};
use crate::infrastructure::sheet_image::{extract_patch, fit_to_input};
use crate::infrastructure::{MarkClassifier, MarkPrediction};
use crate::services::coordinate_mapper::{CoordinateMapper, GridKind};

/// 答题区默认阈值
pub const DEFAULT_ANSWER_THRESHOLD: f32 = 0.5;
/// SBD / 试卷代码区默认阈值（更偏向灵敏，冲突交给置信度仲裁）
pub const DEFAULT_IDENTITY_THRESHOLD: f32 = 0.3;

/// 解码策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodePolicy {
    pub answer_threshold: f32,
    pub identity_threshold: f32,
    /// 为 true 时气泡越界视为区域解码失败；默认按未涂跳过
    pub strict_geometry: bool,
}

impl Default for DecodePolicy {
    fn default() -> Self {
        Self {
            answer_threshold: DEFAULT_ANSWER_THRESHOLD,
            identity_threshold: DEFAULT_IDENTITY_THRESHOLD,
            strict_geometry: false,
        }
    }
}

impl DecodePolicy {
    pub fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("answer_threshold", self.answer_threshold),
            ("identity_threshold", self.identity_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::Config(ConfigError::InvalidThreshold {
                    name: name.to_string(),
                    value,
                }));
            }
        }
        Ok(())
    }

    /// 某个区域使用的阈值
    pub fn threshold_for(&self, kind: GridKind) -> f32 {
        match kind {
            GridKind::Answer => self.answer_threshold,
            GridKind::Identity | GridKind::Variant => self.identity_threshold,
        }
    }
}

/// 读取一个气泡
///
/// 返回 `Ok(None)` 表示气泡超出图像边界，按未涂处理。
pub fn read_bubble(
    sheet: &GrayImage,
    mapper: &CoordinateMapper<'_>,
    classifier: &dyn MarkClassifier,
    policy: &DecodePolicy,
    kind: GridKind,
    position: usize,
    option: usize,
) -> AppResult<Option<MarkPrediction>> {
    let rect = mapper.rect_for(kind, position, option);

    let Some(patch) = extract_patch(sheet, &rect) else {
        if policy.strict_geometry {
            return Err(AppError::Decode(DecodeError::GeometryMismatch {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
            }));
        }
        trace!(
            "{} {}-{} 气泡越界，按未涂处理: {:?}",
            kind.label(),
            position,
            option,
            rect
        );
        return Ok(None);
    };

    let input = fit_to_input(&patch, classifier.input_size());
    let prediction = classifier.classify(&input, policy.threshold_for(kind))?;
    Ok(Some(prediction))
}
