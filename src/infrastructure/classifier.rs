//! 气泡识别模型 - 基础设施层
//!
//! 进程启动时构造一次，之后以 `Arc<dyn MarkClassifier>` 只读共享给所有解码调用。

use image::GrayImage;

use crate::error::{AppError, AppResult, ClassifierError};

/// 单个气泡的识别结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkPrediction {
    /// 是否判定为已涂
    pub marked: bool,
    /// 已涂的置信度，范围 [0, 1]
    pub confidence: f32,
}

/// 气泡识别能力
///
/// 职责：
/// - 输入固定尺寸的灰度块，输出"已涂"置信度
/// - 推理过程只读，可并发调用
/// - 不认识题号 / SBD / 试卷代码
///
/// 阈值在调用处决定（答题区与数字区不同），实现方只负责给出置信度。
pub trait MarkClassifier: Send + Sync {
    /// 模型期望的输入尺寸（宽, 高）
    fn input_size(&self) -> (u32, u32);

    /// 计算"已涂"置信度
    fn confidence(&self, patch: &GrayImage) -> AppResult<f32>;

    /// 按阈值给出判定：置信度严格大于阈值才算已涂
    fn classify(&self, patch: &GrayImage, threshold: f32) -> AppResult<MarkPrediction> {
        let expected = self.input_size();
        if patch.dimensions() != expected {
            return Err(AppError::Classifier(ClassifierError::InputShape {
                expected,
                actual: patch.dimensions(),
            }));
        }

        let confidence = self.confidence(patch)?;
        Ok(MarkPrediction {
            marked: confidence > threshold,
            confidence,
        })
    }
}

const DEFAULT_INPUT_SIZE: u32 = 28;
const DEFAULT_INK_LEVEL: u8 = 128;

/// 基于涂墨覆盖率的识别器
///
/// 置信度 = 灰度低于 `ink_level` 的像素占比。结果只取决于输入像素，
/// 相同输入永远得到相同输出。
#[derive(Debug, Clone)]
pub struct FillRatioClassifier {
    input_size: (u32, u32),
    ink_level: u8,
}

impl FillRatioClassifier {
    /// 创建识别器，参数不合法时返回 `ClassifierUnavailable`
    pub fn new(input_size: (u32, u32), ink_level: u8) -> AppResult<Self> {
        if input_size.0 == 0 || input_size.1 == 0 {
            return Err(AppError::classifier_unavailable(format!(
                "输入尺寸 {:?} 不合法",
                input_size
            )));
        }
        if ink_level == 0 {
            return Err(AppError::classifier_unavailable(
                "ink_level 为 0 时任何像素都不会被视为涂墨",
            ));
        }
        Ok(Self {
            input_size,
            ink_level,
        })
    }

    /// 使用给定的涂墨灰度阈值与默认输入尺寸 (28x28)
    pub fn with_ink_level(ink_level: u8) -> AppResult<Self> {
        Self::new((DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE), ink_level)
    }

    pub fn ink_level(&self) -> u8 {
        self.ink_level
    }
}

impl Default for FillRatioClassifier {
    fn default() -> Self {
        Self {
            input_size: (DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE),
            ink_level: DEFAULT_INK_LEVEL,
        }
    }
}

impl MarkClassifier for FillRatioClassifier {
    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    fn confidence(&self, patch: &GrayImage) -> AppResult<f32> {
        let total = patch.width() as usize * patch.height() as usize;
        if total == 0 {
            return Err(AppError::Classifier(ClassifierError::InferenceFailed {
                reason: "输入块为空".to_string(),
            }));
        }

        let inked = patch.pixels().filter(|p| p.0[0] < self.ink_level).count();
        Ok(inked as f32 / total as f32)
    }
}
