//! 数字区解码（SBD / 试卷代码）- 业务能力层
//!
//! 逐位扫描：每一位只取一个数字。多个选项同时被判为已涂时，
//! 取置信度最高者；置信度相同时保留序号较小的选项。

use image::GrayImage;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::infrastructure::MarkClassifier;
use crate::models::record::DecodedField;
use crate::models::template::DigitGridLayout;
use crate::services::bubble_reader::{read_bubble, DecodePolicy};
use crate::services::coordinate_mapper::{CoordinateMapper, GridKind};

/// 数字区解码器
pub struct GridDecoder<'a> {
    mapper: CoordinateMapper<'a>,
    classifier: &'a dyn MarkClassifier,
    policy: &'a DecodePolicy,
}

impl<'a> GridDecoder<'a> {
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

    /// 解码一个数字区
    ///
    /// `kind` 只能是 `Identity` 或 `Variant`。
    pub fn decode(&self, sheet: &GrayImage, kind: GridKind) -> AppResult<DecodedField> {
        let grid = self.grid_for(kind)?;

        let symbols = (0..grid.num_digits)
            .map(|digit| self.decode_digit(sheet, kind, grid, digit))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(DecodedField::new(symbols))
    }

    fn grid_for(&self, kind: GridKind) -> AppResult<&'a DigitGridLayout> {
        let layout = self.mapper.layout();
        match kind {
            GridKind::Identity => Ok(&layout.identity),
            GridKind::Variant => Ok(&layout.variant),
            GridKind::Answer => Err(AppError::invalid_layout("答题区不能按数字区解码")),
        }
    }

    /// 解码一位：返回置信度最高的已涂选项对应的数字
    fn decode_digit(
        &self,
        sheet: &GrayImage,
        kind: GridKind,
        grid: &DigitGridLayout,
        digit: usize,
    ) -> AppResult<Option<char>> {
        let mut best: Option<(f32, char)> = None;

        for option in 0..grid.num_options {
            let Some(prediction) = read_bubble(
                sheet,
                &self.mapper,
                self.classifier,
                self.policy,
                kind,
                digit,
                option,
            )?
            else {
                continue;
            };

            if !prediction.marked {
                continue;
            }

            let is_better = match best {
                Some((confidence, _)) => prediction.confidence > confidence,
                None => true,
            };
            if is_better {
                let symbol = self.mapper.layout().digit_for(option).ok_or_else(|| {
                    AppError::invalid_layout(format!("数字映射表缺少第 {} 项", option))
                })?;
                best = Some((prediction.confidence, symbol));
            }
        }

        debug!(
            "{} 第 {} 位: {:?}",
            kind.label(),
            digit + 1,
            best.map(|(confidence, symbol)| (symbol, confidence))
        );

        Ok(best.map(|(_, symbol)| symbol))
    }
}
