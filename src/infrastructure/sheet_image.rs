//! 答题卡图像 - 基础设施层
//!
//! 读取图像、缩放到模板尺寸并转灰度；按矩形裁剪气泡块。
//! 不做倾斜校正，输入被假定为已经摆正的答题卡。

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use std::path::Path;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::coordinate_mapper::BubbleRect;

/// 读取图像并归一化为模板尺寸的灰度图
pub fn load_normalized(path: &Path, width: u32, height: u32) -> AppResult<GrayImage> {
    let image = image::open(path)
        .map_err(|e| AppError::image_unreadable(path.display().to_string(), e))?;
    debug!(
        "读取图像 {}: {}x{}",
        path.display(),
        image.width(),
        image.height()
    );
    normalize(&image, width, height).map_err(|reason| {
        AppError::preprocessing_failed(path.display().to_string(), reason)
    })
}

/// 缩放到 `width` x `height` 并转灰度
pub fn normalize(image: &DynamicImage, width: u32, height: u32) -> Result<GrayImage, String> {
    if image.width() == 0 || image.height() == 0 {
        return Err("图像尺寸为 0".to_string());
    }
    if width == 0 || height == 0 {
        return Err(format!("目标尺寸 {}x{} 不合法", width, height));
    }
    Ok(image
        .resize_exact(width, height, FilterType::Triangle)
        .to_luma8())
}

/// 裁剪气泡块
///
/// 矩形超出图像边界时返回 `None`，由调用方按"未涂"处理。
pub fn extract_patch(sheet: &GrayImage, rect: &BubbleRect) -> Option<GrayImage> {
    let right = rect.x.checked_add(rect.width)?;
    let bottom = rect.y.checked_add(rect.height)?;
    if right > sheet.width() || bottom > sheet.height() {
        return None;
    }
    Some(imageops::crop_imm(sheet, rect.x, rect.y, rect.width, rect.height).to_image())
}

/// 把气泡块缩放到识别模型的输入尺寸
pub fn fit_to_input(patch: &GrayImage, input_size: (u32, u32)) -> GrayImage {
    if patch.dimensions() == input_size {
        return patch.clone();
    }
    imageops::resize(patch, input_size.0, input_size.1, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_extract_patch_inside_and_outside() {
        let mut sheet = GrayImage::from_pixel(100, 80, Luma([255]));
        sheet.put_pixel(12, 22, Luma([0]));

        let rect = BubbleRect::new(10, 20, 5, 5);
        let patch = extract_patch(&sheet, &rect).unwrap();
        assert_eq!(patch.dimensions(), (5, 5));
        assert_eq!(patch.get_pixel(2, 2).0[0], 0);

        let edge = BubbleRect::new(98, 20, 5, 5);
        assert!(extract_patch(&sheet, &edge).is_none());
    }

    #[test]
    fn test_fit_to_input_keeps_uniform_value() {
        let patch = GrayImage::from_pixel(20, 20, Luma([40]));
        let fitted = fit_to_input(&patch, (28, 28));
        assert_eq!(fitted.dimensions(), (28, 28));
        assert!(fitted.pixels().all(|p| p.0[0] == 40));
    }

    #[test]
    fn test_normalize_resizes_to_template() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(400, 300, Luma([128])));
        let normalized = normalize(&image, 793, 1122).unwrap();
        assert_eq!(normalized.dimensions(), (793, 1122));
    }

    #[test]
    fn test_load_missing_image_is_unreadable() {
        let err = load_normalized(Path::new("/no/such/sheet.png"), 793, 1122).unwrap_err();
        assert!(matches!(
            err,
            AppError::Image(crate::error::ImageError::Unreadable { .. })
        ));
    }
}
