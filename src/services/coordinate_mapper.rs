//! 坐标映射 - 业务能力层
//!
//! 把逻辑地址（哪个区域、第几题/第几位、第几个选项）换算成像素矩形。
//! 所有函数都是纯函数：相同的模板和参数永远得到相同的矩形。

use serde::Serialize;

use crate::models::template::{DigitGridLayout, TemplateLayout};

/// 气泡所在的区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GridKind {
    /// 答题区
    Answer,
    /// 考生号（SBD）区
    Identity,
    /// 试卷代码区
    Variant,
}

impl GridKind {
    /// 用于日志的区域名称
    pub fn label(self) -> &'static str {
        match self {
            GridKind::Answer => "答题区",
            GridKind::Identity => "SBD",
            GridKind::Variant => "试卷代码",
        }
    }
}

/// 像素矩形（左上角 + 尺寸）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BubbleRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BubbleRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// 坐标映射
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper<'a> {
    layout: &'a TemplateLayout,
}

impl<'a> CoordinateMapper<'a> {
    pub fn new(layout: &'a TemplateLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &'a TemplateLayout {
        self.layout
    }

    /// 任意区域的统一入口
    ///
    /// 对答题区，`position` 为题号；对数字区，`position` 为第几位。
    pub fn rect_for(&self, kind: GridKind, position: usize, option: usize) -> BubbleRect {
        match kind {
            GridKind::Answer => self.answer_rect(position, option),
            GridKind::Identity => self.identity_rect(position, option),
            GridKind::Variant => self.variant_rect(position, option),
        }
    }

    /// 答题区气泡
    ///
    /// 列号超出模板配置的列数时返回原点矩形 (0, 0)。
    pub fn answer_rect(&self, question: usize, option: usize) -> BubbleRect {
        let grid = &self.layout.answers;
        // questions_per_column 为 0 的模板在加载时已被拒绝
        let per_column = grid.questions_per_column.max(1);
        let column = question / per_column;
        let row = question % per_column;

        let Some(&start_x) = grid.column_starts_x.get(column) else {
            return self.bubble_at(0, 0);
        };

        let x = start_x as usize + option * grid.option_spacing_x as usize;
        let y = grid.start_y as usize + row * grid.question_spacing_y as usize;
        self.bubble_at(to_pixel(x), to_pixel(y))
    }

    /// SBD 区气泡
    pub fn identity_rect(&self, digit: usize, option: usize) -> BubbleRect {
        self.digit_rect(&self.layout.identity, digit, option)
    }

    /// 试卷代码区气泡
    pub fn variant_rect(&self, digit: usize, option: usize) -> BubbleRect {
        self.digit_rect(&self.layout.variant, digit, option)
    }

    fn digit_rect(&self, grid: &DigitGridLayout, digit: usize, option: usize) -> BubbleRect {
        let x = grid.start_x as usize + digit * grid.digit_spacing_x as usize;
        let y = grid.start_y as usize + option * grid.option_spacing_y as usize;
        self.bubble_at(to_pixel(x), to_pixel(y))
    }

    fn bubble_at(&self, x: u32, y: u32) -> BubbleRect {
        BubbleRect::new(x, y, self.layout.bubble_width, self.layout.bubble_height)
    }
}

/// 超出 u32 的坐标一定落在图像之外，饱和到 u32::MAX 后由裁剪步骤当作越界处理
fn to_pixel(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_rect_columns_and_rows() {
        let layout = TemplateLayout::default();
        let mapper = CoordinateMapper::new(&layout);

        assert_eq!(mapper.answer_rect(0, 0), BubbleRect::new(138, 466, 20, 20));
        // 第 16 题（索引 15）是第二列第一行
        assert_eq!(mapper.answer_rect(15, 2), BubbleRect::new(330, 466, 20, 20));
        // 第 60 题（索引 59）是第四列最后一行
        assert_eq!(
            mapper.answer_rect(59, 3),
            BubbleRect::new(658, 466 + 14 * 38, 20, 20)
        );
    }

    #[test]
    fn test_out_of_range_column_falls_back_to_origin() {
        let layout = TemplateLayout::default();
        let mapper = CoordinateMapper::new(&layout);
        assert_eq!(mapper.answer_rect(60, 1), BubbleRect::new(0, 0, 20, 20));
    }

    #[test]
    fn test_digit_rects() {
        let layout = TemplateLayout::default();
        let mapper = CoordinateMapper::new(&layout);

        assert_eq!(mapper.identity_rect(0, 0), BubbleRect::new(430, 150, 20, 20));
        assert_eq!(
            mapper.identity_rect(2, 5),
            BubbleRect::new(430 + 44, 150 + 135, 20, 20)
        );
        assert_eq!(
            mapper.rect_for(GridKind::Variant, 1, 9),
            BubbleRect::new(662, 150 + 243, 20, 20)
        );
    }

    #[test]
    fn test_mapping_is_pure() {
        let layout = TemplateLayout::default();
        let mapper = CoordinateMapper::new(&layout);
        for kind in [GridKind::Answer, GridKind::Identity, GridKind::Variant] {
            let first = mapper.rect_for(kind, 3, 2);
            for _ in 0..10 {
                assert_eq!(mapper.rect_for(kind, 3, 2), first);
            }
            assert_eq!(CoordinateMapper::new(&layout.clone()).rect_for(kind, 3, 2), first);
        }
    }
}
