//! 答题卡版式描述
//!
//! 三列答题区、左上角信息块、八等分学号/序号条带等都是纸面模板的约定，
//! 这里集中成一个可配置的描述，换模板时只需要换一份 TOML。

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// 答题卡版式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    /// 答题区列数
    pub column_count: usize,
    /// 信息块所在区域：把整张图分成 N×N 格，取左上角一格
    pub info_grid_divisions: u32,
    /// 姓名/学号列宽 = 信息块宽度 / 该值
    pub name_width_divisor: f64,
    /// 学号+序号区域等分的条带数
    pub id_band_count: u32,
    /// 学号所占条带（左闭右开）
    pub id_bands: Range<u32>,
    /// 序号所占条带（左闭右开）
    pub index_bands: Range<u32>,
    /// 试卷代码框宽高比下限（开区间）
    pub code_box_min_aspect: f64,
    /// 试卷代码框宽高比上限（开区间）
    pub code_box_max_aspect: f64,

    // --- 图像处理参数 ---
    pub canny_low: f32,
    pub canny_high: f32,
    /// 参与纠偏的最短线段长度
    pub min_line_length: u32,
    /// 同一线段上允许的最大断裂
    pub max_line_gap: u32,
    pub hough_suppression_radius: u32,
    pub clahe_clip_limit: f32,
    /// CLAHE 网格边长（N×N 块）
    pub clahe_tiles: u32,
    pub blur_sigma: f32,
    /// 自适应阈值邻域边长（奇数）
    pub threshold_block_size: u32,
    /// 自适应阈值偏移量
    pub threshold_offset: i32,
    /// 旋转后纯黑像素的填充灰度
    pub rotation_fill: u8,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            column_count: 3,
            info_grid_divisions: 3,
            name_width_divisor: 3.5,
            id_band_count: 8,
            id_bands: 2..5,
            index_bands: 5..8,
            code_box_min_aspect: 0.8,
            code_box_max_aspect: 1.2,
            canny_low: 50.0,
            canny_high: 150.0,
            min_line_length: 500,
            max_line_gap: 50,
            hough_suppression_radius: 8,
            clahe_clip_limit: 2.0,
            clahe_tiles: 8,
            blur_sigma: 1.1,
            threshold_block_size: 11,
            threshold_offset: 2,
            rotation_fill: 127,
        }
    }
}

impl SheetLayout {
    /// 校验版式描述是否自洽
    pub fn validate(&self) -> AppResult<()> {
        if self.column_count == 0 {
            return Err(AppError::invalid_layout("答题区列数不能为 0"));
        }
        if self.info_grid_divisions == 0 {
            return Err(AppError::invalid_layout("信息块网格划分不能为 0"));
        }
        if self.name_width_divisor.is_nan() || self.name_width_divisor < 1.0 {
            return Err(AppError::invalid_layout("姓名列宽除数必须 >= 1"));
        }
        for (label, bands) in [("学号", &self.id_bands), ("序号", &self.index_bands)] {
            if bands.is_empty() || bands.end > self.id_band_count {
                return Err(AppError::invalid_layout(format!(
                    "{}条带 {:?} 超出条带总数 {}",
                    label, bands, self.id_band_count
                )));
            }
        }
        if self.code_box_min_aspect.is_nan() || self.code_box_min_aspect >= self.code_box_max_aspect {
            return Err(AppError::invalid_layout("代码框宽高比区间为空"));
        }
        if self.clahe_tiles == 0 {
            return Err(AppError::invalid_layout("CLAHE 网格不能为 0"));
        }
        if self.blur_sigma <= 0.0 {
            return Err(AppError::invalid_layout("模糊 sigma 必须大于 0"));
        }
        if self.threshold_block_size < 3 || self.threshold_block_size % 2 == 0 {
            return Err(AppError::invalid_layout("自适应阈值邻域必须是 >= 3 的奇数"));
        }
        Ok(())
    }

    /// 邻域边长对应的高斯 sigma（与常见实现保持一致：0.3 * ((k - 1) * 0.5 - 1) + 0.8）
    pub fn threshold_sigma(&self) -> f32 {
        let k = self.threshold_block_size as f32;
        0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_valid() {
        let layout = SheetLayout::default();
        assert!(layout.validate().is_ok());
        assert!((layout.threshold_sigma() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_bands_outside_count() {
        let layout = SheetLayout {
            index_bands: 5..9,
            ..Default::default()
        };
        assert!(layout.validate().is_err());

        let layout = SheetLayout {
            column_count: 0,
            ..Default::default()
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_partial_toml_override() {
        let layout: SheetLayout = toml::from_str("column_count = 4\nmin_line_length = 300\n").unwrap();
        assert_eq!(layout.column_count, 4);
        assert_eq!(layout.min_line_length, 300);
        assert_eq!(layout.id_bands, 2..5);
    }
}
