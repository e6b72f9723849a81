//! 二值化前的增强：灰度 → 局部直方图均衡（CLAHE）→ 轻度模糊 → 自适应阈值（墨迹为前景）

use crate::models::layout::SheetLayout;
use image::{GrayImage, Luma, RgbImage};
use imageproc::filter::gaussian_blur_f32;

/// 彩色图 → 二值图（墨迹 255，背景 0）
pub fn binarize(image: &RgbImage, layout: &SheetLayout) -> GrayImage {
    let gray = image::imageops::grayscale(image);
    let equalized = clahe(&gray, layout.clahe_clip_limit, layout.clahe_tiles);
    let smoothed = gaussian_blur_f32(&equalized, layout.blur_sigma);
    adaptive_threshold_inv(&smoothed, layout.threshold_sigma(), layout.threshold_offset)
}

/// 限制对比度的自适应直方图均衡
///
/// 图像分成 `tiles × tiles` 块，每块做截断后的直方图均衡，
/// 像素值由相邻四块的映射表双线性插值得到，避免块边界出现接缝。
pub fn clahe(gray: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }
    let tiles_x = tiles.clamp(1, width);
    let tiles_y = tiles.clamp(1, height);
    let tile_w = width.div_ceil(tiles_x);
    let tile_h = height.div_ceil(tiles_y);

    let mut luts = vec![[0u8; 256]; (tiles_x * tiles_y) as usize];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            luts[(ty * tiles_x + tx) as usize] = tile_lut(gray, x0..x1, y0..y1, clip_limit);
        }
    }

    let lut_at = |tx: u32, ty: u32, v: u8| f32::from(luts[(ty * tiles_x + tx) as usize][v as usize]);

    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let v = gray.get_pixel(x, y)[0];

        let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let tx0 = fx.floor().clamp(0.0, (tiles_x - 1) as f32) as u32;
        let ty0 = fy.floor().clamp(0.0, (tiles_y - 1) as f32) as u32;
        let tx1 = (tx0 + 1).min(tiles_x - 1);
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let ax = (fx - tx0 as f32).clamp(0.0, 1.0);
        let ay = (fy - ty0 as f32).clamp(0.0, 1.0);

        let top = lut_at(tx0, ty0, v) * (1.0 - ax) + lut_at(tx1, ty0, v) * ax;
        let bottom = lut_at(tx0, ty1, v) * (1.0 - ax) + lut_at(tx1, ty1, v) * ax;
        let value = top * (1.0 - ay) + bottom * ay;
        *pixel = Luma([value.round().clamp(0.0, 255.0) as u8]);
    }
    out
}

fn tile_lut(
    gray: &GrayImage,
    xs: std::ops::Range<u32>,
    ys: std::ops::Range<u32>,
    clip_limit: f32,
) -> [u8; 256] {
    let mut hist = [0u32; 256];
    for y in ys.clone() {
        for x in xs.clone() {
            hist[gray.get_pixel(x, y)[0] as usize] += 1;
        }
    }
    let area = (xs.len() * ys.len()) as u32;
    let mut lut = [0u8; 256];
    if area == 0 {
        return lut;
    }

    // 截断超出上限的部分，均匀分回所有灰度级
    let clip = ((clip_limit * area as f32 / 256.0) as u32).max(1);
    let mut excess = 0;
    for count in hist.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }
    let share = excess / 256;
    let remainder = (excess % 256) as usize;
    for (level, count) in hist.iter_mut().enumerate() {
        *count += share + u32::from(level < remainder);
    }

    let scale = 255.0 / area as f32;
    let mut cdf = 0u32;
    for (level, count) in hist.iter().enumerate() {
        cdf += count;
        lut[level] = (cdf as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// 反向高斯自适应阈值：像素不高于邻域加权均值减偏移量时为前景（255）
pub fn adaptive_threshold_inv(gray: &GrayImage, sigma: f32, offset: i32) -> GrayImage {
    let mean = gaussian_blur_f32(gray, sigma);
    let mut out = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let src = i32::from(gray.get_pixel(x, y)[0]);
        let threshold = i32::from(mean.get_pixel(x, y)[0]) - offset;
        *pixel = Luma([if src <= threshold { 255 } else { 0 }]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect as DrawRect;

    #[test]
    fn test_clahe_keeps_dimensions_and_order() {
        let mut gray = GrayImage::new(64, 48);
        for (x, _, p) in gray.enumerate_pixels_mut() {
            *p = Luma([(x * 2) as u8 + 60]);
        }
        let out = clahe(&gray, 2.0, 8);
        assert_eq!(out.dimensions(), (64, 48));
        // 均衡不改变同一行内的明暗顺序
        assert!(out.get_pixel(2, 10)[0] <= out.get_pixel(60, 10)[0]);
    }

    #[test]
    fn test_clahe_handles_tiny_images() {
        let gray = GrayImage::from_pixel(3, 2, Luma([100]));
        assert_eq!(clahe(&gray, 2.0, 8).dimensions(), (3, 2));
        let empty = GrayImage::new(0, 0);
        assert_eq!(clahe(&empty, 2.0, 8).dimensions(), (0, 0));
    }

    #[test]
    fn test_threshold_marks_ink_as_foreground() {
        let mut gray = GrayImage::from_pixel(40, 40, Luma([230]));
        draw_filled_rect_mut(&mut gray, DrawRect::at(18, 5).of_size(3, 30), Luma([20]));
        let binary = adaptive_threshold_inv(&gray, 2.0, 2);
        assert_eq!(binary.get_pixel(19, 20)[0], 255);
        assert_eq!(binary.get_pixel(5, 20)[0], 0);
    }

    #[test]
    fn test_binarize_uniform_paper_is_background() {
        let image = RgbImage::from_pixel(50, 50, Rgb([240, 240, 240]));
        let binary = binarize(&image, &SheetLayout::default());
        assert!(binary.pixels().all(|p| p[0] == 0));
    }
}
