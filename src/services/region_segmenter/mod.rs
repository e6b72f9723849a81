//! 切图服务 - 业务能力层
//!
//! 把一张答题卡照片转正，再按版式切出代码框、姓名、学号、序号和答题区。
//! 任何一步失败都只是让对应区域缺失，不会中断整张卡。

pub mod contours;
pub mod deskew;
pub mod enhance;

use crate::models::geometry::Rect;
use crate::models::layout::SheetLayout;
use crate::models::sheet::{Region, RegionName, RegionSet, SheetImage};
use contours::ContourBox;
use image::RgbImage;
use std::path::Path;
use tracing::{debug, warn};

/// 切图服务
#[derive(Debug, Clone)]
pub struct RegionSegmenter {
    layout: SheetLayout,
}

impl RegionSegmenter {
    pub fn new(layout: SheetLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    /// 读图并切图；图片读不了时返回空集合
    pub fn segment_file(&self, path: &Path) -> RegionSet {
        match SheetImage::open(path) {
            Ok(sheet) => self.segment(&sheet),
            Err(e) => {
                warn!("⚠️ 无法读取答题卡图片，跳过切图: {}", e);
                RegionSet::empty()
            }
        }
    }

    pub fn segment(&self, sheet: &SheetImage) -> RegionSet {
        let corrected = self.correct_skew(sheet.as_rgb());
        let binary = enhance::binarize(&corrected, &self.layout);
        let boxes = contours::external_boxes(&binary);
        if boxes.is_empty() {
            warn!("⚠️ 二值图中没有找到任何轮廓");
            return RegionSet::empty();
        }
        debug!("找到 {} 个外轮廓", boxes.len());

        let mut regions = RegionSet::empty();
        let ranked = contours::top_left_ranked(
            &boxes,
            corrected.width(),
            corrected.height(),
            self.layout.info_grid_divisions,
        );

        match ranked.first() {
            Some(info) => self.split_info_block(&corrected, info.rect, &mut regions),
            None => warn!("⚠️ 左上角没有找到信息块"),
        }

        match ranked.iter().skip(1).find(|b| self.is_code_box(b)) {
            Some(code) => insert_crop(&mut regions, &corrected, RegionName::CodeBox, code.rect),
            None => warn!("⚠️ 没有找到试卷代码框"),
        }

        if let Some(table) = contours::largest_by_area(&boxes) {
            insert_crop(&mut regions, &corrected, RegionName::GradingTable, table.rect);
        }

        regions
    }

    /// 找到最长直线并转正；找不到直线时原样返回
    fn correct_skew(&self, image: &RgbImage) -> RgbImage {
        let gray = image::imageops::grayscale(image);
        match deskew::skew_angle(&gray, &self.layout) {
            Some(angle) => {
                debug!("倾角 {:.2}°", angle);
                deskew::rotate(image, angle, self.layout.rotation_fill)
            }
            None => {
                debug!("没有检测到直线，跳过纠偏");
                image.clone()
            }
        }
    }

    fn is_code_box(&self, candidate: &ContourBox) -> bool {
        candidate.rect.aspect_ratio().is_some_and(|ratio| {
            ratio > self.layout.code_box_min_aspect && ratio < self.layout.code_box_max_aspect
        })
    }

    /// 信息块：左侧一列上半是姓名，下半按条带切出学号和序号
    fn split_info_block(&self, image: &RgbImage, info: Rect, regions: &mut RegionSet) {
        let layout = &self.layout;
        let column_w = (f64::from(info.w) / layout.name_width_divisor).floor() as u32;
        let name_h = info.h / 2;

        let name = Rect::new(info.x, info.y, column_w, name_h);
        insert_crop(regions, image, RegionName::Name, name);

        let lower = Rect::new(info.x, info.y + name_h, column_w, info.h - name_h);
        let band_h = lower.h / layout.id_band_count.max(1);
        let bands = |range: &std::ops::Range<u32>| {
            Rect::new(
                lower.x,
                lower.y + range.start * band_h,
                lower.w,
                (range.end - range.start) * band_h,
            )
        };
        insert_crop(regions, image, RegionName::Id, bands(&layout.id_bands));
        insert_crop(regions, image, RegionName::Index, bands(&layout.index_bands));
    }
}

/// 裁剪（超出图像部分截掉），裁出来为空就不插入
fn insert_crop(regions: &mut RegionSet, image: &RgbImage, name: RegionName, rect: Rect) {
    match crop(image, rect) {
        Some(region) => {
            debug!("区域 {} -> {}", name, region.rect);
            regions.insert(name, region);
        }
        None => warn!("⚠️ 区域 {} 裁剪结果为空: {}", name, rect),
    }
}

fn crop(image: &RgbImage, rect: Rect) -> Option<Region> {
    let (width, height) = image.dimensions();
    if rect.x >= width || rect.y >= height {
        return None;
    }
    let clipped = Rect::new(
        rect.x,
        rect.y,
        rect.w.min(width - rect.x),
        rect.h.min(height - rect.y),
    );
    if clipped.is_empty() {
        return None;
    }
    let pixels =
        image::imageops::crop_imm(image, clipped.x, clipped.y, clipped.w, clipped.h).to_image();
    Some(Region {
        image: pixels,
        rect: clipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::draw_hollow_rect_mut;
    use imageproc::rect::Rect as DrawRect;

    const INK: Rgb<u8> = Rgb([20, 20, 20]);

    fn thick_rect(img: &mut RgbImage, x: i32, y: i32, w: u32, h: u32) {
        for i in 0..3 {
            draw_hollow_rect_mut(
                img,
                DrawRect::at(x + i, y + i).of_size(w - 2 * i as u32, h - 2 * i as u32),
                INK,
            );
        }
    }

    /// 信息块 (40,40,300,240)，代码框 (360,40,100,100)，答题区 (40,600,1100,900)
    fn synthetic_sheet() -> RgbImage {
        let mut img = RgbImage::from_pixel(1200, 1600, Rgb([235, 235, 235]));
        thick_rect(&mut img, 40, 40, 300, 240);
        thick_rect(&mut img, 360, 40, 100, 100);
        thick_rect(&mut img, 40, 600, 1100, 900);
        img
    }

    fn close(a: u32, b: u32) -> bool {
        a.abs_diff(b) <= 3
    }

    #[test]
    fn test_segments_all_regions() {
        let segmenter = RegionSegmenter::new(SheetLayout::default());
        let regions = segmenter.segment(&SheetImage::from_rgb(synthetic_sheet()));
        assert!(regions.missing().is_empty(), "missing: {:?}", regions.missing());

        let table = regions.get(RegionName::GradingTable).unwrap().rect;
        assert!(close(table.x, 40) && close(table.y, 600), "table = {}", table);
        assert!(close(table.w, 1100) && close(table.h, 900), "table = {}", table);

        let code = regions.get(RegionName::CodeBox).unwrap().rect;
        assert!(close(code.x, 360) && close(code.w, 100), "code = {}", code);

        let name = regions.get(RegionName::Name).unwrap().rect;
        assert!(close(name.x, 40) && close(name.w, 85), "name = {}", name);
        assert!(close(name.h, 120), "name = {}", name);

        let id = regions.get(RegionName::Id).unwrap().rect;
        let index = regions.get(RegionName::Index).unwrap().rect;
        assert_eq!(id.h, index.h);
        assert_eq!(id.y + id.h, index.y);
    }

    #[test]
    fn test_blank_sheet_yields_empty_set() {
        let blank = RgbImage::from_pixel(300, 400, Rgb([235, 235, 235]));
        let regions = RegionSegmenter::new(SheetLayout::default()).segment(&SheetImage::from_rgb(blank));
        assert!(regions.is_empty());
    }

    #[test]
    fn test_unreadable_file_yields_empty_set() {
        let regions = RegionSegmenter::new(SheetLayout::default())
            .segment_file(Path::new("/nonexistent/sheet.jpg"));
        assert!(regions.is_empty());
    }

    #[test]
    fn test_crop_clips_to_image() {
        let img = RgbImage::new(50, 40);
        let region = crop(&img, Rect::new(40, 30, 20, 20)).unwrap();
        assert_eq!(region.rect, Rect::new(40, 30, 10, 10));
        assert!(crop(&img, Rect::new(50, 0, 5, 5)).is_none());
    }

    #[test]
    fn test_code_box_aspect_is_open_interval() {
        let segmenter = RegionSegmenter::new(SheetLayout::default());
        let square = ContourBox {
            rect: Rect::new(0, 0, 100, 100),
            area: 0.0,
        };
        let wide = ContourBox {
            rect: Rect::new(0, 0, 120, 100),
            area: 0.0,
        };
        assert!(segmenter.is_code_box(&square));
        assert!(!segmenter.is_code_box(&wide));
    }
}
