//! 外轮廓提取与候选框筛选

use crate::models::geometry::Rect;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};

/// 一个外轮廓的外接矩形和轮廓面积
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourBox {
    pub rect: Rect,
    pub area: f64,
}

/// 二值图中所有最外层轮廓
pub fn external_boxes(binary: &GrayImage) -> Vec<ContourBox> {
    find_contours::<i32>(binary)
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(contour_box)
        .collect()
}

fn contour_box(contour: &Contour<i32>) -> Option<ContourBox> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let rect = Rect::new(
        u32::try_from(min_x).ok()?,
        u32::try_from(min_y).ok()?,
        u32::try_from(max_x - min_x + 1).ok()?,
        u32::try_from(max_y - min_y + 1).ok()?,
    );
    Some(ContourBox {
        rect,
        area: polygon_area(contour),
    })
}

/// 鞋带公式
fn polygon_area(contour: &Contour<i32>) -> f64 {
    let points = &contour.points;
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice += i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y);
    }
    twice.abs() as f64 / 2.0
}

/// 左上角 1/N × 1/N 格内（按外接框左上角判断）的候选框，按对角线从长到短
pub fn top_left_ranked(
    boxes: &[ContourBox],
    width: u32,
    height: u32,
    divisions: u32,
) -> Vec<ContourBox> {
    let divisions = divisions.max(1);
    let (max_x, max_y) = (width / divisions, height / divisions);
    let mut ranked: Vec<ContourBox> = boxes
        .iter()
        .filter(|b| b.rect.x < max_x && b.rect.y < max_y)
        .copied()
        .collect();
    ranked.sort_by(|a, b| b.rect.diagonal().total_cmp(&a.rect.diagonal()));
    ranked
}

/// 面积最大的轮廓，并列时取先出现的
pub fn largest_by_area(boxes: &[ContourBox]) -> Option<ContourBox> {
    let mut best: Option<ContourBox> = None;
    for b in boxes {
        match best {
            Some(current) if b.area <= current.area => {}
            _ => best = Some(*b),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
    use imageproc::rect::Rect as DrawRect;

    fn cbox(x: u32, y: u32, w: u32, h: u32, area: f64) -> ContourBox {
        ContourBox {
            rect: Rect::new(x, y, w, h),
            area,
        }
    }

    #[test]
    fn test_external_boxes_skip_holes_and_nested() {
        let mut binary = GrayImage::new(100, 100);
        draw_hollow_rect_mut(&mut binary, DrawRect::at(10, 10).of_size(50, 40), Luma([255]));
        // 框内的小块是嵌套轮廓，不算外轮廓
        draw_filled_rect_mut(&mut binary, DrawRect::at(20, 20).of_size(5, 5), Luma([255]));
        draw_filled_rect_mut(&mut binary, DrawRect::at(70, 70).of_size(10, 20), Luma([255]));

        let mut boxes = external_boxes(&binary);
        boxes.sort_by_key(|b| b.rect.x);
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].rect, Rect::new(10, 10, 50, 40));
        assert_eq!(boxes[1].rect, Rect::new(70, 70, 10, 20));
        // 实心块的轮廓面积 = (w-1)*(h-1)
        assert_eq!(boxes[1].area, 9.0 * 19.0);
    }

    #[test]
    fn test_top_left_ranked_by_diagonal() {
        let boxes = vec![
            cbox(10, 10, 30, 30, 900.0),
            cbox(20, 20, 80, 60, 4800.0),
            cbox(200, 10, 90, 90, 8100.0),
            cbox(10, 200, 90, 90, 8100.0),
        ];
        let ranked = top_left_ranked(&boxes, 300, 300, 3);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].rect.w, 80);
        assert_eq!(ranked[1].rect.w, 30);
    }

    #[test]
    fn test_largest_by_area_first_on_ties() {
        let boxes = vec![cbox(0, 0, 1, 1, 5.0), cbox(5, 5, 1, 1, 9.0), cbox(9, 9, 1, 1, 9.0)];
        assert_eq!(largest_by_area(&boxes).unwrap().rect.x, 5);
        assert!(largest_by_area(&[]).is_none());
    }
}
