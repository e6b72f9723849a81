//! 纠偏：找到最长直线，按它的倾角把整张图转正

use crate::models::layout::SheetLayout;
use image::{GrayImage, Rgb, RgbImage};
use imageproc::edges::canny;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};
use tracing::debug;

/// 倾角小于该值（度）时不旋转
const MIN_ROTATION_DEGREES: f32 = 0.05;
/// 霍夫直线两侧收集边缘点的半宽（像素）
const LINE_BAND_PX: f32 = 3.0;

/// 图中的一条线段，端点已按从左到右排列
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: (f32, f32),
    pub end: (f32, f32),
}

impl LineSegment {
    fn ordered(a: (f32, f32), b: (f32, f32)) -> Self {
        if (a.0, a.1) <= (b.0, b.1) {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn length(&self) -> f32 {
        let dx = self.end.0 - self.start.0;
        let dy = self.end.1 - self.start.1;
        (dx * dx + dy * dy).sqrt()
    }

    /// 相对水平方向的角度（度），y 轴向下，范围 (-90, 90]
    pub fn angle_degrees(&self) -> f32 {
        let dx = self.end.0 - self.start.0;
        let dy = self.end.1 - self.start.1;
        dy.atan2(dx).to_degrees()
    }
}

/// 边缘检测 + 霍夫变换，再把每条霍夫直线附近的边缘点切成线段
pub fn detect_segments(gray: &GrayImage, layout: &SheetLayout) -> Vec<LineSegment> {
    let edges = canny(gray, layout.canny_low, layout.canny_high);
    let edge_points: Vec<(f32, f32)> = edges
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] > 0)
        .map(|(x, y, _)| (x as f32, y as f32))
        .collect();
    if edge_points.is_empty() {
        return Vec::new();
    }

    let options = LineDetectionOptions {
        vote_threshold: (layout.min_line_length / 2).max(1),
        suppression_radius: layout.hough_suppression_radius,
    };
    let lines = detect_lines(&edges, options);
    debug!("霍夫变换找到 {} 条候选直线", lines.len());

    lines
        .iter()
        .flat_map(|line| {
            split_line(
                &edge_points,
                line,
                layout.min_line_length as f32,
                layout.max_line_gap as f32,
            )
        })
        .collect()
}

/// 取直线附近的边缘点，沿直线方向按断裂切段，每段用主成分拟合出真实走向
fn split_line(
    edge_points: &[(f32, f32)],
    line: &PolarLine,
    min_length: f32,
    max_gap: f32,
) -> Vec<LineSegment> {
    let theta = (line.angle_in_degrees as f32).to_radians();
    let (sin, cos) = theta.sin_cos();
    let direction = (-sin, cos);

    let mut near: Vec<(f32, (f32, f32))> = edge_points
        .iter()
        .filter(|(x, y)| (x * cos + y * sin - line.r).abs() <= LINE_BAND_PX)
        .map(|&(x, y)| (x * direction.0 + y * direction.1, (x, y)))
        .collect();
    near.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut segments = Vec::new();
    let mut run_start = 0;
    for i in 1..=near.len() {
        let broken = i == near.len() || near[i].0 - near[i - 1].0 > max_gap;
        if !broken {
            continue;
        }
        let run = &near[run_start..i];
        if let (Some(first), Some(last)) = (run.first(), run.last()) {
            if last.0 - first.0 >= min_length {
                let points: Vec<(f32, f32)> = run.iter().map(|(_, p)| *p).collect();
                if let Some(segment) = fit_segment(&points) {
                    segments.push(segment);
                }
            }
        }
        run_start = i;
    }
    segments
}

/// 主成分方向拟合，端点取投影的两端
fn fit_segment(points: &[(f32, f32)]) -> Option<LineSegment> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0f64, 0.0f64), |acc, p| (acc.0 + f64::from(p.0), acc.1 + f64::from(p.1)));
    let (mx, my) = (sum_x / n, sum_y / n);

    let (mut sxx, mut syy, mut sxy) = (0.0f64, 0.0f64, 0.0f64);
    for p in points {
        let dx = f64::from(p.0) - mx;
        let dy = f64::from(p.1) - my;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    let angle = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let (dir_y, dir_x) = angle.sin_cos();

    let (mut t_min, mut t_max) = (f64::MAX, f64::MIN);
    for p in points {
        let t = (f64::from(p.0) - mx) * dir_x + (f64::from(p.1) - my) * dir_y;
        t_min = t_min.min(t);
        t_max = t_max.max(t);
    }

    let at = |t: f64| ((mx + t * dir_x) as f32, (my + t * dir_y) as f32);
    Some(LineSegment::ordered(at(t_min), at(t_max)))
}

/// 最长的线段，长度相同时取先找到的
pub fn longest_segment(segments: &[LineSegment]) -> Option<LineSegment> {
    let mut best: Option<LineSegment> = None;
    for segment in segments {
        match best {
            Some(current) if segment.length() <= current.length() => {}
            _ => best = Some(*segment),
        }
    }
    best
}

/// 估计倾角（度）；找不到直线时返回 None
///
/// 最长线段接近竖直时按竖直方向计算偏差，避免把竖版答题卡转 90 度。
pub fn skew_angle(gray: &GrayImage, layout: &SheetLayout) -> Option<f32> {
    let segments = detect_segments(gray, layout);
    let longest = longest_segment(&segments)?;
    let angle = longest.angle_degrees();
    debug!(
        "最长线段 {:.0}px，角度 {:.2}°（共 {} 段）",
        longest.length(),
        angle,
        segments.len()
    );
    Some(if angle > 45.0 {
        angle - 90.0
    } else if angle < -45.0 {
        angle + 90.0
    } else {
        angle
    })
}

/// 按倾角反向旋转；旋转带进来的纯黑像素填成中性灰
pub fn rotate(image: &RgbImage, angle_degrees: f32, fill: u8) -> RgbImage {
    if angle_degrees.abs() < MIN_ROTATION_DEGREES {
        return image.clone();
    }
    let mut rotated = rotate_about_center(
        image,
        -angle_degrees.to_radians(),
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
    );
    for pixel in rotated.pixels_mut() {
        if pixel.0 == [0, 0, 0] {
            *pixel = Rgb([fill, fill, fill]);
        }
    }
    rotated
}
