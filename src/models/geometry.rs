use serde::{Deserialize, Serialize};

/// 轴对齐矩形 `(x, y, w, h)`，坐标系为校正后的整张答题卡
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// 对角线长度
    pub fn diagonal(&self) -> f64 {
        (f64::from(self.w).powi(2) + f64::from(self.h).powi(2)).sqrt()
    }

    /// 宽高比，高为 0 时返回 None
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.h == 0 {
            None
        } else {
            Some(f64::from(self.w) / f64::from(self.h))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.w, self.h)
    }
}

/// 检测框 `(x1, y1, x2, y2)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 中心点
    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// 两个框中心点之间的欧氏距离
    pub fn center_distance(&self, other: &BoundingBox) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        let coords = [self.x1, self.y1, self.x2, self.y2];
        coords.iter().all(|c| c.is_finite()) && self.x1 <= self.x2 && self.y1 <= self.y2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_metrics() {
        let rect = Rect::new(0, 0, 30, 40);
        assert_eq!(rect.diagonal(), 50.0);
        assert_eq!(rect.aspect_ratio(), Some(0.75));
        assert_eq!(Rect::new(0, 0, 10, 0).aspect_ratio(), None);
    }

    #[test]
    fn test_center_distance() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(6.0, 8.0, 16.0, 18.0);
        assert!((a.center_distance(&b) - 10.0).abs() < 1e-6);
        assert!(!BoundingBox::new(5.0, 0.0, 1.0, 1.0).is_well_formed());
    }
}
