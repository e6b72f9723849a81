use crate::error::{AppResult, DataError};
use crate::models::geometry::BoundingBox;
use serde::{Deserialize, Serialize};

/// 检测器给出的一个候选涂卡标记
///
/// 标签的最后一个字符就是选项字母（`answer_A` → `A`）。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub label: String,
    pub confidence: f32,
}

impl Detection {
    /// 创建检测结果，校验标签、置信度和框坐标
    pub fn new(bbox: BoundingBox, label: impl Into<String>, confidence: f32) -> AppResult<Self> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(DataError::EmptyField {
                record: "Detection",
                field: "label",
            }
            .into());
        }
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(DataError::InvalidConfidence { value: confidence }.into());
        }
        if !bbox.is_well_formed() {
            return Err(DataError::InvalidBoundingBox {
                x1: bbox.x1,
                y1: bbox.y1,
                x2: bbox.x2,
                y2: bbox.y2,
            }
            .into());
        }
        Ok(Self {
            bbox,
            label,
            confidence,
        })
    }

    /// 选项字母（标签最后一个字符）
    pub fn option_letter(&self) -> char {
        // 构造时已保证标签非空
        self.label.trim_end().chars().last().unwrap_or(' ')
    }
}

/// 反序列化时走 `Detection::new` 的校验
#[derive(Deserialize)]
struct RawDetection {
    bbox: [f32; 4],
    label: String,
    confidence: f32,
}

impl<'de> Deserialize<'de> for Detection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawDetection::deserialize(deserializer)?;
        let [x1, y1, x2, y2] = raw.bbox;
        Detection::new(BoundingBox::new(x1, y1, x2, y2), raw.label, raw.confidence)
            .map_err(serde::de::Error::custom)
    }
}

/// 被判定为同一个物理标记的一组检测结果
#[derive(Debug, Clone)]
pub struct AnswerCluster {
    pub members: Vec<Detection>,
    /// 代表检测在 `members` 中的下标
    pub representative: usize,
    /// 代表选项字母
    pub letter: char,
}

impl AnswerCluster {
    pub fn representative(&self) -> &Detection {
        &self.members[self.representative]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn test_option_letter_is_last_char() {
        let det = Detection::new(bbox(), "answer_C", 0.9).unwrap();
        assert_eq!(det.option_letter(), 'C');
    }

    #[test]
    fn test_constructor_validates_fields() {
        assert!(Detection::new(bbox(), "  ", 0.5).is_err());
        assert!(Detection::new(bbox(), "A", 1.5).is_err());
        assert!(Detection::new(bbox(), "A", f32::NAN).is_err());
        assert!(Detection::new(BoundingBox::new(10.0, 0.0, 0.0, 10.0), "A", 0.5).is_err());
    }

    #[test]
    fn test_deserialize_runs_validation() {
        let ok: Detection =
            serde_json::from_str(r#"{"bbox":[1,2,3,4],"label":"B","confidence":0.7}"#).unwrap();
        assert_eq!(ok.option_letter(), 'B');

        let bad = serde_json::from_str::<Detection>(r#"{"bbox":[1,2,3,4],"label":"B","confidence":7}"#);
        assert!(bad.is_err());
    }
}
