//! 预先算好的识别结果
//!
//! 每张图片旁边放一个 `<图片名>.recognition.toml`，里面是检测模型和手写识别的输出。
//! 这样不接任何模型也能跑完整个批改流程。

use crate::infrastructure::recognizers::{MarkDetector, RecognitionRequest, TextRecognizer};
use crate::models::detection::Detection;
use crate::models::sheet::RegionName;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
struct SidecarFile {
    variant_code: Option<toml::Value>,
    name: Option<toml::Value>,
    student_id: Option<toml::Value>,
    sequence_number: Option<toml::Value>,
    /// 逐条校验，坏的单条丢掉，不影响文字字段
    #[serde(default)]
    detections: Vec<toml::Value>,
}

/// 从 sidecar 文件读取识别结果
#[derive(Debug, Clone, Default)]
pub struct SidecarRecognizer;

impl SidecarRecognizer {
    pub fn new() -> Self {
        Self
    }

    /// `uploads/a.jpg` → `uploads/a.recognition.toml`
    pub fn sidecar_path(source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        source.with_file_name(format!("{}.recognition.toml", stem))
    }

    fn load(source: &Path) -> Result<SidecarFile> {
        let path = Self::sidecar_path(source);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("无法读取识别结果: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("无法解析识别结果: {}", path.display()))
    }
}

fn value_to_text(value: Option<toml::Value>) -> String {
    match value {
        Some(toml::Value::String(s)) => s,
        Some(toml::Value::Integer(i)) => i.to_string(),
        Some(toml::Value::Float(f)) if f.fract() == 0.0 => format!("{}", f as i64),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn valid_detections(source: &Path, raw: Vec<toml::Value>) -> Vec<Detection> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match value.try_into::<Detection>() {
            Ok(detection) => Some(detection),
            Err(e) => {
                warn!("{} 第 {} 个检测框无效，已丢弃: {}", source.display(), idx + 1, e);
                None
            }
        })
        .collect()
}

impl MarkDetector for SidecarRecognizer {
    fn detect(&self, request: &RecognitionRequest) -> Result<Vec<Detection>> {
        let file = Self::load(&request.source)?;
        Ok(valid_detections(&request.source, file.detections))
    }
}

impl TextRecognizer for SidecarRecognizer {
    fn recognize(&self, request: &RecognitionRequest) -> Result<String> {
        let file = Self::load(&request.source)?;
        let value = match request.region {
            RegionName::CodeBox => file.variant_code,
            RegionName::Name => file.name,
            RegionName::Id => file.student_id,
            RegionName::Index => file.sequence_number,
            RegionName::GradingTable => None,
        };
        Ok(value_to_text(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn request(source: &Path, region: RegionName) -> RecognitionRequest {
        RecognitionRequest {
            source: source.to_path_buf(),
            region,
            image: RgbImage::new(1, 1),
        }
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            SidecarRecognizer::sidecar_path(Path::new("uploads/a.jpg")),
            PathBuf::from("uploads/a.recognition.toml")
        );
    }

    #[test]
    fn test_reads_fields_and_detections() {
        let dir = std::env::temp_dir().join(format!("sidecar-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let source = dir.join("s1.jpg");
        std::fs::write(
            SidecarRecognizer::sidecar_path(&source),
            r#"
variant_code = 101
name = "Nguyen Van An"
student_id = "2100738"
sequence_number = 7

[[detections]]
bbox = [10.0, 10.0, 20.0, 20.0]
label = "answer_B"
confidence = 0.8
"#,
        )
        .unwrap();

        let recognizer = SidecarRecognizer::new();
        assert_eq!(recognizer.recognize(&request(&source, RegionName::CodeBox)).unwrap(), "101");
        assert_eq!(recognizer.recognize(&request(&source, RegionName::Index)).unwrap(), "7");
        assert_eq!(
            recognizer.recognize(&request(&source, RegionName::Name)).unwrap(),
            "Nguyen Van An"
        );
        let marks = recognizer.detect(&request(&source, RegionName::GradingTable)).unwrap();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].option_letter(), 'B');

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_detection_is_dropped_not_fatal() {
        let dir = std::env::temp_dir().join(format!("sidecar-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let source = dir.join("s2.jpg");
        std::fs::write(
            SidecarRecognizer::sidecar_path(&source),
            r#"
variant_code = "212"
name = "Tran Thi Binh"

[[detections]]
bbox = [10.0, 10.0, 20.0, 20.0]
label = "A"
confidence = 1.5

[[detections]]
bbox = [40.0, 10.0, 50.0, 20.0]
label = "C"
confidence = 0.6
"#,
        )
        .unwrap();

        let recognizer = SidecarRecognizer::new();
        assert_eq!(recognizer.recognize(&request(&source, RegionName::CodeBox)).unwrap(), "212");
        assert_eq!(
            recognizer.recognize(&request(&source, RegionName::Name)).unwrap(),
            "Tran Thi Binh"
        );
        let marks = recognizer.detect(&request(&source, RegionName::GradingTable)).unwrap();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].option_letter(), 'C');

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_sidecar_is_error() {
        let recognizer = SidecarRecognizer::new();
        let req = request(Path::new("/nonexistent/s.jpg"), RegionName::Name);
        assert!(recognizer.recognize(&req).is_err());
    }
}
