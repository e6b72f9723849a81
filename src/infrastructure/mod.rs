//! 基础设施层：外部识别模型的注入点

pub mod recognizers;
pub mod sidecar;

pub use recognizers::{MarkDetector, RecognitionOutcome, RecognitionRequest, Recognizers, TextRecognizer};
pub use sidecar::SidecarRecognizer;
