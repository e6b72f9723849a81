//! 识别能力 - 基础设施层
//!
//! 涂卡检测模型、手写识别模型都是外部协作者。核心只认识这里的两个 trait，
//! 具体用哪个模型由调用方注入，测试时换成假的实现即可。

use crate::models::detection::Detection;
use crate::models::result::SheetIssue;
use crate::models::sheet::RegionName;
use anyhow::Result;
use image::RgbImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// 一次识别调用的输入：哪张卡、哪个区域、区域图像
#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub source: PathBuf,
    pub region: RegionName,
    pub image: RgbImage,
}

/// 涂卡标记检测器：答题区图像 → 无序检测框
pub trait MarkDetector: Send + Sync {
    fn detect(&self, request: &RecognitionRequest) -> Result<Vec<Detection>>;
}

/// 文本识别器：区域图像 → 一段文字（可能为空）
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, request: &RecognitionRequest) -> Result<String>;
}

/// 一次识别调用的结果
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionOutcome<T> {
    Ready(T),
    TimedOut,
    Failed(String),
}

impl<T> RecognitionOutcome<T> {
    /// 超时和失败都按"什么也没识别到"处理
    pub fn into_option(self) -> Option<T> {
        match self {
            RecognitionOutcome::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// 超时 / 失败时要记录到结果上的问题
    pub fn issue(&self, region: RegionName) -> Option<SheetIssue> {
        match self {
            RecognitionOutcome::Ready(_) => None,
            RecognitionOutcome::TimedOut => Some(SheetIssue::RecognizerTimeout { region }),
            RecognitionOutcome::Failed(message) => Some(SheetIssue::RecognizerFailed {
                region,
                message: message.clone(),
            }),
        }
    }
}

/// 注入给流程层的识别能力集合
///
/// 每次调用都放进阻塞线程池并套上超时，模型卡住不会拖住整批。
#[derive(Clone)]
pub struct Recognizers {
    detector: Arc<dyn MarkDetector>,
    text: Arc<dyn TextRecognizer>,
    timeout: Duration,
}

impl Recognizers {
    pub fn new(
        detector: Arc<dyn MarkDetector>,
        text: Arc<dyn TextRecognizer>,
        timeout: Duration,
    ) -> Self {
        Self {
            detector,
            text,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 检测答题区中的涂卡标记
    pub async fn detect_marks(&self, request: RecognitionRequest) -> RecognitionOutcome<Vec<Detection>> {
        let detector = Arc::clone(&self.detector);
        self.run_blocking(move || detector.detect(&request)).await
    }

    /// 识别区域中的文字
    pub async fn recognize_text(&self, request: RecognitionRequest) -> RecognitionOutcome<String> {
        let text = Arc::clone(&self.text);
        self.run_blocking(move || text.recognize(&request)).await
    }

    async fn run_blocking<T, F>(&self, call: F) -> RecognitionOutcome<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        match tokio::time::timeout(self.timeout, tokio::task::spawn_blocking(call)).await {
            Err(_) => RecognitionOutcome::TimedOut,
            Ok(Err(join_error)) => RecognitionOutcome::Failed(join_error.to_string()),
            Ok(Ok(Err(e))) => RecognitionOutcome::Failed(format!("{:#}", e)),
            Ok(Ok(Ok(value))) => RecognitionOutcome::Ready(value),
        }
    }
}
