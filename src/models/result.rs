use crate::models::answers::AssembledAnswers;
use crate::models::identity::{MatchStatus, ReconciledIdentity};
use crate::models::sheet::RegionName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 单张答题卡上发现的问题
///
/// 任何一条都会让 `hasIssue` 为真，供人工复核。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SheetIssue {
    /// 没切出某个区域
    MissingRegion { region: RegionName },
    /// 识别器超时（按未识别处理）
    RecognizerTimeout { region: RegionName },
    /// 识别器报错（按未识别处理）
    RecognizerFailed { region: RegionName, message: String },
    /// 答题区聚类数不足，无法组卷
    Ungradable { clusters: usize },
    /// 识别到的题数和答案表不一致，已补齐或截断
    AnswerCountMismatch { detected: usize, expected: usize },
    /// 没识别出试卷代码
    MissingVariantCode,
    /// 答案表中没有该试卷代码
    NoMatchingAnswerKey { code: String },
    /// 答案表自身长度和作答长度不一致
    KeyLengthMismatch { key_len: usize, answer_len: usize },
    /// 身份不是三项完全匹配
    IdentityNotExact { status: MatchStatus },
    /// 身份信息不完整
    IncompleteIdentity,
    /// 处理过程中出现意外错误
    ProcessingFailed { message: String },
    /// 批处理被取消，没有处理
    NotProcessed,
}

impl fmt::Display for SheetIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetIssue::MissingRegion { region } => write!(f, "缺少区域 {}", region),
            SheetIssue::RecognizerTimeout { region } => write!(f, "区域 {} 识别超时", region),
            SheetIssue::RecognizerFailed { region, message } => {
                write!(f, "区域 {} 识别失败: {}", region, message)
            }
            SheetIssue::Ungradable { clusters } => {
                write!(f, "答题区只识别到 {} 个标记，无法组卷", clusters)
            }
            SheetIssue::AnswerCountMismatch { detected, expected } => {
                write!(f, "识别到 {} 题，应为 {} 题", detected, expected)
            }
            SheetIssue::MissingVariantCode => write!(f, "未识别出试卷代码"),
            SheetIssue::NoMatchingAnswerKey { code } => write!(f, "答案表中没有试卷代码 {}", code),
            SheetIssue::KeyLengthMismatch {
                key_len,
                answer_len,
            } => write!(f, "标准答案 {} 题，作答 {} 题", key_len, answer_len),
            SheetIssue::IdentityNotExact { status } => write!(f, "身份未完全匹配 ({})", status),
            SheetIssue::IncompleteIdentity => write!(f, "身份信息不完整"),
            SheetIssue::ProcessingFailed { message } => write!(f, "处理失败: {}", message),
            SheetIssue::NotProcessed => write!(f, "批处理已取消，未处理"),
        }
    }
}

/// 一张答题卡的最终结果，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    /// 源图片文件名
    pub source: String,
    pub identity: ReconciledIdentity,
    pub variant_code: String,
    pub answers: AssembledAnswers,
    pub score: u32,
    /// 按满分换算后的分数
    pub scaled_score: f64,
    pub has_issue: bool,
    pub issues: Vec<SheetIssue>,
}

impl GradingResult {
    pub fn new(
        source: impl Into<String>,
        identity: ReconciledIdentity,
        variant_code: impl Into<String>,
        answers: AssembledAnswers,
        score: u32,
        scaled_score: f64,
        issues: Vec<SheetIssue>,
    ) -> Self {
        Self {
            source: source.into(),
            identity,
            variant_code: variant_code.into(),
            answers,
            score,
            scaled_score,
            has_issue: !issues.is_empty(),
            issues,
        }
    }

    /// 处理失败时的占位结果：字段全空，带一条问题
    pub fn failed(source: impl Into<String>, question_count: usize, issue: SheetIssue) -> Self {
        Self::new(
            source,
            ReconciledIdentity::unknown(issue.to_string()),
            "",
            AssembledAnswers::empty(question_count),
            0,
            0.0,
            vec![issue],
        )
    }

    /// 身份完整且得分大于 0 视为识别成功
    pub fn is_recognized(&self) -> bool {
        self.identity.is_complete() && self.score > 0
    }

    pub fn is_failed(&self) -> bool {
        self.issues.iter().any(|issue| {
            matches!(
                issue,
                SheetIssue::ProcessingFailed { .. } | SheetIssue::NotProcessed
            )
        })
    }

    /// 问题摘要，用 `; ` 连接
    pub fn issue_summary(&self) -> String {
        self.issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_issue_follows_issue_list() {
        let clean = GradingResult::new(
            "a.jpg",
            ReconciledIdentity::unknown(""),
            "101",
            AssembledAnswers::empty(2),
            0,
            0.0,
            Vec::new(),
        );
        assert!(!clean.has_issue);

        let failed = GradingResult::failed(
            "b.jpg",
            4,
            SheetIssue::ProcessingFailed {
                message: "boom".into(),
            },
        );
        assert!(failed.has_issue);
        assert!(failed.is_failed());
        assert_eq!(failed.answers.len(), 4);
        assert_eq!(failed.score, 0);
    }

    #[test]
    fn test_serializes_camel_case() {
        let result = GradingResult::failed("c.jpg", 1, SheetIssue::NotProcessed);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["hasIssue"], true);
        assert_eq!(json["variantCode"], "");
        assert_eq!(json["issues"][0]["kind"], "not_processed");
        assert_eq!(json["identity"]["status"], "no_match");
    }
}
