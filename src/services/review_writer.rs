//! 复核清单写入服务 - 业务能力层
//!
//! 只负责"把有问题的答题卡追加到复核清单"，不关心流程

use crate::models::result::GradingResult;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

/// 复核清单写入服务
///
/// 每张有问题的卡写一行：文件名 | 学号 | 姓名 | 问题摘要
pub struct ReviewWriter {
    review_file_path: String,
}

impl ReviewWriter {
    pub fn new() -> Self {
        Self {
            review_file_path: "review.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            review_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.review_file_path
    }

    /// 没有问题的结果直接跳过
    pub fn write(&self, result: &GradingResult) -> Result<()> {
        if !result.has_issue {
            return Ok(());
        }
        debug!("写入复核清单: {} | 问题数: {}", result.source, result.issues.len());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.review_file_path)
            .with_context(|| format!("无法打开复核清单: {}", self.review_file_path))?;

        let line = format!(
            "{} | 学号 {} | 姓名 {} | {}\n",
            result.source,
            display_or_dash(&result.identity.student_id),
            display_or_dash(&result.identity.name),
            result.issue_summary()
        );
        file.write_all(line.as_bytes())
            .with_context(|| format!("无法写入复核清单: {}", self.review_file_path))?;

        Ok(())
    }
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

impl Default for ReviewWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::result::SheetIssue;

    #[test]
    fn test_appends_only_flagged_results() {
        let path = std::env::temp_dir().join(format!("review-{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let writer = ReviewWriter::with_path(path.to_string_lossy().to_string());

        let flagged = GradingResult::failed("a.jpg", 3, SheetIssue::MissingVariantCode);
        let mut clean = GradingResult::failed("b.jpg", 3, SheetIssue::MissingVariantCode);
        clean.issues.clear();
        clean.has_issue = false;

        writer.write(&flagged).unwrap();
        writer.write(&clean).unwrap();
        writer.write(&flagged).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("a.jpg | 学号 - | 姓名 - |"));
        assert!(lines[0].contains("未识别出试卷代码"));

        let _ = std::fs::remove_file(&path);
    }
}
