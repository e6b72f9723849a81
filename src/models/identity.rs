use serde::{Deserialize, Serialize};

/// 从一张答题卡上独立识别出来的三个身份信号，每个都可能缺失
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySignal {
    pub name: Option<String>,
    pub student_id: Option<String>,
    pub sequence_number: Option<String>,
}

impl IdentitySignal {
    /// 空白字符串一律视为缺失
    pub fn new(
        name: Option<String>,
        student_id: Option<String>,
        sequence_number: Option<String>,
    ) -> Self {
        Self {
            name: non_blank(name),
            student_id: non_blank(student_id),
            sequence_number: non_blank(sequence_number),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn student_id(&self) -> &str {
        self.student_id.as_deref().unwrap_or("")
    }

    pub fn sequence_number(&self) -> &str {
        self.sequence_number.as_deref().unwrap_or("")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 身份校正结果类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// 三个信号都指向同一行
    ExactMatch,
    /// 部分信号匹配，其余按名单修正
    AutoCorrected,
    /// 名单中找不到
    NoMatch,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            MatchStatus::ExactMatch => "exact_match",
            MatchStatus::AutoCorrected => "auto_corrected",
            MatchStatus::NoMatch => "no_match",
        };
        f.write_str(text)
    }
}

/// 校正后的身份
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledIdentity {
    pub name: String,
    pub student_id: String,
    pub sequence_number: String,
    pub status: MatchStatus,
    pub reason: String,
    /// 命中的名单行（未命中时为 None）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roster_row: Option<usize>,
}

impl ReconciledIdentity {
    /// 三个字段是否都有值
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.student_id.is_empty() && !self.sequence_number.is_empty()
    }

    /// 无法识别时的占位身份
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            student_id: String::new(),
            sequence_number: String::new(),
            status: MatchStatus::NoMatch,
            reason: reason.into(),
            roster_row: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_signals_become_absent() {
        let signal = IdentitySignal::new(Some("  ".into()), Some(" 2100738 ".into()), None);
        assert_eq!(signal.name, None);
        assert_eq!(signal.student_id(), "2100738");
        assert_eq!(signal.sequence_number(), "");
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&MatchStatus::AutoCorrected).unwrap();
        assert_eq!(json, "\"auto_corrected\"");
        assert_eq!(MatchStatus::ExactMatch.to_string(), "exact_match");
    }
}
