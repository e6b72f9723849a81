use serde::{Deserialize, Serialize};

/// 按题号排好的作答序列，空字符串表示未作答
///
/// 长度总是等于配置的题目数量。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssembledAnswers {
    answers: Vec<String>,
}

impl AssembledAnswers {
    /// 全部未作答
    pub fn empty(question_count: usize) -> Self {
        Self {
            answers: vec![String::new(); question_count],
        }
    }

    /// 按题目数量补齐或截断
    pub fn fitted(mut answers: Vec<String>, question_count: usize) -> Self {
        answers.resize(question_count, String::new());
        Self { answers }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.answers
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// 第 `question` 题的作答（题号从 1 开始）
    pub fn get(&self, question: usize) -> Option<&str> {
        question
            .checked_sub(1)
            .and_then(|idx| self.answers.get(idx))
            .map(String::as_str)
    }

    /// 已作答的题目数
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| !a.is_empty()).count()
    }
}

impl From<Vec<String>> for AssembledAnswers {
    fn from(answers: Vec<String>) -> Self {
        Self { answers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fitted_pads_and_truncates() {
        let short = AssembledAnswers::fitted(vec!["A".to_string()], 3);
        assert_eq!(short.as_slice(), &["A", "", ""]);

        let long = AssembledAnswers::fitted(vec!["A".into(), "B".into(), "C".into()], 2);
        assert_eq!(long.as_slice(), &["A", "B"]);
    }

    #[test]
    fn test_get_is_one_based() {
        let answers = AssembledAnswers::from(vec!["A".to_string(), String::new()]);
        assert_eq!(answers.get(1), Some("A"));
        assert_eq!(answers.get(2), Some(""));
        assert_eq!(answers.get(0), None);
        assert_eq!(answers.get(3), None);
        assert_eq!(answers.answered_count(), 1);
    }
}
