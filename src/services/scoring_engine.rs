//! 评分服务 - 业务能力层
//!
//! 只负责"按试卷代码对答案"，不关心答案从哪里来

use crate::models::answer_key::{normalize_variant_code, AnswerKeyTable};
use crate::models::answers::AssembledAnswers;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// 评分时发现的异常情况
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
    /// 正常评分
    Scored,
    /// 答案表中没有该代码，记 0 分
    NoMatchingKey { code: String },
    /// 标准答案和作答长度不一致，短的一侧补空后评分
    KeyLengthMismatch { key_len: usize, answer_len: usize },
}

/// 一张卡的评分结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub score: u32,
    pub status: ScoreStatus,
}

/// 评分服务
pub struct ScoringEngine {
    answer_key: Arc<AnswerKeyTable>,
}

impl ScoringEngine {
    pub fn new(answer_key: Arc<AnswerKeyTable>) -> Self {
        Self { answer_key }
    }

    /// 按试卷代码找标准答案并逐题比对
    ///
    /// 不会失败：找不到代码记 0 分并在状态里说明。
    pub fn score(&self, answers: &AssembledAnswers, variant_code: &str) -> ScoreOutcome {
        let code = normalize_variant_code(variant_code);
        let Some(key) = self.answer_key.lookup(&code) else {
            warn!("答案表中没有试卷代码 '{}'，记 0 分", code);
            return ScoreOutcome {
                score: 0,
                status: ScoreStatus::NoMatchingKey { code },
            };
        };

        let score = count_correct(answers.as_slice(), key);
        let status = if key.len() == answers.len() {
            ScoreStatus::Scored
        } else {
            warn!(
                "试卷 {} 标准答案 {} 题，作答 {} 题，按较长一侧补空比对",
                code,
                key.len(),
                answers.len()
            );
            ScoreStatus::KeyLengthMismatch {
                key_len: key.len(),
                answer_len: answers.len(),
            }
        };

        debug!("试卷 {} 得分 {}/{}", code, score, key.len());
        ScoreOutcome { score, status }
    }
}

/// 两边都非空且忽略大小写相等才算对
///
/// 长度不同时，较短一侧缺的位置按空答案处理，空答案永远不算对。
fn count_correct(answers: &[String], key: &[String]) -> u32 {
    let correct = answers
        .iter()
        .zip(key.iter())
        .filter(|(given, expected)| {
            let given = given.trim();
            let expected = expected.trim();
            !given.is_empty() && !expected.is_empty() && given.eq_ignore_ascii_case(expected)
        })
        .count();
    u32::try_from(correct).unwrap_or(u32::MAX)
}

/// 把原始分按满分换算，保留两位小数；总题数为 0 时返回 0
pub fn scale_score(score: u32, total_questions: usize, max_points: f64) -> f64 {
    if total_questions == 0 {
        return 0.0;
    }
    let scaled = f64::from(score) * max_points / total_questions as f64;
    (scaled * 100.0).round() / 100.0
}
