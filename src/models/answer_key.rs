use crate::error::{AppResult, DataError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 规范化试卷代码：去掉首尾空白和表格导出带来的 `.0` 尾巴
pub fn normalize_variant_code(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix(".0").unwrap_or(trimmed).trim().to_string()
}

/// 一套试卷的标准答案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerKeyEntry {
    #[serde(deserialize_with = "deserialize_loose_string")]
    pub code: String,
    pub answers: Vec<String>,
}

/// 试卷代码 → 标准答案
///
/// 保持文件中的顺序，查找时按规范化后的代码匹配（不按行号）。
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerKeyTable {
    entries: Vec<AnswerKeyEntry>,
}

impl AnswerKeyTable {
    /// 创建答案表，代码规范化后不能为空、不能重复
    pub fn new(entries: Vec<AnswerKeyEntry>) -> AppResult<Self> {
        if entries.is_empty() {
            return Err(DataError::EmptyAnswerKey.into());
        }

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(entries.len());
        for entry in entries {
            let code = normalize_variant_code(&entry.code);
            if code.is_empty() {
                return Err(DataError::EmptyField {
                    record: "AnswerKeyEntry",
                    field: "code",
                }
                .into());
            }
            if !seen.insert(code.clone()) {
                return Err(DataError::DuplicateVariantCode { code }.into());
            }
            normalized.push(AnswerKeyEntry {
                code,
                answers: entry.answers.into_iter().map(|a| a.trim().to_string()).collect(),
            });
        }

        Ok(Self {
            entries: normalized,
        })
    }

    /// 由 `(代码, 答案)` 列表构建
    pub fn from_pairs<C, A, S>(pairs: impl IntoIterator<Item = (C, A)>) -> AppResult<Self>
    where
        C: Into<String>,
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(code, answers)| AnswerKeyEntry {
                code: code.into(),
                answers: answers.into_iter().map(Into::into).collect(),
            })
            .collect();
        Self::new(entries)
    }

    /// 按试卷代码查找标准答案
    pub fn lookup(&self, code: &str) -> Option<&[String]> {
        let code = normalize_variant_code(code);
        self.entries
            .iter()
            .find(|entry| entry.code == code)
            .map(|entry| entry.answers.as_slice())
    }

    /// 所有可用的试卷代码（文件顺序）
    pub fn codes(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.code.as_str()).collect()
    }

    /// 题目数量：最长一套的答案数
    pub fn question_count(&self) -> usize {
        self.entries.iter().map(|e| e.answers.len()).max().unwrap_or(0)
    }

    pub fn entries(&self) -> &[AnswerKeyEntry] {
        &self.entries
    }

    /// 各套答案长度是否一致
    pub fn check_uniform_length(&self) -> AppResult<()> {
        let expected = self.question_count();
        for entry in &self.entries {
            if entry.answers.len() != expected {
                return Err(DataError::InconsistentKeyLength {
                    code: entry.code.clone(),
                    expected,
                    actual: entry.answers.len(),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// 字符串 / 整数 / 浮点数都转成字符串
///
/// 名单和答案表常由表格导出，代码、学号、序号经常变成数字。
pub(crate) fn deserialize_loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct LooseStringVisitor;

    impl<'de> Visitor<'de> for LooseStringVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or number")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.trim().to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value.fract() == 0.0 && value.abs() < 1e15 {
                Ok(format!("{}", value as i64))
            } else {
                Ok(value.to_string())
            }
        }
    }

    deserializer.deserialize_any(LooseStringVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_variant_code() {
        assert_eq!(normalize_variant_code(" 101 "), "101");
        assert_eq!(normalize_variant_code("101.0"), "101");
        assert_eq!(normalize_variant_code("10.05"), "10.05");
        assert_eq!(normalize_variant_code(""), "");
    }

    #[test]
    fn test_lookup_by_normalized_code() {
        let table = AnswerKeyTable::from_pairs(vec![
            ("212.0", vec!["A", "B"]),
            ("101", vec!["C", "D"]),
        ])
        .unwrap();

        assert_eq!(table.codes(), vec!["212", "101"]);
        assert_eq!(table.lookup("212").unwrap(), &["A", "B"]);
        assert_eq!(table.lookup(" 101.0").unwrap(), &["C", "D"]);
        assert!(table.lookup("999").is_none());
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(AnswerKeyTable::new(Vec::new()).is_err());
        let dup = AnswerKeyTable::from_pairs(vec![("101", vec!["A"]), ("101.0", vec!["B"])]);
        assert!(dup.is_err());
        let blank = AnswerKeyTable::from_pairs(vec![(" ", vec!["A"])]);
        assert!(blank.is_err());
    }

    #[test]
    fn test_question_count_and_uniformity() {
        let table =
            AnswerKeyTable::from_pairs(vec![("1", vec!["A", "B", "C"]), ("2", vec!["A"])]).unwrap();
        assert_eq!(table.question_count(), 3);
        assert!(table.check_uniform_length().is_err());
    }

    #[test]
    fn test_codes_accept_numbers() {
        #[derive(Deserialize)]
        struct Doc {
            variants: Vec<AnswerKeyEntry>,
        }
        let doc: Doc = toml::from_str(
            "[[variants]]\ncode = 101\nanswers = [\"A\"]\n[[variants]]\ncode = 212.0\nanswers = [\"B\"]\n",
        )
        .unwrap();
        assert_eq!(doc.variants[0].code, "101");
        assert_eq!(doc.variants[1].code, "212");
    }
}
